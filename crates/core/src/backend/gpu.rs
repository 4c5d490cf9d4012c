//! GPU-based backend implementation
//!
//! This module provides a GPU implementation of the [`Backend`] trait using a
//! wgpu compute shader on `f64` storage buffers. It is only available when
//! the `gpu` feature is enabled.
//!
//! # Shader Files
//!
//! - `shaders/heat_stencil.wgsl` - explicit 5-point update of interior cells
//!
//! # Data movement
//!
//! The grid crosses the host/device boundary exactly twice per run: once in
//! [`Backend::upload`] and once in [`Backend::download`]. Steps only record
//! and submit compute passes; the queue orders them, so no host wait happens
//! between steps.

use super::context::GpuContext;
use super::Backend;
use crate::error::{HeatError, HeatResult};
use crate::grid::Grid;
use crate::stencil::FivePointStencil;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

/// Workgroup edge length (must match `@workgroup_size` in the shader)
const WORKGROUP_SIZE: u32 = 16;

/// Stencil shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct StencilParams {
    rows: u32,
    cols: u32,
    center: f64,
    neighbor: f64,
    _padding: [u32; 2],
}

/// Device-resident grid pair for one run
struct DeviceGrids {
    rows: usize,
    cols: usize,
    rows_u32: u32,
    cols_u32: u32,
    grid_a: wgpu::Buffer,
    grid_b: wgpu::Buffer,
    staging: wgpu::Buffer,
    /// `[a → b, b → a]`
    bind_groups: [wgpu::BindGroup; 2],
    /// Ping-pong state (which buffer is current)
    current_is_a: bool,
}

impl DeviceGrids {
    fn byte_size(&self) -> u64 {
        (self.rows * self.cols * std::mem::size_of::<f64>()) as u64
    }

    fn current(&self) -> &wgpu::Buffer {
        if self.current_is_a {
            &self.grid_a
        } else {
            &self.grid_b
        }
    }
}

/// GPU backend using a wgpu compute pipeline
///
/// Grids live in two storage buffers with ping-pong double-buffering; a
/// staging buffer handles the final readback.
pub struct GpuBackend {
    context: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    grids: Option<DeviceGrids>,
}

impl GpuBackend {
    /// Create a new GPU backend
    ///
    /// Loads the shader and creates the compute pipeline. Grid buffers are
    /// allocated later, in [`Backend::upload`].
    #[must_use]
    pub fn new(context: GpuContext) -> Self {
        let device = context.device();

        let shader = device.create_shader_module(wgpu::include_wgsl!("shaders/heat_stencil.wgsl"));

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Stencil Bind Group Layout"),
            entries: &[
                // src (binding 0)
                storage_entry(0, true),
                // dst (binding 1)
                storage_entry(1, false),
                // params (binding 2)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stencil Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Stencil Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Stencil Params"),
            size: std::mem::size_of::<StencilParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            context,
            pipeline,
            bind_group_layout,
            params_buffer,
            grids: None,
        }
    }

    fn create_bind_group(&self, src: &wgpu::Buffer, dst: &wgpu::Buffer) -> wgpu::BindGroup {
        self.context
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Stencil Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.params_buffer.as_entire_binding(),
                    },
                ],
            })
    }
}

fn dimension_u32(parameter: &'static str, value: usize) -> HeatResult<u32> {
    u32::try_from(value).map_err(|_| {
        HeatError::invalid(parameter, format!("{value} exceeds the GPU index range"))
    })
}

impl Backend for GpuBackend {
    fn upload(&mut self, initial: &Grid) -> HeatResult<()> {
        let (rows, cols) = initial.shape();
        if !self.context.can_allocate(rows, cols) {
            return Err(HeatError::Allocation {
                rows,
                cols,
                message: format!(
                    "grid exceeds storage buffer limits of {}",
                    self.context.adapter_name()
                ),
            });
        }
        let rows_u32 = dimension_u32("rows", rows)?;
        let cols_u32 = dimension_u32("cols", cols)?;
        let device = self.context.device();

        // Both roles start from the initial state so boundaries agree
        let storage_usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST;
        let grid_a = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid A"),
            contents: bytemuck::cast_slice(initial.as_slice()),
            usage: storage_usage,
        });
        let grid_b = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid B"),
            contents: bytemuck::cast_slice(initial.as_slice()),
            usage: storage_usage,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Grid Staging"),
            size: std::mem::size_of_val(initial.as_slice()) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_groups = [
            self.create_bind_group(&grid_a, &grid_b),
            self.create_bind_group(&grid_b, &grid_a),
        ];

        self.grids = Some(DeviceGrids {
            rows,
            cols,
            rows_u32,
            cols_u32,
            grid_a,
            grid_b,
            staging,
            bind_groups,
            current_is_a: true,
        });
        Ok(())
    }

    fn step(&mut self, stencil: &FivePointStencil) -> HeatResult<()> {
        let grids = self.grids.as_mut().ok_or(HeatError::NotLoaded)?;

        let params = StencilParams {
            rows: grids.rows_u32,
            cols: grids.cols_u32,
            center: stencil.center,
            neighbor: stencil.neighbor,
            _padding: [0; 2],
        };
        self.context
            .queue()
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = if grids.current_is_a {
            &grids.bind_groups[0]
        } else {
            &grids.bind_groups[1]
        };

        let mut encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Stencil Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Stencil Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);

            let wg_x = grids.cols_u32.div_ceil(WORKGROUP_SIZE);
            let wg_y = grids.rows_u32.div_ceil(WORKGROUP_SIZE);
            compute_pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        self.context.queue().submit(std::iter::once(encoder.finish()));

        // Flip ping-pong
        grids.current_is_a = !grids.current_is_a;
        Ok(())
    }

    fn download(&self) -> HeatResult<Cow<'_, Grid>> {
        let grids = self.grids.as_ref().ok_or(HeatError::NotLoaded)?;
        let buffer_size = grids.byte_size();

        let mut encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Grid Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(grids.current(), 0, &grids.staging, 0, buffer_size);
        self.context.queue().submit(std::iter::once(encoder.finish()));

        // Map and read (blocks until every submitted step has finished)
        let buffer_slice = grids.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = self.context.device().poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| HeatError::Device(format!("readback channel closed: {e}")))?
            .map_err(|e| HeatError::Device(format!("failed to map staging buffer: {e}")))?;

        let data = buffer_slice.get_mapped_range();
        let cells: Vec<f64> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        grids.staging.unmap();

        Grid::from_vec(grids.rows, grids.cols, cells).map(Cow::Owned)
    }

    fn description(&self) -> String {
        format!("wgpu ({})", self.context.adapter_name())
    }

    fn is_gpu_accelerated(&self) -> bool {
        true
    }
}
