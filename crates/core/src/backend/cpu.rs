//! CPU backends
//!
//! This module provides the host execution strategies behind the
//! [`InteriorMap`] trait and the [`CpuBackend`] that runs the stencil on
//! host-resident `Vec<f64>` grids with ping-pong double-buffering.

use super::Backend;
use crate::error::{HeatError, HeatResult};
use crate::grid::{DoubleBuffer, Grid};
use crate::stencil::{self, FivePointStencil};
use rayon::prelude::*;
use std::borrow::Cow;

/// Host strategy for evaluating a function over the interior of a grid
pub trait InteriorMap: Send + Sync {
    /// Zero-filled grid of the given shape
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::Allocation`] if memory is exhausted.
    fn allocate(&self, rows: usize, cols: usize) -> HeatResult<Grid> {
        Grid::zeros(rows, cols)
    }

    /// Write `f(i, j)` into every interior cell of `dst`
    ///
    /// `i` in `1..rows − 1`, `j` in `1..cols − 1` (zero-based storage indices).
    /// Boundary rows and columns are left untouched.
    fn map_interior<F>(&self, dst: &mut Grid, f: F)
    where
        F: Fn(usize, usize) -> f64 + Sync;

    /// Short name for logs
    fn name(&self) -> String;
}

/// Single-threaded row-by-row loop
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialMap;

impl InteriorMap for SerialMap {
    fn map_interior<F>(&self, dst: &mut Grid, f: F)
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        dst.fill_interior(f);
    }

    fn name(&self) -> String {
        "serial".into()
    }
}

/// Rayon thread pool splitting the interior into rows
///
/// Each cell depends only on the source grid, so row order is irrelevant and
/// results are bit-identical to [`SerialMap`].
pub struct ThreadedMap {
    pool: rayon::ThreadPool,
}

impl ThreadedMap {
    /// Build a private pool; `None` uses Rayon's default thread count
    ///
    /// # Errors
    ///
    /// - [`HeatError::InvalidParameter`] if `threads` is `Some(0)`
    /// - [`HeatError::BackendUnavailable`] if the pool cannot be spawned
    pub fn new(threads: Option<usize>) -> HeatResult<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = threads {
            if n == 0 {
                return Err(HeatError::invalid("threads", "thread count must be positive"));
            }
            builder = builder.num_threads(n);
        }
        let pool = builder
            .thread_name(|i| format!("heat-stencil-{i}"))
            .build()
            .map_err(|e| HeatError::BackendUnavailable {
                backend: "threaded",
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    /// Number of worker threads in the pool
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl InteriorMap for ThreadedMap {
    fn map_interior<F>(&self, dst: &mut Grid, f: F)
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        if !dst.has_interior() {
            return;
        }
        let (rows, cols) = dst.shape();
        let interior = &mut dst.as_mut_slice()[cols..(rows - 1) * cols];

        self.pool.install(|| {
            interior
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(k, row)| {
                    let i = k + 1;
                    for j in 1..cols - 1 {
                        row[j] = f(i, j);
                    }
                });
        });
    }

    fn name(&self) -> String {
        format!("rayon ({} threads)", self.threads())
    }
}

/// CPU backend running the stencil on host grids
///
/// Stores both grid roles as a [`DoubleBuffer`]; the role swap after each
/// step is a pointer swap.
pub struct CpuBackend<M: InteriorMap> {
    map: M,
    buffers: Option<DoubleBuffer>,
}

impl<M: InteriorMap> CpuBackend<M> {
    #[must_use]
    pub fn new(map: M) -> Self {
        Self { map, buffers: None }
    }

    /// The host strategy used for each step
    pub fn map(&self) -> &M {
        &self.map
    }
}

impl<M: InteriorMap> Backend for CpuBackend<M> {
    fn upload(&mut self, initial: &Grid) -> HeatResult<()> {
        let (rows, cols) = initial.shape();
        let mut current = self.map.allocate(rows, cols)?;
        current.copy_from(initial)?;
        let mut next = self.map.allocate(rows, cols)?;
        next.copy_from(initial)?;
        self.buffers = Some(DoubleBuffer::new(current, next)?);
        Ok(())
    }

    fn step(&mut self, stencil: &FivePointStencil) -> HeatResult<()> {
        let buffers = self.buffers.as_mut().ok_or(HeatError::NotLoaded)?;
        let (current, next) = buffers.split();
        stencil::step(&self.map, stencil, current, next);
        buffers.swap();
        Ok(())
    }

    fn download(&self) -> HeatResult<Cow<'_, Grid>> {
        self.buffers
            .as_ref()
            .map(|b| Cow::Borrowed(b.current()))
            .ok_or(HeatError::NotLoaded)
    }

    fn description(&self) -> String {
        self.map.name()
    }

    fn is_gpu_accelerated(&self) -> bool {
        false
    }
}
