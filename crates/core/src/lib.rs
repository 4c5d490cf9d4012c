//! Heat Stencil Core Library
//!
//! Explicit finite-difference solver for the 2-D transient heat equation
//! `∂u/∂t = α∇²u`, validated against a manufactured solution.
//!
//! The same 5-point update kernel runs on interchangeable backends:
//! - single-threaded CPU
//! - multi-threaded CPU (Rayon)
//! - GPU compute (wgpu, behind the default `gpu` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use heat_stencil_core::{BackendKind, Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::default();
//! let simulation = Simulation::new(config, BackendKind::Serial)?;
//! let report = simulation.run()?;
//! println!("L2 error: {:e}", report.l2_norm);
//! # Ok::<(), heat_stencil_core::HeatError>(())
//! ```

pub mod alloc_stats;
pub mod backend;
pub mod error;
pub mod grid;
pub mod mms;
pub mod params;
pub mod report;
pub mod simulation;
pub mod stencil;
pub mod study;

pub use alloc_stats::{AllocationStats, CountingAllocator};
pub use backend::{
    create_backend, Backend, BackendKind, CpuBackend, GpuInitResult, InteriorMap, SerialMap,
    ThreadedMap,
};
pub use error::{HeatError, HeatResult};
pub use grid::{DoubleBuffer, Grid};
pub use mms::ManufacturedSolution;
pub use params::{SimulationConfig, SimulationParameters, STABILITY_LIMIT};
pub use report::RunReport;
pub use simulation::Simulation;
pub use stencil::FivePointStencil;
pub use study::{refinement_study, RefinementPoint};

#[cfg(feature = "gpu")]
pub use backend::{GpuBackend, GpuContext};
