//! Run results and their presentation
//!
//! The driver returns a [`RunReport`]; nothing in the computational path
//! formats or prints. The `log_*` helpers are for callers that want the
//! standard log lines.

use crate::alloc_stats::AllocationStats;
use crate::params::SimulationParameters;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Outcome of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Backend description, e.g. `rayon (8 threads)`
    pub backend: String,
    pub n: usize,
    pub nsteps: usize,
    /// Stencil updates executed (`nsteps − 1`)
    pub updates: usize,
    /// Diffusion number `r`
    pub diffusion_number: f64,
    /// `false` when `r` exceeded the stability limit
    pub stable: bool,
    /// Simulated time the reference was evaluated at
    pub total_time: f64,
    /// `sqrt(Σ (computed − reference)²)`
    pub l2_norm: f64,
    /// Grid allocation, initial condition and upload
    pub setup: Duration,
    /// Timestep loop including the final device readback
    pub stepping: Duration,
    /// Heap allocations made during stepping
    pub stepping_allocations: AllocationStats,
    /// Reference construction and norm
    pub validation: Duration,
    /// Heap allocations made during validation
    pub validation_allocations: AllocationStats,
    /// Whole run, setup to report
    pub total: Duration,
}

impl RunReport {
    /// Wall-clock time of the whole run
    #[must_use]
    pub fn elapsed_wall_time(&self) -> Duration {
        self.total
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Backend:          {}", self.backend)?;
        writeln!(f, "Grid:             {0}x{0}", self.n)?;
        writeln!(f, "Updates:          {}", self.updates)?;
        writeln!(f, "L2 norm:          {:e}", self.l2_norm)?;
        writeln!(f, "Setup time:       {:.6} s", self.setup.as_secs_f64())?;
        writeln!(
            f,
            "Stepping time:    {:.6} s ({})",
            self.stepping.as_secs_f64(),
            self.stepping_allocations
        )?;
        writeln!(
            f,
            "Validation time:  {:.6} s ({})",
            self.validation.as_secs_f64(),
            self.validation_allocations
        )?;
        write!(f, "Total time:       {:.6} s", self.total.as_secs_f64())
    }
}

/// Log the run configuration
pub fn log_configuration(params: &SimulationParameters) {
    info!(
        n = params.n,
        dx = params.dx,
        alpha = params.alpha,
        nsteps = params.nsteps,
        total_time = params.total_time(),
        dt = params.dt,
        r = params.r,
        "Grid size: {0}x{0}, cell width: {1:e}, alpha: {2}, steps: {3}, total time: {4:e}, time step: {5:e}",
        params.n,
        params.dx,
        params.alpha,
        params.nsteps,
        params.total_time(),
        params.dt,
    );
}

/// Log the result of a run
pub fn log_report(report: &RunReport) {
    info!(
        backend = %report.backend,
        l2_norm = report.l2_norm,
        stable = report.stable,
        "Results: L2 norm {:e}",
        report.l2_norm
    );
    info!(
        setup_s = report.setup.as_secs_f64(),
        total_s = report.total.as_secs_f64(),
        "Timing: setup {:.6} s, total {:.6} s",
        report.setup.as_secs_f64(),
        report.total.as_secs_f64()
    );
    info!(
        seconds = report.stepping.as_secs_f64(),
        allocations = report.stepping_allocations.allocations,
        bytes = report.stepping_allocations.bytes,
        "Stepping: {:.6} s ({})",
        report.stepping.as_secs_f64(),
        report.stepping_allocations
    );
    info!(
        seconds = report.validation.as_secs_f64(),
        allocations = report.validation_allocations.allocations,
        bytes = report.validation_allocations.bytes,
        "Validation: {:.6} s ({})",
        report.validation.as_secs_f64(),
        report.validation_allocations
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport {
            backend: "serial".into(),
            n: 4,
            nsteps: 2,
            updates: 1,
            diffusion_number: 0.1,
            stable: true,
            total_time: 0.5,
            l2_norm: 1.5e-3,
            setup: Duration::from_millis(1),
            stepping: Duration::from_millis(2),
            stepping_allocations: AllocationStats {
                allocations: 2,
                bytes: 256,
            },
            validation: Duration::from_millis(3),
            validation_allocations: AllocationStats {
                allocations: 1,
                bytes: 128,
            },
            total: Duration::from_millis(6),
        }
    }

    #[test]
    fn test_display_contains_norm_and_timings() {
        let text = sample().to_string();
        assert!(text.contains("L2 norm:          1.5e-3"));
        assert!(text.contains("Stepping time:    0.002000 s (2 allocations: 256 bytes)"));
        assert!(text.contains("Validation time:  0.003000 s (1 allocations: 128 bytes)"));
        assert!(text.contains("Grid:             4x4"));
    }

    #[test]
    fn test_elapsed_wall_time_is_total() {
        assert_eq!(sample().elapsed_wall_time(), Duration::from_millis(6));
    }
}
