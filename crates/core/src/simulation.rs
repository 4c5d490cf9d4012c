//! Simulation driver
//!
//! Runs one explicit heat-equation simulation end to end:
//!
//! 1. **Setup** - derive δx, δt and r, check stability, seed the initial grid
//!    from the manufactured solution and upload it to the backend
//! 2. **Stepping** - `nsteps − 1` updates, each followed by a role swap
//! 3. **Validating** - build the reference grid at `δt·nsteps` and take the L2
//!    norm of the difference
//! 4. **Reported** - return a [`RunReport`]
//!
//! Stepping and validation are timed and their heap allocations counted. The
//! counts are only non-zero when the process installs
//! [`crate::CountingAllocator`] as its global allocator.
//!
//! The driver never retries; a run with fixed parameters and backend is
//! deterministic.

use crate::alloc_stats::AllocationStats;
use crate::backend::{create_backend, Backend, BackendKind};
use crate::error::HeatResult;
use crate::grid::Grid;
use crate::mms::ManufacturedSolution;
use crate::params::{SimulationConfig, SimulationParameters, STABILITY_LIMIT};
use crate::report::RunReport;
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// One configured simulation
#[derive(Debug, Clone, Copy)]
pub struct Simulation {
    params: SimulationParameters,
    backend: BackendKind,
}

impl Simulation {
    /// Validate `config` and bind it to a backend choice
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatError::InvalidParameter`] for a zero grid
    /// dimension or step count, or a non-finite/non-positive coefficient.
    pub fn new(config: SimulationConfig, backend: BackendKind) -> HeatResult<Self> {
        let params = config.resolve()?;
        Ok(Self { params, backend })
    }

    #[must_use]
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// Run on a freshly created backend and return the report
    ///
    /// # Errors
    ///
    /// Propagates backend creation, allocation and device errors.
    pub fn run(&self) -> HeatResult<RunReport> {
        self.run_to_grid().map(|(_, report)| report)
    }

    /// Run and also return the final computed grid
    ///
    /// # Errors
    ///
    /// Propagates backend creation, allocation and device errors.
    pub fn run_to_grid(&self) -> HeatResult<(Grid, RunReport)> {
        let mut backend = create_backend(&self.backend)?;
        self.execute(backend.as_mut())
    }

    /// Run against a caller-provided backend
    ///
    /// # Errors
    ///
    /// Propagates allocation and device errors from the backend.
    pub fn execute(&self, backend: &mut dyn Backend) -> HeatResult<(Grid, RunReport)> {
        let params = &self.params;
        let run_start = Instant::now();
        let mms = ManufacturedSolution::new(params.alpha, params.length);

        // Setup
        let stable = params.is_stable();
        if !stable {
            warn!(
                r = params.r,
                limit = STABILITY_LIMIT,
                "Unstable: diffusion number r = {:.4} exceeds {}; results may be meaningless",
                params.r,
                STABILITY_LIMIT
            );
        }

        let setup_start = Instant::now();
        {
            let _span = info_span!("setup", n = params.n).entered();
            let mut initial = Grid::zeros(params.n, params.n)?;
            mms.initial_value(&mut initial, params.dx);
            backend.upload(&initial)?;
        }
        let setup = setup_start.elapsed();

        // Stepping
        let stencil = params.stencil();
        let stepping_start = Instant::now();
        let stepping_heap = AllocationStats::snapshot();
        let computed = {
            let _span = info_span!("stepping", updates = params.updates()).entered();
            for _ in 0..params.updates() {
                backend.step(&stencil)?;
            }
            backend.download()?.into_owned()
        };
        let stepping = stepping_start.elapsed();
        let stepping_allocations = AllocationStats::snapshot().since(stepping_heap);
        debug!(
            "Stepping finished: {} updates in {:?}",
            params.updates(),
            stepping
        );

        // Validating
        let validation_start = Instant::now();
        let validation_heap = AllocationStats::snapshot();
        let l2_norm = {
            let _span = info_span!("validation").entered();
            let reference =
                mms.reference_grid(params.n, params.n, params.total_time(), params.dx)?;
            computed.l2_distance(&reference)?
        };
        let validation = validation_start.elapsed();
        let validation_allocations = AllocationStats::snapshot().since(validation_heap);

        let report = RunReport {
            backend: backend.description(),
            n: params.n,
            nsteps: params.nsteps,
            updates: params.updates(),
            diffusion_number: params.r,
            stable,
            total_time: params.total_time(),
            l2_norm,
            setup,
            stepping,
            stepping_allocations,
            validation,
            validation_allocations,
            total: run_start.elapsed(),
        };
        Ok((computed, report))
    }
}
