//! Temporal refinement study
//!
//! Repeats a run at increasing step counts over a fixed simulated time and
//! records how far consecutive solutions move. For a first-order scheme the
//! distance roughly halves each time the step count doubles.

use crate::backend::BackendKind;
use crate::error::{HeatError, HeatResult};
use crate::grid::Grid;
use crate::params::SimulationConfig;
use crate::report::RunReport;
use crate::simulation::Simulation;
use serde::Serialize;
use tracing::info;

/// One run of a refinement study
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementPoint {
    pub nsteps: usize,
    pub report: RunReport,
    /// L2 distance to the previous (coarser) point's grid; `None` for the first
    pub self_difference: Option<f64>,
}

/// Run `config` once per entry of `steps`, holding `δt·nsteps` fixed
///
/// The fixed simulated time is the one `config` resolves to; each run uses
/// `δt = T / nsteps`. Any `dt` override in `config` only affects `T`.
///
/// # Errors
///
/// - [`HeatError::InvalidParameter`] if `steps` is empty or holds a zero
/// - anything [`Simulation::run_to_grid`] returns
pub fn refinement_study(
    config: &SimulationConfig,
    backend: &BackendKind,
    steps: &[usize],
) -> HeatResult<Vec<RefinementPoint>> {
    if steps.is_empty() {
        return Err(HeatError::invalid("steps", "at least one step count is required"));
    }
    let total_time = config.resolve()?.total_time();
    info!(
        total_time,
        runs = steps.len(),
        "Refinement study over fixed total time {:e}",
        total_time
    );

    let mut points = Vec::with_capacity(steps.len());
    let mut previous: Option<Grid> = None;

    for &nsteps in steps {
        if nsteps == 0 {
            return Err(HeatError::invalid("steps", "step counts must be positive"));
        }
        let run_config = SimulationConfig {
            nsteps,
            dt: Some(total_time / nsteps as f64),
            ..*config
        };
        let (grid, report) = Simulation::new(run_config, *backend)?.run_to_grid()?;
        let self_difference = previous
            .as_ref()
            .map(|coarse| grid.l2_distance(coarse))
            .transpose()?;

        info!(
            nsteps,
            l2_norm = report.l2_norm,
            self_difference = ?self_difference,
            "Refinement run finished"
        );
        points.push(RefinementPoint {
            nsteps,
            report,
            self_difference,
        });
        previous = Some(grid);
    }
    Ok(points)
}
