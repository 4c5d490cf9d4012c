//! Simulation configuration and derived parameters
//!
//! [`SimulationConfig`] is what a user supplies; [`SimulationConfig::resolve`]
//! validates it and derives cell spacing, timestep and diffusion number.

use crate::error::{HeatError, HeatResult};
use crate::stencil::FivePointStencil;
use serde::{Deserialize, Serialize};

/// Largest diffusion number for which the explicit 5-point scheme is stable
pub const STABILITY_LIMIT: f64 = 0.5;

/// User-facing run configuration
///
/// Defaults: 1000×1000 grid, 10 steps, `α = 0.1`, domain length 1000.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid dimension (the grid is `n × n`, boundary included)
    pub n: usize,
    /// Requested step count; timestep 1 is the initial condition
    pub nsteps: usize,
    /// Diffusion coefficient α
    pub alpha: f64,
    /// Physical length of the square domain
    pub length: f64,
    /// Cell spacing override (default `length / (n + 1)`)
    pub dx: Option<f64>,
    /// Timestep override (default `0.5 / nsteps`)
    pub dt: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n: 1000,
            nsteps: 10,
            alpha: 0.1,
            length: 1000.0,
            dx: None,
            dt: None,
        }
    }
}

impl SimulationConfig {
    /// Validate and derive the immutable per-run parameters
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::InvalidParameter`] if `n` or `nsteps` is zero, or if
    /// `alpha`, `length` or an override is not a finite positive number.
    pub fn resolve(&self) -> HeatResult<SimulationParameters> {
        if self.n == 0 {
            return Err(HeatError::invalid("n", "grid dimension must be positive"));
        }
        if self.nsteps == 0 {
            return Err(HeatError::invalid("nsteps", "step count must be positive"));
        }
        require_positive("alpha", self.alpha)?;
        require_positive("length", self.length)?;

        let dx = match self.dx {
            Some(dx) => require_positive("dx", dx)?,
            None => self.length / (self.n as f64 + 1.0),
        };
        let dt = match self.dt {
            Some(dt) => require_positive("dt", dt)?,
            None => 0.5 / self.nsteps as f64,
        };
        let r = self.alpha * dt / (dx * dx);

        Ok(SimulationParameters {
            n: self.n,
            nsteps: self.nsteps,
            alpha: self.alpha,
            length: self.length,
            dx,
            dt,
            r,
        })
    }
}

fn require_positive(parameter: &'static str, value: f64) -> HeatResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(HeatError::invalid(
            parameter,
            format!("must be a finite positive number, got {value}"),
        ))
    }
}

/// Validated, derived parameters for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParameters {
    pub n: usize,
    pub nsteps: usize,
    pub alpha: f64,
    pub length: f64,
    /// Cell spacing δx
    pub dx: f64,
    /// Timestep δt
    pub dt: f64,
    /// Diffusion number `r = α·δt/δx²`
    pub r: f64,
}

impl SimulationParameters {
    /// Whether `r` is within the explicit-scheme stability bound
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.r <= STABILITY_LIMIT
    }

    /// Number of stencil updates executed: one fewer than `nsteps`
    #[must_use]
    pub fn updates(&self) -> usize {
        self.nsteps - 1
    }

    /// Simulated time the result is compared at, `δt·nsteps`
    #[must_use]
    pub fn total_time(&self) -> f64 {
        self.dt * self.nsteps as f64
    }

    #[must_use]
    pub fn stencil(&self) -> FivePointStencil {
        FivePointStencil::heat(self.r)
    }
}
