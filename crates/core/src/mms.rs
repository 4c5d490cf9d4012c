//! Manufactured solution for the heat equation
//!
//! ```text
//! u(x, y, t) = exp(−2απ²t / L²) · sin(πx/L) · sin(πy/L)
//! ```
//!
//! Used once to seed the initial grid and once to build the reference grid
//! the final state is compared against. Cell `(i, j)` (zero-based storage)
//! sits at `x = δx·i`, `y = δx·j`, which is `δx·(i−1)` in the 1-based domain
//! convention. Only interior cells are written.

use crate::error::HeatResult;
use crate::grid::Grid;
use std::f64::consts::PI;

/// Closed-form solution parameterised by diffusion coefficient and domain length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManufacturedSolution {
    pub alpha: f64,
    pub length: f64,
}

impl ManufacturedSolution {
    #[must_use]
    pub fn new(alpha: f64, length: f64) -> Self {
        Self { alpha, length }
    }

    /// Evaluate `u(x, y, t)`
    #[must_use]
    pub fn value(&self, x: f64, y: f64, t: f64) -> f64 {
        let l = self.length;
        let decay = (-2.0 * self.alpha * PI * PI * t / (l * l)).exp();
        decay * (PI * x / l).sin() * (PI * y / l).sin()
    }

    /// Seed the interior of `grid` with `u(x, y, 0)`
    pub fn initial_value(&self, grid: &mut Grid, dx: f64) {
        self.fill(grid, dx, 0.0);
    }

    /// Build a `rows × cols` grid holding `u(x, y, t)` on the interior and zero on the boundary
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatError::Allocation`] if the grid cannot be allocated.
    pub fn reference_grid(&self, rows: usize, cols: usize, t: f64, dx: f64) -> HeatResult<Grid> {
        let mut grid = Grid::zeros(rows, cols)?;
        self.fill(&mut grid, dx, t);
        Ok(grid)
    }

    fn fill(&self, grid: &mut Grid, dx: f64, t: f64) {
        grid.fill_interior(|i, j| self.value(dx * i as f64, dx * j as f64, t));
    }
}
