//! Explicit 5-point stencil update
//!
//! Forward-Euler in time, central differences in space:
//! ```text
//! next[i][j] = (1 − 4r)·u[i][j] + r·(u[i+1][j] + u[i−1][j] + u[i][j+1] + u[i][j−1])
//! ```
//! with `r = α·δt/δx²`. Boundary cells are never written (Dirichlet zero).
//! Stable for `r ≤ 0.5`.

use crate::backend::InteriorMap;
use crate::grid::Grid;

/// Weights of the linear 5-point heat stencil
///
/// Every backend (including the GPU shader) evaluates
/// `center * u + neighbor * (down + up + right + left)` in this exact order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FivePointStencil {
    /// Weight of the cell itself, `1 − 4r`
    pub center: f64,
    /// Weight shared by the four orthogonal neighbours, `r`
    pub neighbor: f64,
}

impl FivePointStencil {
    /// Heat-equation stencil for diffusion number `r`
    #[must_use]
    pub fn heat(r: f64) -> Self {
        Self {
            center: 1.0 - 4.0 * r,
            neighbor: r,
        }
    }

    /// Apply to a cell value and its neighbours `[i+1, i−1, j+1, j−1]`
    #[inline(always)]
    #[must_use]
    pub fn apply(&self, center: f64, neighbors: [f64; 4]) -> f64 {
        self.center * center
            + self.neighbor * (neighbors[0] + neighbors[1] + neighbors[2] + neighbors[3])
    }

    /// Apply at interior storage position `(i, j)` of `grid`
    #[inline(always)]
    #[must_use]
    pub fn apply_at(&self, grid: &Grid, i: usize, j: usize) -> f64 {
        let cols = grid.cols();
        let u = grid.as_slice();
        let idx = i * cols + j;
        self.apply(u[idx], [u[idx + cols], u[idx - cols], u[idx + 1], u[idx - 1]])
    }
}

/// Advance `current` by one timestep into `next`
///
/// Reads only `current` and writes only the interior of `next`, so `map` may
/// evaluate cells in any order or in parallel. A grid without interior cells
/// is left untouched.
pub fn step<M: InteriorMap>(map: &M, stencil: &FivePointStencil, current: &Grid, next: &mut Grid) {
    debug_assert_eq!(current.shape(), next.shape());
    map.map_interior(next, |i, j| stencil.apply_at(current, i, j));
}
