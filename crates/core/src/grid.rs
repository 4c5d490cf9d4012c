//! Grid storage and double-buffering
//!
//! A [`Grid`] is a flat `Vec<f64>` in row-major order plus its shape.
//! The solver's domain convention is 1-based with boundary cells at index 1
//! and `n`; storage is zero-based, so the boundary is storage row/column `0`
//! and `rows - 1`/`cols - 1`, and the interior is `1..rows - 1`.

use crate::error::{HeatError, HeatResult};

/// Rectangular grid of double-precision cells
///
/// Stores cell values as a flat `Vec<f64>` in row-major order (`i * cols + j`).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Create a zero-filled grid
    ///
    /// Memory is reserved with `try_reserve_exact`, so exhaustion surfaces as
    /// [`HeatError::Allocation`] instead of aborting the process.
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::Allocation`] if `rows * cols` overflows or the
    /// buffer cannot be reserved.
    pub fn zeros(rows: usize, cols: usize) -> HeatResult<Self> {
        let len = rows.checked_mul(cols).ok_or_else(|| HeatError::Allocation {
            rows,
            cols,
            message: "cell count overflows usize".into(),
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| HeatError::Allocation {
                rows,
                cols,
                message: e.to_string(),
            })?;
        data.resize(len, 0.0);

        Ok(Self { data, rows, cols })
    }

    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> HeatResult<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(HeatError::ShapeMismatch {
                expected: (rows, cols),
                actual: (data.len(), 1),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get reference to cell data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to cell data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get value at storage position `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows && j < self.cols, "Coordinates out of bounds");
        self.data[i * self.cols + j]
    }

    /// Set value at storage position `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(i < self.rows && j < self.cols, "Coordinates out of bounds");
        self.data[i * self.cols + j] = value;
    }

    /// Whether `(i, j)` lies on the outer ring of the grid
    #[must_use]
    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i + 1 >= self.rows || j + 1 >= self.cols
    }

    /// True when the grid has at least one interior cell
    #[must_use]
    pub fn has_interior(&self) -> bool {
        self.rows > 2 && self.cols > 2
    }

    /// Sequentially set every interior cell to `f(i, j)`
    pub fn fill_interior<F: Fn(usize, usize) -> f64>(&mut self, f: F) {
        if !self.has_interior() {
            return;
        }
        for i in 1..self.rows - 1 {
            let row = &mut self.data[i * self.cols..(i + 1) * self.cols];
            for j in 1..self.cols - 1 {
                row[j] = f(i, j);
            }
        }
    }

    /// Copy all cells from `other`
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::ShapeMismatch`] if the shapes differ.
    pub fn copy_from(&mut self, other: &Grid) -> HeatResult<()> {
        self.check_shape(other)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// L2 norm of the cell-wise difference, `sqrt(Σ (self - other)²)`
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::ShapeMismatch`] if the shapes differ.
    pub fn l2_distance(&self, other: &Grid) -> HeatResult<f64> {
        self.check_shape(other)?;
        let sum: f64 = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Ok(sum.sqrt())
    }

    /// Largest absolute cell-wise difference
    ///
    /// # Errors
    ///
    /// Returns [`HeatError::ShapeMismatch`] if the shapes differ.
    pub fn max_abs_difference(&self, other: &Grid) -> HeatResult<f64> {
        self.check_shape(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    fn check_shape(&self, other: &Grid) -> HeatResult<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(HeatError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            })
        }
    }
}

/// Current/next pair of grids with an O(1) role swap
///
/// The stepper reads `current` and writes `next`; [`DoubleBuffer::swap`]
/// exchanges the roles without copying cell data.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    current: Grid,
    next: Grid,
}

impl DoubleBuffer {
    /// # Errors
    ///
    /// Returns [`HeatError::ShapeMismatch`] if the two grids differ in shape.
    pub fn new(current: Grid, next: Grid) -> HeatResult<Self> {
        current.check_shape(&next)?;
        Ok(Self { current, next })
    }

    #[must_use]
    pub fn current(&self) -> &Grid {
        &self.current
    }

    /// Borrow the read role and the write role at the same time
    pub fn split(&mut self) -> (&Grid, &mut Grid) {
        (&self.current, &mut self.next)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    #[must_use]
    pub fn into_current(self) -> Grid {
        self.current
    }
}
