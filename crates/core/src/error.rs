//! Error types for the heat stencil solver.

use std::fmt;

/// Result type for solver operations.
pub type HeatResult<T> = Result<T, HeatError>;

/// Errors that can occur while configuring or running a simulation.
///
/// A stability bound violation is not an error: it is logged
/// and recorded in the run report, and the run proceeds.
#[derive(Debug, Clone, PartialEq)]
pub enum HeatError {
    /// A configuration value is out of range (non-positive size, non-finite coefficient, ...).
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },

    /// Host or device memory for a grid could not be obtained.
    Allocation {
        rows: usize,
        cols: usize,
        message: String,
    },

    /// Two grids that must share a shape do not.
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The requested backend cannot run on this machine or build.
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },

    /// A device operation (submission, buffer mapping, readback) failed.
    Device(String),

    /// The backend was stepped or read before a grid was uploaded.
    NotLoaded,
}

impl HeatError {
    pub(crate) fn invalid(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            message: message.into(),
        }
    }
}

impl fmt::Display for HeatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::Allocation {
                rows,
                cols,
                message,
            } => {
                write!(f, "Failed to allocate {}x{} grid: {}", rows, cols, message)
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Grid shape mismatch: expected {}x{}, got {}x{}",
                    expected.0, expected.1, actual.0, actual.1
                )
            }
            Self::BackendUnavailable { backend, reason } => {
                write!(f, "Backend '{}' unavailable: {}", backend, reason)
            }
            Self::Device(msg) => write!(f, "Device error: {msg}"),
            Self::NotLoaded => write!(f, "No grid has been uploaded to the backend"),
        }
    }
}

impl std::error::Error for HeatError {}
