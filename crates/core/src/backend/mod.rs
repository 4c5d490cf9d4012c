//! Execution backends for the stencil update
//!
//! This module provides a unified CPU/GPU abstraction for running the same
//! explicit update. The core abstraction is the [`Backend`] trait, which owns
//! the two grid roles (host or device resident) for one run.
//!
//! Host strategies implement the smaller [`InteriorMap`] trait and are wrapped
//! by [`CpuBackend`]:
//! - [`SerialMap`]: single-threaded loop
//! - [`ThreadedMap`]: Rayon thread pool with a configurable worker count
//!
//! # Feature Flags
//!
//! - `gpu` (default): Enables the wgpu [`GpuBackend`]. Disable with
//!   `--no-default-features` for environments without GPU access.
//!
//! # Backend Selection
//!
//! The backend is an explicit [`BackendKind`] value handed to the driver.
//! [`BackendKind::Auto`] picks the best available backend:
//! 1. Try GPU (if `gpu` feature enabled and a `SHADER_F64` adapter is present)
//! 2. Fall back to the threaded CPU backend (always available)

mod context;
mod cpu;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

#[cfg(feature = "gpu")]
mod gpu;

pub use context::GpuInitResult;
pub use cpu::{CpuBackend, InteriorMap, SerialMap, ThreadedMap};
pub use r#trait::Backend;

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;

use crate::error::{HeatError, HeatResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[cfg(feature = "gpu")]
use tracing::warn;

/// Which execution strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Single-threaded sequential loop
    Serial,
    /// Rayon pool; `None` uses Rayon's default thread count
    Threaded { threads: Option<usize> },
    /// wgpu compute shader on device-resident buffers
    Gpu,
    /// GPU when available, otherwise threaded CPU
    Auto,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Threaded { threads: None }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Threaded { threads: None } => write!(f, "threaded"),
            Self::Threaded { threads: Some(n) } => write!(f, "threaded({n})"),
            Self::Gpu => write!(f, "gpu"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Create a backend for the requested kind
///
/// # Errors
///
/// - [`HeatError::InvalidParameter`] for a zero thread count
/// - [`HeatError::BackendUnavailable`] if `Gpu` is requested but no suitable
///   adapter exists or the `gpu` feature is disabled
pub fn create_backend(kind: &BackendKind) -> HeatResult<Box<dyn Backend>> {
    match *kind {
        BackendKind::Serial => Ok(Box::new(CpuBackend::new(SerialMap))),
        BackendKind::Threaded { threads } => {
            Ok(Box::new(CpuBackend::new(ThreadedMap::new(threads)?)))
        }
        BackendKind::Gpu => create_gpu_backend(),
        BackendKind::Auto => match create_gpu_backend() {
            Ok(backend) => Ok(backend),
            Err(e) => {
                info!("{e}; using threaded CPU backend");
                Ok(Box::new(CpuBackend::new(ThreadedMap::new(None)?)))
            }
        },
    }
}

#[cfg(feature = "gpu")]
fn create_gpu_backend() -> HeatResult<Box<dyn Backend>> {
    match GpuContext::new() {
        GpuInitResult::Success(context) => {
            info!("Using GPU backend: {}", context.adapter_name());
            Ok(Box::new(GpuBackend::new(context)))
        }
        GpuInitResult::NoGpuFound => Err(HeatError::BackendUnavailable {
            backend: "gpu",
            reason: "no GPU adapter found".into(),
        }),
        GpuInitResult::InitFailed {
            adapter_name,
            error,
        } => {
            warn!("GPU '{}' found but failed to initialize: {}", adapter_name, error);
            Err(HeatError::BackendUnavailable {
                backend: "gpu",
                reason: format!("{adapter_name}: {error}"),
            })
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn create_gpu_backend() -> HeatResult<Box<dyn Backend>> {
    Err(HeatError::BackendUnavailable {
        backend: "gpu",
        reason: "built without the `gpu` feature".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(BackendKind::Serial.to_string(), "serial");
        assert_eq!(BackendKind::default().to_string(), "threaded");
        assert_eq!(
            BackendKind::Threaded { threads: Some(4) }.to_string(),
            "threaded(4)"
        );
    }

    #[test]
    fn test_create_cpu_backends() {
        let serial = create_backend(&BackendKind::Serial).unwrap();
        assert!(!serial.is_gpu_accelerated());

        let threaded = create_backend(&BackendKind::Threaded { threads: Some(2) }).unwrap();
        assert!(threaded.description().contains("2 threads"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = create_backend(&BackendKind::Threaded { threads: Some(0) });
        assert!(matches!(
            result,
            Err(HeatError::InvalidParameter {
                parameter: "threads",
                ..
            })
        ));
    }

    #[test]
    fn test_auto_always_yields_a_backend() {
        // GPU if one is usable here, threaded CPU otherwise
        assert!(create_backend(&BackendKind::Auto).is_ok());
    }
}
