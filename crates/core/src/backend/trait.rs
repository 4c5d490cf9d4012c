//! Backend trait definition
//!
//! This module defines the `Backend` trait, which provides a backend-agnostic
//! interface for the explicit heat-equation update. CPU and GPU
//! implementations both implement this trait.

use crate::error::HeatResult;
use crate::grid::Grid;
use crate::stencil::FivePointStencil;
use std::borrow::Cow;

/// Backend-agnostic interface for one simulation run
///
/// A backend owns the "current" and "next" grid roles for the duration of a
/// run, in host memory or on a device. The driver uploads the initial state
/// once, steps it `nsteps − 1` times, and downloads the result once.
pub trait Backend: Send {
    /// Allocate both grid roles and transfer the initial state
    ///
    /// Both roles receive the full initial grid so boundary cells hold their
    /// initial value regardless of which role is current.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatError::Allocation`] if host or device memory is
    /// insufficient.
    fn upload(&mut self, initial: &Grid) -> HeatResult<()>;

    /// Advance one timestep and swap the grid roles
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatError::NotLoaded`] if called before [`Backend::upload`].
    fn step(&mut self, stencil: &FivePointStencil) -> HeatResult<()>;

    /// Read the current grid back to the host
    ///
    /// This is the synchronisation point for asynchronous backends.
    /// CPU backends return a borrowed grid, the GPU backend an owned copy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HeatError::NotLoaded`] before upload, or
    /// [`crate::HeatError::Device`] if readback fails.
    fn download(&self) -> HeatResult<Cow<'_, Grid>>;

    /// Human-readable description for logs and reports
    fn description(&self) -> String;

    /// Check if this is the GPU backend
    fn is_gpu_accelerated(&self) -> bool;
}
