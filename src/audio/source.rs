//! Capture provider abstractions.
//!
//! An [`AudioSource`] is cheap configuration that can be shared with the
//! sampling worker. Opening it yields a [`CaptureHandle`] that owns the OS
//! resources; the handle is created and dropped on the worker thread, so it
//! does not need to be `Send`.

use super::AudioFrame;
use crate::error::AcquisitionError;

/// Trait implemented by audio capture providers.
pub trait AudioSource: Send + Sync {
    type Handle: CaptureHandle;

    /// Acquire the input device.
    ///
    /// # Errors
    /// - `PermissionDenied` when access is refused
    /// - `DeviceUnavailable` when no input device exists
    fn open(&self) -> Result<Self::Handle, AcquisitionError>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// An open capture session.
pub trait CaptureHandle {
    /// Most recent magnitude snapshot. Never blocks.
    ///
    /// Returns the last-known frame when no new audio has arrived.
    fn sample(&mut self) -> AudioFrame;

    /// Release device resources. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
