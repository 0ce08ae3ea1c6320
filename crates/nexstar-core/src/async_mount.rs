//! Async access to a mount
//!
//! Transactions block on serial I/O, so each call runs on tokio's blocking
//! pool. Async callers suspend while another caller holds the transaction
//! lock instead of stalling the runtime.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use crate::angle::Angle;
use crate::mount::Mount;
use crate::protocol::{Axis, Location, ProtocolError, TrackingMode};

/// Cloneable async handle to a shared [`Mount`]
#[derive(Clone)]
pub struct AsyncMount {
    inner: Arc<Mount>,
}

impl AsyncMount {
    /// Wrap a mount for use from async code
    pub fn new(mount: Mount) -> Self {
        Self {
            inner: Arc::new(mount),
        }
    }

    /// The shared blocking mount
    pub fn blocking(&self) -> &Mount {
        &self.inner
    }

    async fn run<T, F>(&self, f: F) -> Result<T, ProtocolError>
    where
        T: Send + 'static,
        F: FnOnce(&Mount) -> Result<T, ProtocolError> + Send + 'static,
    {
        let mount = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&mount))
            .await
            .map_err(|e| ProtocolError::TaskFailed(e.to_string()))?
    }

    /// See [`Mount::get_ra_dec`]
    pub async fn get_ra_dec(&self) -> Result<(Angle, Angle), ProtocolError> {
        self.run(|m| m.get_ra_dec()).await
    }

    /// See [`Mount::overwrite_ra_dec`]
    pub async fn overwrite_ra_dec(&self, ra: Angle, dec: Angle) -> Result<(), ProtocolError> {
        self.run(move |m| m.overwrite_ra_dec(ra, dec)).await
    }

    /// See [`Mount::slew_ra_dec`]
    pub async fn slew_ra_dec(&self, ra: Angle, dec: Angle) -> Result<(), ProtocolError> {
        self.run(move |m| m.slew_ra_dec(ra, dec)).await
    }

    /// See [`Mount::get_az_alt`]
    pub async fn get_az_alt(&self) -> Result<(Angle, Angle), ProtocolError> {
        self.run(|m| m.get_az_alt()).await
    }

    /// See [`Mount::slew_az_alt`]
    pub async fn slew_az_alt(&self, az: Angle, alt: Angle) -> Result<(), ProtocolError> {
        self.run(move |m| m.slew_az_alt(az, alt)).await
    }

    /// See [`Mount::cancel_slew`]
    pub async fn cancel_slew(&self) -> Result<(), ProtocolError> {
        self.run(|m| m.cancel_slew()).await
    }

    /// See [`Mount::tracking_mode`]
    pub async fn tracking_mode(&self) -> Result<TrackingMode, ProtocolError> {
        self.run(|m| m.tracking_mode()).await
    }

    /// See [`Mount::set_tracking_mode`]
    pub async fn set_tracking_mode(&self, mode: TrackingMode) -> Result<(), ProtocolError> {
        self.run(move |m| m.set_tracking_mode(mode)).await
    }

    /// See [`Mount::location`]
    pub async fn location(&self) -> Result<Location, ProtocolError> {
        self.run(|m| m.location()).await
    }

    /// See [`Mount::set_location`]
    pub async fn set_location(&self, location: Location) -> Result<(), ProtocolError> {
        self.run(move |m| m.set_location(&location)).await
    }

    /// See [`Mount::time`]
    pub async fn time(&self) -> Result<DateTime<FixedOffset>, ProtocolError> {
        self.run(|m| m.time()).await
    }

    /// See [`Mount::set_time`]
    pub async fn set_time(&self, time: DateTime<FixedOffset>) -> Result<(), ProtocolError> {
        self.run(move |m| m.set_time(&time)).await
    }

    /// See [`Mount::is_aligned`]
    pub async fn is_aligned(&self) -> Result<bool, ProtocolError> {
        self.run(|m| m.is_aligned()).await
    }

    /// See [`Mount::echo`]
    pub async fn echo(&self, byte: u8) -> Result<u8, ProtocolError> {
        self.run(move |m| m.echo(byte)).await
    }

    /// See [`Mount::reset_axis_position`]
    pub async fn reset_axis_position(&self, axis: Axis, position: Angle) -> Result<(), ProtocolError> {
        self.run(move |m| m.reset_axis_position(axis, position)).await
    }

    /// See [`Mount::slow_goto`]
    pub async fn slow_goto(&self, axis: Axis, position: Angle) -> Result<(), ProtocolError> {
        self.run(move |m| m.slow_goto(axis, position)).await
    }

    /// See [`Mount::fixed_rate_slew`]
    pub async fn fixed_rate_slew(&self, axis: Axis, speed: i8) -> Result<(), ProtocolError> {
        self.run(move |m| m.fixed_rate_slew(axis, speed)).await
    }
}
