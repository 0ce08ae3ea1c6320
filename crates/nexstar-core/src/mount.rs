//! Mount command surface
//!
//! Typed operations built from the transaction engine and the codecs. Every
//! call is one transaction that either fully succeeds with a reply of the
//! expected shape or fails; nothing is retried.

use chrono::{DateTime, FixedOffset, Local};

use crate::angle::Angle;
use crate::protocol::command_builder;
use crate::protocol::encoding::decode_hex_fraction;
use crate::protocol::records::{decode_location, decode_time, host_utc_offset};
use crate::protocol::{
    auto_select_port, port_names, Axis, AxisCommand, Command, Connection, ConnectionConfig,
    Location, ProtocolError, TrackingMode, Transport,
};

/// A NexStar mount reached over one exclusively owned transport
pub struct Mount {
    connection: Connection,
}

impl Mount {
    /// Open the named serial port with default line settings
    pub fn open(port_name: &str) -> Result<Self, ProtocolError> {
        Self::with_config(&ConnectionConfig::for_port(port_name))
    }

    /// Open with explicit connection settings
    pub fn with_config(config: &ConnectionConfig) -> Result<Self, ProtocolError> {
        Ok(Self {
            connection: Connection::open(config)?,
        })
    }

    /// Open the only serial port on the system; fails if there are zero or several
    pub fn open_auto() -> Result<Self, ProtocolError> {
        let port = auto_select_port(&port_names())?;
        Self::open(&port)
    }

    /// Names of the serial ports a mount could be on
    pub fn ports() -> Vec<String> {
        port_names()
    }

    /// Drive a mount over an arbitrary transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            connection: Connection::with_transport(transport),
        }
    }

    /// The underlying transaction engine
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Close the transport
    pub fn close(&self) -> Result<(), ProtocolError> {
        self.connection.close()
    }

    /// Current RA and Dec
    pub fn get_ra_dec(&self) -> Result<(Angle, Angle), ProtocolError> {
        self.position_pair(Command::GetRaDec)
    }

    /// Tell the mount it is pointing at RA/Dec (sync)
    pub fn overwrite_ra_dec(&self, ra: Angle, dec: Angle) -> Result<(), ProtocolError> {
        self.no_result(
            Command::SetRaDec,
            &command_builder::position_pair(Command::SetRaDec, ra, dec),
        )
    }

    /// Goto RA/Dec
    pub fn slew_ra_dec(&self, ra: Angle, dec: Angle) -> Result<(), ProtocolError> {
        tracing::info!(ra = %ra.fmt_hours(), dec = %dec.fmt_degrees(), "Slewing");
        self.no_result(
            Command::SlewRaDec,
            &command_builder::position_pair(Command::SlewRaDec, ra, dec),
        )
    }

    /// Current azimuth and altitude
    pub fn get_az_alt(&self) -> Result<(Angle, Angle), ProtocolError> {
        self.position_pair(Command::GetAzAlt)
    }

    /// Goto azimuth/altitude
    pub fn slew_az_alt(&self, az: Angle, alt: Angle) -> Result<(), ProtocolError> {
        tracing::info!(az = %az.fmt_degrees(), alt = %alt.fmt_degrees(), "Slewing");
        self.no_result(
            Command::SlewAzAlt,
            &command_builder::position_pair(Command::SlewAzAlt, az, alt),
        )
    }

    /// Abort a running goto
    pub fn cancel_slew(&self) -> Result<(), ProtocolError> {
        self.no_result(Command::CancelSlew, &command_builder::bare(Command::CancelSlew))
    }

    /// Current tracking mode. Out-of-range bytes come back as `TrackingMode::Unknown`.
    pub fn tracking_mode(&self) -> Result<TrackingMode, ProtocolError> {
        let command = Command::GetTrackingMode;
        let reply = self.connection.interact(&command_builder::bare(command))?;
        match reply.first() {
            Some(byte) => Ok(TrackingMode::from_byte(*byte)),
            None => Err(ProtocolError::invalid(
                command.code(),
                "empty reply, expected a mode byte",
                &reply,
            )),
        }
    }

    /// Change tracking mode
    pub fn set_tracking_mode(&self, mode: TrackingMode) -> Result<(), ProtocolError> {
        self.no_result(
            Command::SetTrackingMode,
            &command_builder::set_tracking_mode(mode),
        )
    }

    /// Observer location stored in the mount
    pub fn location(&self) -> Result<Location, ProtocolError> {
        let reply = self
            .connection
            .interact(&command_builder::bare(Command::GetLocation))?;
        decode_location(&reply)
    }

    /// Store the observer location
    pub fn set_location(&self, location: &Location) -> Result<(), ProtocolError> {
        self.no_result(Command::SetLocation, &command_builder::set_location(location))
    }

    /// Mount clock, expressed in the host's current time zone
    pub fn time(&self) -> Result<DateTime<FixedOffset>, ProtocolError> {
        self.time_in_zone(host_utc_offset())
    }

    /// Mount clock, reconciled against the given host offset
    pub fn time_in_zone(&self, host: FixedOffset) -> Result<DateTime<FixedOffset>, ProtocolError> {
        let reply = self
            .connection
            .interact(&command_builder::bare(Command::GetTime))?;
        decode_time(&reply, host)
    }

    /// Set the mount clock; the zone is taken from `time`
    pub fn set_time(&self, time: &DateTime<FixedOffset>) -> Result<(), ProtocolError> {
        self.no_result(Command::SetTime, &command_builder::set_time(time))
    }

    /// Set the mount clock to the host's current local time
    pub fn set_time_now(&self) -> Result<(), ProtocolError> {
        let now = Local::now();
        self.set_time(&now.with_timezone(now.offset()))
    }

    /// Check whether alignment has completed
    pub fn is_aligned(&self) -> Result<bool, ProtocolError> {
        let reply = self
            .connection
            .interact(&command_builder::bare(Command::IsAligned))?;
        Ok(reply != b"0")
    }

    /// Send one byte and return the first byte of the reply.
    ///
    /// The mount is expected to echo `byte` but nothing checks that here.
    pub fn echo(&self, byte: u8) -> Result<u8, ProtocolError> {
        let reply = self.connection.interact(&command_builder::echo(byte))?;
        reply.first().copied().ok_or_else(|| {
            ProtocolError::invalid(Command::Echo.code(), "empty reply to echo", &reply)
        })
    }

    /// Overwrite an axis position counter
    pub fn reset_axis_position(&self, axis: Axis, position: Angle) -> Result<(), ProtocolError> {
        self.axis_command(AxisCommand::ResetPosition(axis, position))
    }

    /// Slow goto on a single axis
    pub fn slow_goto(&self, axis: Axis, position: Angle) -> Result<(), ProtocolError> {
        self.axis_command(AxisCommand::SlowGoto(axis, position))
    }

    /// Move one axis at a fixed rate; negative reverses, 0 stops
    pub fn fixed_rate_slew(&self, axis: Axis, speed: i8) -> Result<(), ProtocolError> {
        self.axis_command(AxisCommand::FixedRateSlew(axis, speed))
    }

    fn axis_command(&self, command: AxisCommand) -> Result<(), ProtocolError> {
        self.no_result(Command::Passthrough, &command_builder::axis(command))
    }

    fn no_result(&self, command: Command, frame: &[u8]) -> Result<(), ProtocolError> {
        debug_assert!(command.expects_empty_reply(), "{command:?} carries a payload");
        let reply = self.connection.interact(frame)?;
        if reply.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedReply {
                command: command.code() as char,
                reply,
            })
        }
    }

    fn position_pair(&self, command: Command) -> Result<(Angle, Angle), ProtocolError> {
        let code = command.code();
        let reply = self.connection.interact(&command_builder::bare(command))?;
        // report the whole reply, not just the bad field
        let decode = |field: &[u8]| {
            decode_hex_fraction(code, field).map_err(|e| match e {
                ProtocolError::InvalidResponse { reason, .. } => {
                    ProtocolError::invalid(code, reason, &reply)
                }
                other => other,
            })
        };
        let mut fields = reply.split(|b| *b == b',');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(first), Some(second), None) => Ok((decode(first)?, decode(second)?)),
            _ => Err(ProtocolError::invalid(
                code,
                "expected two comma-separated fields",
                &reply,
            )),
        }
    }
}
