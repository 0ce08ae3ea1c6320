//! Command Builder
//!
//! Assembles outbound frames: a command byte followed by its parameters.
//! Parameters are either ASCII hex position fields or raw bytes.

use chrono::{DateTime, FixedOffset};

use super::commands::{AxisCommand, Command, TrackingMode};
use super::encoding::encode_hex_position;
use super::records::{encode_location, encode_time, Location};
use crate::angle::Angle;

/// Builder for a single command frame
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    frame: Vec<u8>,
}

impl CommandBuilder {
    /// Start a frame with the command byte
    pub fn new(command: Command) -> Self {
        let mut frame = Vec::with_capacity(18);
        frame.push(command.code());
        Self { frame }
    }

    /// Add a single raw byte
    pub fn byte(mut self, b: u8) -> Self {
        self.frame.push(b);
        self
    }

    /// Add raw bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.frame.extend_from_slice(data);
        self
    }

    /// Add an 8-digit hex position field (write precision, low byte zeroed)
    pub fn hex_position(mut self, angle: Angle) -> Self {
        self.frame.extend_from_slice(encode_hex_position(angle).as_bytes());
        self
    }

    /// Build the frame
    pub fn build(self) -> Vec<u8> {
        self.frame
    }
}

/// Frame for a command without parameters
pub fn bare(command: Command) -> Vec<u8> {
    CommandBuilder::new(command).build()
}

/// Frame carrying a comma-separated pair of hex positions (`s`, `r`, `b`)
pub fn position_pair(command: Command, first: Angle, second: Angle) -> Vec<u8> {
    CommandBuilder::new(command)
        .hex_position(first)
        .byte(b',')
        .hex_position(second)
        .build()
}

/// `T` frame
pub fn set_tracking_mode(mode: TrackingMode) -> Vec<u8> {
    CommandBuilder::new(Command::SetTrackingMode)
        .byte(mode.to_byte())
        .build()
}

/// `W` frame
pub fn set_location(location: &Location) -> Vec<u8> {
    CommandBuilder::new(Command::SetLocation)
        .bytes(&encode_location(location))
        .build()
}

/// `H` frame
pub fn set_time(time: &DateTime<FixedOffset>) -> Vec<u8> {
    CommandBuilder::new(Command::SetTime)
        .bytes(&encode_time(time))
        .build()
}

/// `K` frame
pub fn echo(byte: u8) -> Vec<u8> {
    CommandBuilder::new(Command::Echo).byte(byte).build()
}

/// 8-byte `P` frame
pub fn axis(command: AxisCommand) -> Vec<u8> {
    command.to_frame().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::Axis;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_position_pair_frame() {
        let frame = position_pair(
            Command::SlewRaDec,
            Angle::from_hours(6.0),
            Angle::from_degrees(-45.0),
        );
        assert_eq!(frame, b"r40000000,E0000000".to_vec());
    }

    #[test]
    fn test_position_pair_masks_low_byte() {
        let ra = Angle::from_fraction(0x89AB_CDEF_u32 as f64 / 4_294_967_296.0);
        let frame = position_pair(Command::SetRaDec, ra, Angle::from_fraction(0.0));
        assert_eq!(frame, b"s89ABCD00,00000000".to_vec());
    }

    #[test]
    fn test_tracking_mode_frame() {
        assert_eq!(set_tracking_mode(TrackingMode::SiderealPec), vec![b'T', 3]);
    }

    #[test]
    fn test_location_frame_keeps_high_bytes() {
        let location = Location::new(
            Angle::from_dms(false, 10.0, 0.0, 0.0),
            Angle::from_dms(true, 200.0, 0.0, 0.0),
        );
        assert_eq!(
            set_location(&location),
            vec![b'W', 10, 0, 0, 0, 200, 0, 0, 1]
        );
    }

    #[test]
    fn test_time_frame() {
        let time = FixedOffset::east_opt(-3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2023, 11, 5, 1, 2, 3)
            .unwrap();
        assert_eq!(set_time(&time), vec![b'H', 1, 2, 3, 11, 5, 23, 253, 0]);
    }

    #[test]
    fn test_small_frames() {
        assert_eq!(bare(Command::CancelSlew), vec![b'M']);
        assert_eq!(echo(b'U'), vec![b'K', b'U']);
        assert_eq!(
            axis(AxisCommand::FixedRateSlew(Axis::RaAzimuth, 3)).len(),
            8
        );
    }
}
