//! Protocol commands
//!
//! Defines the command codes of the NexStar hand-controller protocol.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::angle::Angle;
use super::encoding::encode_fixed_point;

/// Protocol commands, one leading byte each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Get RA/Dec as two hex fractions ('e')
    GetRaDec,
    /// Overwrite the current RA/Dec ('s'), i.e. sync
    SetRaDec,
    /// Slew to RA/Dec ('r')
    SlewRaDec,
    /// Get Az/Alt as two hex fractions ('z')
    GetAzAlt,
    /// Slew to Az/Alt ('b')
    SlewAzAlt,
    /// Cancel a running goto ('M')
    CancelSlew,
    /// Get tracking mode ('t')
    GetTrackingMode,
    /// Set tracking mode ('T')
    SetTrackingMode,
    /// Get observer location ('w')
    GetLocation,
    /// Set observer location ('W')
    SetLocation,
    /// Get mount time ('h')
    GetTime,
    /// Set mount time ('H')
    SetTime,
    /// Is alignment complete ('J')
    IsAligned,
    /// Echo one byte back ('K')
    Echo,
    /// Pass-through command to a motor controller ('P')
    Passthrough,
}

impl Command {
    /// The command byte sent on the wire
    pub fn code(&self) -> u8 {
        match self {
            Command::GetRaDec => b'e',
            Command::SetRaDec => b's',
            Command::SlewRaDec => b'r',
            Command::GetAzAlt => b'z',
            Command::SlewAzAlt => b'b',
            Command::CancelSlew => b'M',
            Command::GetTrackingMode => b't',
            Command::SetTrackingMode => b'T',
            Command::GetLocation => b'w',
            Command::SetLocation => b'W',
            Command::GetTime => b'h',
            Command::SetTime => b'H',
            Command::IsAligned => b'J',
            Command::Echo => b'K',
            Command::Passthrough => b'P',
        }
    }

    /// Check if a successful reply carries no payload
    pub fn expects_empty_reply(&self) -> bool {
        matches!(
            self,
            Command::SetRaDec
                | Command::SlewRaDec
                | Command::SlewAzAlt
                | Command::CancelSlew
                | Command::SetTrackingMode
                | Command::SetLocation
                | Command::SetTime
                | Command::Passthrough
        )
    }
}

/// Mount tracking mode, sent as a raw byte equal to its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Tracking disabled
    Off,
    /// Alt-azimuth tracking
    AltAz,
    /// Equatorial north tracking
    Equatorial,
    /// Sidereal tracking with periodic error correction
    SiderealPec,
    /// A byte outside the documented range, kept verbatim
    Unknown(u8),
}

impl TrackingMode {
    /// Decode the raw mode byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => TrackingMode::Off,
            1 => TrackingMode::AltAz,
            2 => TrackingMode::Equatorial,
            3 => TrackingMode::SiderealPec,
            other => TrackingMode::Unknown(other),
        }
    }

    /// The raw mode byte
    pub fn to_byte(&self) -> u8 {
        match self {
            TrackingMode::Off => 0,
            TrackingMode::AltAz => 1,
            TrackingMode::Equatorial => 2,
            TrackingMode::SiderealPec => 3,
            TrackingMode::Unknown(byte) => *byte,
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingMode::Off => f.write_str("Off"),
            TrackingMode::AltAz => f.write_str("AltAz"),
            TrackingMode::Equatorial => f.write_str("Equatorial"),
            TrackingMode::SiderealPec => f.write_str("SiderealPec"),
            TrackingMode::Unknown(byte) => write!(f, "Unknown({byte})"),
        }
    }
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(TrackingMode::Off),
            "altaz" => Ok(TrackingMode::AltAz),
            "equatorial" => Ok(TrackingMode::Equatorial),
            "siderealpec" => Ok(TrackingMode::SiderealPec),
            _ => Err(format!(
                "Invalid tracking mode '{s}': expected Off, AltAz, Equatorial or SiderealPec"
            )),
        }
    }
}

/// Motor controller addressed by a pass-through command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// RA / azimuth motor
    RaAzimuth,
    /// Dec / altitude motor
    DecAltitude,
}

impl Axis {
    /// Device id of the motor controller
    pub fn device_id(&self) -> u8 {
        match self {
            Axis::RaAzimuth => 16,
            Axis::DecAltitude => 17,
        }
    }
}

/// Raw motor controller operation carried in an 8-byte `P` frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisCommand {
    /// Overwrite the axis position counter
    ResetPosition(Axis, Angle),
    /// Slow goto to an axis position
    SlowGoto(Axis, Angle),
    /// Move at a fixed rate; the sign selects the direction, 0 stops
    FixedRateSlew(Axis, i8),
}

impl AxisCommand {
    /// Assemble `P`, length, device, message id, three payload bytes, reply length
    pub fn to_frame(&self) -> [u8; 8] {
        match *self {
            AxisCommand::ResetPosition(axis, angle) => position_frame(axis, 4, angle),
            AxisCommand::SlowGoto(axis, angle) => position_frame(axis, 23, angle),
            AxisCommand::FixedRateSlew(axis, speed) => {
                let message = if speed > 0 { 36 } else { 37 };
                [
                    Command::Passthrough.code(),
                    2,
                    axis.device_id(),
                    message,
                    speed.unsigned_abs(),
                    0,
                    0,
                    0,
                ]
            }
        }
    }
}

fn position_frame(axis: Axis, message: u8, angle: Angle) -> [u8; 8] {
    let [high, mid, low] = encode_fixed_point(angle);
    [
        Command::Passthrough.code(),
        4,
        axis.device_id(),
        message,
        high,
        mid,
        low,
        0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::GetRaDec.code(), b'e');
        assert_eq!(Command::CancelSlew.code(), b'M');
        assert_eq!(Command::Passthrough.code(), b'P');
    }

    #[test]
    fn test_command_response() {
        assert!(Command::SetTime.expects_empty_reply());
        assert!(!Command::GetTime.expects_empty_reply());
        assert!(!Command::Echo.expects_empty_reply());
    }

    #[test]
    fn test_tracking_mode_bytes() {
        assert_eq!(TrackingMode::from_byte(2), TrackingMode::Equatorial);
        assert_eq!(TrackingMode::from_byte(9), TrackingMode::Unknown(9));
        for byte in 0..=255u8 {
            assert_eq!(TrackingMode::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_tracking_mode_parse() {
        assert_eq!("equatorial".parse::<TrackingMode>(), Ok(TrackingMode::Equatorial));
        assert_eq!("AltAz".parse::<TrackingMode>(), Ok(TrackingMode::AltAz));
        assert!("sideways".parse::<TrackingMode>().is_err());
    }

    #[test]
    fn test_position_frames() {
        let half = Angle::from_fraction(0.5);
        assert_eq!(
            AxisCommand::ResetPosition(Axis::RaAzimuth, half).to_frame(),
            [b'P', 4, 16, 4, 0x80, 0, 0, 0]
        );
        assert_eq!(
            AxisCommand::SlowGoto(Axis::DecAltitude, half).to_frame(),
            [b'P', 4, 17, 23, 0x80, 0, 0, 0]
        );
    }

    #[test]
    fn test_fixed_rate_frames() {
        assert_eq!(
            AxisCommand::FixedRateSlew(Axis::RaAzimuth, 9).to_frame(),
            [b'P', 2, 16, 36, 9, 0, 0, 0]
        );
        assert_eq!(
            AxisCommand::FixedRateSlew(Axis::DecAltitude, -4).to_frame(),
            [b'P', 2, 17, 37, 4, 0, 0, 0]
        );
        assert_eq!(
            AxisCommand::FixedRateSlew(Axis::DecAltitude, 0).to_frame(),
            [b'P', 2, 17, 37, 0, 0, 0, 0]
        );
        assert_eq!(
            AxisCommand::FixedRateSlew(Axis::RaAzimuth, i8::MIN).to_frame(),
            [b'P', 2, 16, 37, 128, 0, 0, 0]
        );
    }
}
