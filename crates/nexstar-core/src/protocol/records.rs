//! Packed location and time records
//!
//! Both records are 8 raw bytes. They are binary, not text: every byte holds
//! a numeric value and may exceed 127, so they are always handled as `[u8]`.
//!
//! Location: `[lat°, lat', lat", south, lon°, lon', lon", west]`
//!
//! Time: `[hour, minute, second, month, day, year-2000, utc offset, dst]`,
//! where a negative UTC offset is sent as `offset + 256`.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use super::encoding::{decode_dms_triplet, encode_dms_triplet};
use super::ProtocolError;
use crate::angle::Angle;

/// Length of both packed records
pub const RECORD_LEN: usize = 8;

/// Observer location as reported to / by the mount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude, negative south
    pub latitude: Angle,
    /// Longitude, negative west
    pub longitude: Angle,
}

impl Location {
    /// Create a location from latitude and longitude
    pub fn new(latitude: Angle, longitude: Angle) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Pack a location into the 8-byte `W` payload
pub fn encode_location(location: &Location) -> [u8; RECORD_LEN] {
    let (south, [lat_deg, lat_min, lat_sec]) = encode_dms_triplet(location.latitude);
    let (west, [lon_deg, lon_min, lon_sec]) = encode_dms_triplet(location.longitude);
    [
        lat_deg,
        lat_min,
        lat_sec,
        south as u8,
        lon_deg,
        lon_min,
        lon_sec,
        west as u8,
    ]
}

/// Unpack the 8-byte reply to `w`
pub fn decode_location(reply: &[u8]) -> Result<Location, ProtocolError> {
    let record: [u8; RECORD_LEN] = reply
        .try_into()
        .map_err(|_| ProtocolError::invalid(b'w', "location record is not 8 bytes", reply))?;
    let [lat_deg, lat_min, lat_sec, south, lon_deg, lon_min, lon_sec, west] = record;
    Ok(Location {
        latitude: decode_dms_triplet(south == 1, [lat_deg, lat_min, lat_sec]),
        longitude: decode_dms_triplet(west == 1, [lon_deg, lon_min, lon_sec]),
    })
}

/// Pack a zoned timestamp into the 8-byte `H` payload.
///
/// The UTC offset is taken from the timestamp itself, in whole hours truncated
/// toward zero. The DST byte is always 0: the offset already includes it.
pub fn encode_time(time: &DateTime<FixedOffset>) -> [u8; RECORD_LEN] {
    let offset_hours = time.offset().local_minus_utc() / 3600;
    let offset_byte = if offset_hours < 0 {
        offset_hours + 256
    } else {
        offset_hours
    };
    [
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
        time.month() as u8,
        time.day() as u8,
        (time.year() - 2000) as u8,
        offset_byte as u8,
        0,
    ]
}

/// Unpack the 8-byte reply to `h`.
///
/// When the mount's zone disagrees with `host` the discrepancy is logged and
/// the timestamp is re-expressed in the host's zone. This is a correction, not
/// an error: the mount clock may simply be configured for another zone.
pub fn decode_time(reply: &[u8], host: FixedOffset) -> Result<DateTime<FixedOffset>, ProtocolError> {
    let record: [u8; RECORD_LEN] = reply
        .try_into()
        .map_err(|_| ProtocolError::invalid(b'h', "time record is not 8 bytes", reply))?;
    let [hour, minute, second, month, day, year, offset_byte, dst] = record;

    let mut mount_offset = offset_byte as i32;
    if mount_offset >= 128 {
        mount_offset -= 256;
    }
    if dst & 1 == 1 {
        mount_offset -= 1;
    }

    let naive = NaiveDate::from_ymd_opt(2000 + year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| ProtocolError::invalid(b'h', "time record is not a valid date", reply))?;
    let mount_zone = FixedOffset::east_opt(mount_offset * 3600)
        .ok_or_else(|| ProtocolError::invalid(b'h', "time zone offset out of range", reply))?;
    let mount_time = mount_zone
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| ProtocolError::invalid(b'h', "time record is ambiguous", reply))?;

    let host_offset = host.local_minus_utc() / 3600;
    if host_offset == mount_offset {
        return Ok(mount_time);
    }

    tracing::warn!(
        mount_offset,
        host_offset,
        shift_hours = host_offset - mount_offset,
        "Mount clock is set for a different time zone; converting to host zone"
    );
    Ok(mount_time.with_timezone(&host))
}

/// The host's current UTC offset
pub fn host_utc_offset() -> FixedOffset {
    *Local::now().offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    #[test]
    fn test_location_record_layout() {
        let location = Location::new(
            Angle::from_dms(true, 33.0, 51.0, 54.0),
            Angle::from_dms(false, 151.0, 12.0, 36.0),
        );
        assert_eq!(encode_location(&location), [33, 51, 54, 1, 151, 12, 36, 0]);
    }

    #[test]
    fn test_location_roundtrip_exact() {
        let records: [[u8; 8]; 5] = [
            [0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 1, 0, 0, 0, 1],
            [47, 36, 22, 0, 122, 19, 55, 1],
            [89, 59, 59, 1, 179, 59, 59, 1],
            [12, 0, 1, 0, 200, 30, 0, 0],
        ];
        for record in records {
            let location = decode_location(&record).unwrap();
            assert_eq!(encode_location(&location), record);
        }
    }

    #[test]
    fn test_location_wrong_length() {
        let err = decode_location(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidResponse { command: 'w', .. }));
    }

    #[test]
    fn test_time_encode_negative_offset() {
        let time = hours(-5)
            .with_ymd_and_hms(2024, 3, 9, 21, 4, 5)
            .unwrap();
        assert_eq!(encode_time(&time), [21, 4, 5, 3, 9, 24, 251, 0]);
    }

    #[test]
    fn test_time_roundtrip_all_offsets() {
        for offset in -12..=14 {
            let byte = (if offset < 0 { offset + 256 } else { offset }) as u8;
            let record = [23, 59, 58, 12, 31, 25, byte, 0];
            let time = decode_time(&record, hours(offset)).unwrap();
            assert_eq!(time.offset().local_minus_utc(), offset * 3600);
            assert_eq!(encode_time(&time), record);
        }
    }

    #[test]
    fn test_time_dst_flag_subtracts_hour() {
        let record = [8, 0, 0, 7, 4, 24, 3, 1];
        let time = decode_time(&record, hours(2)).unwrap();
        assert_eq!(time.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(time.hour(), 8);
        // DST is folded into the offset on the way back
        assert_eq!(encode_time(&time), [8, 0, 0, 7, 4, 24, 2, 0]);
    }

    #[test]
    fn test_time_zone_mismatch_converts_to_host() {
        let record = [10, 0, 0, 1, 1, 24, 1, 0];
        let time = decode_time(&record, hours(0)).unwrap();
        assert_eq!(time.offset().local_minus_utc(), 0);
        assert_eq!(time.hour(), 9);
        // same instant either way
        let mount_view = hours(1).with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(time, mount_view);
    }

    #[test]
    fn test_time_invalid_records() {
        assert!(decode_time(&[0; 7], hours(0)).is_err());
        assert!(decode_time(&[0, 0, 0, 13, 1, 24, 0, 0], hours(0)).is_err());
        assert!(decode_time(&[25, 0, 0, 1, 1, 24, 0, 0], hours(0)).is_err());
    }
}
