//! Angle wire encodings
//!
//! The mount carries angles in three unrelated forms:
//! - 8 uppercase hex digits holding a 32-bit fraction of a turn (`e`, `s`, `r`, `z`, `b`)
//! - 3 raw bytes of base-256 fixed point (payload of `P` axis commands)
//! - a sign flag plus raw degree/minute/second bytes (inside the location record)
//!
//! None of these validate range: values outside the circle wrap.

use super::ProtocolError;
use crate::angle::Angle;

const TURN: f64 = 4_294_967_296.0; // 2^32

/// Number of hex digits in a position field
pub const HEX_FIELD_LEN: usize = 8;

/// Encode as 8 uppercase hex digits of `round(value_mod * 2^32) mod 2^32`
pub fn encode_hex_fraction(angle: Angle) -> String {
    format!("{:08X}", hex_fraction_bits(angle))
}

/// Encode for a position-setting command.
///
/// The mount honours only 24 significant bits on writes, so the low byte is zeroed.
/// The value is rounded to 32 bits first, so the result can sit up to 2^-33 of a
/// turn above `angle`; otherwise it is at or below it.
pub fn encode_hex_position(angle: Angle) -> String {
    format!("{:08X}", hex_fraction_bits(angle) & 0xFFFF_FF00)
}

fn hex_fraction_bits(angle: Angle) -> u32 {
    ((angle.value_mod() * TURN).round() as u64 % (1u64 << 32)) as u32
}

/// Decode exactly 8 hex digits into a fraction in `[0, 1)`.
///
/// `command` is only used to label the error.
pub fn decode_hex_fraction(command: u8, field: &[u8]) -> Result<Angle, ProtocolError> {
    if field.len() != HEX_FIELD_LEN {
        return Err(ProtocolError::invalid(
            command,
            "position field is not 8 hex digits",
            field,
        ));
    }
    // from_str_radix alone would accept a leading '+'
    if !field.iter().all(u8::is_ascii_hexdigit) {
        return Err(ProtocolError::invalid(
            command,
            "position field contains non-hex characters",
            field,
        ));
    }
    let text = std::str::from_utf8(field)
        .map_err(|_| ProtocolError::invalid(command, "position field is not ASCII", field))?;
    let bits = u32::from_str_radix(text, 16)
        .map_err(|_| ProtocolError::invalid(command, "position field is not hex", field))?;
    Ok(Angle::from_fraction(bits as f64 / TURN))
}

/// Encode as three base-256 digits (high, mid, low) of `value_mod`
pub fn encode_fixed_point(angle: Angle) -> [u8; 3] {
    let mut value = angle.value_mod();
    let mut out = [0u8; 3];
    for byte in out.iter_mut() {
        value *= 256.0;
        let digit = value.trunc();
        *byte = digit as u8;
        value -= digit;
    }
    out
}

/// Rebuild a fraction from three base-256 digits
pub fn decode_fixed_point(bytes: [u8; 3]) -> Angle {
    let [high, mid, low] = bytes;
    Angle::from_fraction(
        high as f64 / 256.0 + mid as f64 / 65_536.0 + low as f64 / 16_777_216.0,
    )
}

/// Encode a signed angle as (negative, [degrees, minutes, seconds]).
///
/// Bytes are raw numeric values, not ASCII digits. Degrees above 255 wrap.
pub fn encode_dms_triplet(angle: Angle) -> (bool, [u8; 3]) {
    let dms = angle.whole_arcseconds();
    (
        dms.negative,
        [dms.whole as u8, dms.minutes as u8, dms.seconds as u8],
    )
}

/// Inverse of [`encode_dms_triplet`]
pub fn decode_dms_triplet(negative: bool, bytes: [u8; 3]) -> Angle {
    let [degrees, minutes, seconds] = bytes;
    Angle::from_dms(negative, degrees as f64, minutes as f64, seconds as f64)
}
