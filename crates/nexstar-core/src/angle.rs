//! Angles
//!
//! An [`Angle`] is a point on a circle stored as a fraction of a full turn.
//! The fraction is kept unreduced so that signed quantities (declination,
//! latitude, west longitude) survive; [`Angle::value_mod`] gives the
//! reduced `[0, 1)` form the mount's position commands use.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// A point on a circle, as a fraction of a full turn (1.0 == 360°)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Angle {
    fraction: f64,
}

/// A value split into whole units, minutes and seconds.
///
/// `whole` is degrees or hours depending on which accessor produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sexagesimal {
    /// Sign of the original value
    pub negative: bool,
    /// Whole degrees or hours
    pub whole: u32,
    /// Whole minutes (0-59)
    pub minutes: u32,
    /// Whole seconds (0-59)
    pub seconds: u32,
    /// Fraction of a second left over after truncation
    pub fraction: f64,
}

/// Error returned when a textual angle cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid angle '{0}': expected 12h34m56s, -12d34m56s, -12°34'56\" or decimal degrees")]
pub struct AngleParseError(pub String);

impl Angle {
    /// Angle from a fraction of a full turn
    pub fn from_fraction(fraction: f64) -> Self {
        Self { fraction }
    }

    /// Angle from degrees
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_fraction(degrees / 360.0)
    }

    /// Angle from hours (24h == full turn)
    pub fn from_hours(hours: f64) -> Self {
        Self::from_fraction(hours / 24.0)
    }

    /// Angle from sign, degrees, minutes and seconds
    pub fn from_dms(negative: bool, degrees: f64, minutes: f64, seconds: f64) -> Self {
        let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
        Self::from_degrees(if negative { -magnitude } else { magnitude })
    }

    /// Raw, unreduced fraction of a turn
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Angle in degrees (unreduced)
    pub fn degrees(&self) -> f64 {
        self.fraction * 360.0
    }

    /// Angle in hours (unreduced)
    pub fn hours(&self) -> f64 {
        self.fraction * 24.0
    }

    /// Fraction reduced into `[0, 1)`
    pub fn value_mod(&self) -> f64 {
        let reduced = self.fraction.rem_euclid(1.0);
        // rem_euclid of a tiny negative value rounds up to exactly 1.0
        if reduced >= 1.0 {
            0.0
        } else {
            reduced
        }
    }

    /// Truncating split into degrees, minutes and seconds
    pub fn degrees_minutes_seconds(&self) -> Sexagesimal {
        split(self.degrees())
    }

    /// Truncating split into hours, minutes and seconds
    pub fn hours_minutes_seconds(&self) -> Sexagesimal {
        split(self.hours())
    }

    /// Degrees, minutes and seconds rounded to the nearest whole arcsecond.
    ///
    /// The sign bit is kept even when the magnitude rounds to zero, so `-0.0`
    /// stays negative.
    pub fn whole_arcseconds(&self) -> Sexagesimal {
        let degrees = self.degrees();
        let total = (degrees.abs() * 3600.0).round() as u64;
        Sexagesimal {
            negative: degrees.is_sign_negative(),
            whole: (total / 3600) as u32,
            minutes: ((total / 60) % 60) as u32,
            seconds: (total % 60) as u32,
            fraction: 0.0,
        }
    }

    /// Format as signed degrees, e.g. `-12°34'56.78"`
    pub fn fmt_degrees(&self) -> String {
        format_sexagesimal(self.degrees(), ["°", "'", "\""])
    }

    /// Format as hours, e.g. `12h34m56.78s`
    pub fn fmt_hours(&self) -> String {
        format_sexagesimal(self.hours(), ["h", "m", "s"])
    }
}

fn split(value: f64) -> Sexagesimal {
    let negative = value < 0.0;
    let value = value.abs();
    let whole = value.trunc();
    let minutes = (value - whole) * 60.0;
    let whole_minutes = minutes.trunc();
    let seconds = (minutes - whole_minutes) * 60.0;
    let whole_seconds = seconds.trunc();
    Sexagesimal {
        negative,
        whole: whole as u32,
        minutes: whole_minutes as u32,
        seconds: whole_seconds as u32,
        fraction: seconds - whole_seconds,
    }
}

fn format_sexagesimal(value: f64, units: [&str; 3]) -> String {
    // Work in hundredths of a second so 59.999 carries into the next minute
    let centis = (value.abs() * 360_000.0).round() as u64;
    let sign = if value < 0.0 && centis != 0 { "-" } else { "" };
    let whole = centis / 360_000;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis % 6_000) as f64 / 100.0;
    format!(
        "{sign}{whole}{}{minutes:02}{}{seconds:05.2}{}",
        units[0], units[1], units[2]
    )
}

fn angle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?P<sign>[+-])?(?P<whole>\d+(?:\.\d+)?)(?P<unit>[hd°])(?:(?P<min>\d+(?:\.\d+)?)['m])?(?:(?P<sec>\d+(?:\.\d+)?)["s])?$"#,
        )
        .expect("angle pattern is valid")
    })
}

impl FromStr for Angle {
    type Err = AngleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || AngleParseError(s.to_string());

        if let Ok(degrees) = text.parse::<f64>() {
            if degrees.is_finite() {
                return Ok(Angle::from_degrees(degrees));
            }
            return Err(err());
        }

        let caps = angle_regex().captures(text).ok_or_else(err)?;
        let number = |name: &str| -> Result<f64, AngleParseError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<f64>().map_err(|_| err()))
                .unwrap_or(Ok(0.0))
        };
        let negative = caps.name("sign").map(|m| m.as_str() == "-").unwrap_or(false);
        let whole = number("whole")?;
        let minutes = number("min")?;
        let seconds = number("sec")?;

        let angle = Angle::from_dms(negative, whole, minutes, seconds);
        match caps.name("unit").map(|m| m.as_str()) {
            // hours use the same sexagesimal split, scaled by 15°/h
            Some("h") => Ok(Angle::from_fraction(angle.fraction() * 15.0)),
            _ => Ok(angle),
        }
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fmt_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_value_mod_wraps_negative() {
        assert!(close(Angle::from_degrees(-90.0).value_mod(), 0.75));
        assert!(close(Angle::from_fraction(1.25).value_mod(), 0.25));
        assert_eq!(Angle::from_fraction(-1e-20).value_mod(), 0.0);
    }

    #[test]
    fn test_dms_split() {
        let dms = Angle::from_dms(true, 12.0, 34.0, 56.0).whole_arcseconds();
        assert!(dms.negative);
        assert!(Angle::from_dms(true, 0.0, 0.0, 0.0).whole_arcseconds().negative);
        assert!(!Angle::from_dms(false, 0.0, 0.0, 0.0).whole_arcseconds().negative);
        assert_eq!((dms.whole, dms.minutes, dms.seconds), (12, 34, 56));
    }

    #[test]
    fn test_hms_split() {
        let hms = Angle::from_hours(6.5).hours_minutes_seconds();
        assert_eq!((hms.whole, hms.minutes, hms.seconds), (6, 30, 0));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(Angle::from_dms(true, 12.0, 34.0, 56.0).fmt_degrees(), "-12°34'56.00\"");
        assert_eq!(Angle::from_hours(12.5).fmt_hours(), "12h30m00.00s");
        // 59.999s rounds into the next minute instead of printing 60.00
        assert_eq!(Angle::from_dms(false, 1.0, 0.0, 59.999).fmt_degrees(), "1°01'00.00\"");
    }

    #[test]
    fn test_parse_forms() {
        let hours: Angle = "12h30m".parse().unwrap();
        assert!(close(hours.degrees(), 187.5));

        let degrees: Angle = "-12d30m".parse().unwrap();
        assert!(close(degrees.degrees(), -12.5));

        let symbols: Angle = "45°30'36\"".parse().unwrap();
        assert!(close(symbols.degrees(), 45.51));

        let decimal: Angle = " -33.25 ".parse().unwrap();
        assert!(close(decimal.degrees(), -33.25));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("north".parse::<Angle>().is_err());
        assert!("12x".parse::<Angle>().is_err());
        assert!("inf".parse::<Angle>().is_err());
        assert!("".parse::<Angle>().is_err());
    }
}
