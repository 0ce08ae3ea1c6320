//! Console commands
//!
//! One line in, one command out. Argument errors and mount failures surface as
//! `anyhow` errors; the caller prints them and keeps reading.

use anyhow::{bail, Context, Result};
use nexstar_core::prelude::*;
use nexstar_core::protocol::list_ports;
use std::io::Write;
use std::time::Instant;

/// What the caller should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading
    Continue,
    /// Not a known command or wrong argument count
    Unknown,
    /// Leave the console
    Quit,
}

const HELP: &[(&str, &str)] = &[
    ("ports", "list serial ports"),
    ("pos", "print RA/Dec"),
    ("azalt", "print azimuth/altitude"),
    ("setpos {ra} {dec}", "overwrite position"),
    ("slew {ra} {dec}", "slew to RA/Dec"),
    ("slewazalt {az} {alt}", "slew to azimuth/altitude"),
    ("cancel", "cancel slew"),
    ("mode", "print tracking mode"),
    ("mode {Off|AltAz|Equatorial|SiderealPec}", "set tracking mode"),
    ("location", "print location"),
    ("location {lat} {lon}", "set location"),
    ("time", "print mount's time"),
    ("time now", "set mount time to present"),
    ("aligned", "print if mount is aligned"),
    ("ping", "ping telescope"),
    ("counters", "print link traffic"),
    ("quit", "exit"),
];

fn angle(text: &str) -> Result<Angle> {
    text.parse::<Angle>()
        .with_context(|| format!("expected an angle like 12h30m or -5d23m28s, got {text:?}"))
}

/// Run one console line against `mount`, writing results to `out`
pub fn execute(line: &str, mount: &Mount, out: &mut impl Write) -> Result<Outcome> {
    let words: Vec<&str> = line.split_whitespace().collect();

    match words.as_slice() {
        [] => {}
        ["help"] => {
            for (usage, what) in HELP {
                writeln!(out, "{usage} -- {what}")?;
            }
        }
        ["quit"] | ["exit"] => return Ok(Outcome::Quit),
        ["ports"] => {
            for (index, port) in list_ports().iter().enumerate() {
                match &port.product {
                    Some(product) => writeln!(out, "[{index}] {} ({product})", port.name)?,
                    None => writeln!(out, "[{index}] {}", port.name)?,
                }
            }
        }
        ["pos"] => {
            let (ra, dec) = mount.get_ra_dec()?;
            writeln!(out, "{} {}", ra.fmt_hours(), dec.fmt_degrees())?;
        }
        ["azalt"] => {
            let (az, alt) = mount.get_az_alt()?;
            writeln!(out, "{} {}", az.fmt_degrees(), alt.fmt_degrees())?;
        }
        ["setpos", ra, dec] => {
            mount.overwrite_ra_dec(angle(ra)?, angle(dec)?)?;
            writeln!(out, "ok")?;
        }
        ["slew", ra, dec] => {
            mount.slew_ra_dec(angle(ra)?, angle(dec)?)?;
            writeln!(out, "ok")?;
        }
        ["slewazalt", az, alt] => {
            mount.slew_az_alt(angle(az)?, angle(alt)?)?;
            writeln!(out, "ok")?;
        }
        ["cancel"] => {
            mount.cancel_slew()?;
            writeln!(out, "ok")?;
        }
        ["mode"] => writeln!(out, "{}", mount.tracking_mode()?)?,
        ["mode", name] => {
            let mode = match name.parse::<TrackingMode>() {
                Ok(TrackingMode::Unknown(_)) | Err(_) => bail!("unknown tracking mode {name:?}"),
                Ok(mode) => mode,
            };
            mount.set_tracking_mode(mode)?;
            writeln!(out, "ok")?;
        }
        ["location"] => {
            let location = mount.location()?;
            writeln!(
                out,
                "{} {}",
                location.latitude.fmt_degrees(),
                location.longitude.fmt_degrees()
            )?;
        }
        ["location", lat, lon] => {
            mount.set_location(&Location::new(angle(lat)?, angle(lon)?))?;
            writeln!(out, "ok")?;
        }
        ["time"] => {
            let time = mount.time()?;
            writeln!(out, "{}", time.format("%Y-%m-%d %H:%M:%S %:z"))?;
        }
        ["time", "now"] => {
            mount.set_time_now()?;
            writeln!(out, "ok")?;
        }
        ["aligned"] => writeln!(out, "{}", mount.is_aligned()?)?,
        ["ping"] => {
            let start = Instant::now();
            let ok = mount.echo(b'U')? == b'U';
            writeln!(
                out,
                "{:.3} seconds (ok={ok})",
                start.elapsed().as_secs_f32()
            )?;
        }
        ["counters"] => {
            let counters = mount.connection().counters();
            writeln!(
                out,
                "tx {} bytes, rx {} bytes, {} transactions",
                counters.tx_bytes, counters.rx_bytes, counters.transactions
            )?;
        }
        _ => return Ok(Outcome::Unknown),
    }

    Ok(Outcome::Continue)
}
