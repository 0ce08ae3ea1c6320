//! # NexStar Core Library
//!
//! Drives NexStar-family telescope mounts over their serial hand-controller
//! protocol.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Angle values with degree/hour formatting and parsing
//! - The mount's wire encodings (hex fractions, base-256 fixed point,
//!   packed location and time records)
//! - A transaction engine that keeps exactly one command in flight
//! - Typed mount commands, blocking and async
//!
//! ## Example
//!
//! ```rust,ignore
//! use nexstar_core::{angle::Angle, mount::Mount, protocol::TrackingMode};
//!
//! let mount = Mount::open("/dev/ttyUSB0")?;
//! let (ra, dec) = mount.get_ra_dec()?;
//! println!("{} {}", ra.fmt_hours(), dec.fmt_degrees());
//!
//! mount.set_tracking_mode(TrackingMode::Equatorial)?;
//! mount.slew_ra_dec("5h35m17s".parse()?, "-5d23m28s".parse()?)?;
//! ```

pub mod angle;
pub mod async_mount;
pub mod mount;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::angle::Angle;
    pub use crate::async_mount::AsyncMount;
    pub use crate::mount::Mount;
    pub use crate::protocol::{
        Axis, Connection, ConnectionConfig, Location, ProtocolError, TrackingMode,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
