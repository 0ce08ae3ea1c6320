//! Serial Protocol Communication
//!
//! Implements the NexStar hand-controller serial protocol: single-byte command
//! codes, `#`-terminated replies, and the hex, fixed-point and packed-record
//! value encodings that travel over it.

pub mod command_builder;
pub mod commands;
mod connection;
pub mod encoding;
mod error;
pub mod records;
pub mod serial;
pub mod transport;

pub use command_builder::CommandBuilder;
pub use commands::{Axis, AxisCommand, Command, TrackingMode};
pub use connection::{Connection, ConnectionConfig, LinkCounters};
pub use error::ProtocolError;
pub use records::Location;
pub use serial::{auto_select_port, list_ports, open_port, port_names, PortInfo};
pub use transport::{SerialTransport, Transport};

/// Fixed baud rate of the hand controller's serial port
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read and write timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Byte ending every reply
pub const TERMINATOR: u8 = b'#';

/// Longest reply accepted before giving up on finding a terminator
pub const MAX_REPLY_LEN: usize = 256;
