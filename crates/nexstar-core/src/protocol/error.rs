//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the mount
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Timed out waiting for the mount")]
    Timeout,

    #[error("Not connected to mount")]
    NotConnected,

    #[error("Cannot pick a serial port automatically: {available} ports available")]
    PortSelection { available: usize },

    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// A reply did not have the shape its command requires
    #[error("Invalid reply to '{command}': {reason} (raw: \"{}\")", .reply.escape_ascii())]
    InvalidResponse {
        command: char,
        reason: &'static str,
        reply: Vec<u8>,
    },

    /// A no-result command received a payload
    #[error("'{command}' expected an empty reply, got \"{}\"", .reply.escape_ascii())]
    UnexpectedReply { command: char, reply: Vec<u8> },

    #[error("Reply exceeded {0} bytes without a terminator")]
    BufferOverflow(usize),

    #[error("Transaction lock poisoned by a panicked caller")]
    LockPoisoned,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Build a format error for `command` carrying the offending reply
    pub(crate) fn invalid(command: u8, reason: &'static str, reply: &[u8]) -> Self {
        ProtocolError::InvalidResponse {
            command: command as char,
            reason,
            reply: reply.to_vec(),
        }
    }
}
