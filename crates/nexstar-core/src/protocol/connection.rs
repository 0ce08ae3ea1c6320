//! Connection management
//!
//! The transaction engine. A [`Connection`] owns the transport for its whole
//! lifetime and runs one write-then-read exchange at a time: the protocol has
//! no length prefix and no request id, so a reply is only delimited by the `#`
//! terminator and only attributable to whoever holds the transport.
//!
//! A reply longer than [`MAX_REPLY_LEN`] bytes fails with
//! [`ProtocolError::BufferOverflow`] once the first byte past the cap arrives.
//!
//! A transport timeout mid-reply, or an overflow, leaves the rest of that
//! reply in the receive buffer, where it is read as the start of the next
//! reply. Nothing here flushes automatically; [`Connection::discard_input`] is
//! available to callers that want to resynchronise.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{
    serial::open_port,
    transport::{SerialTransport, Transport},
    ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, MAX_REPLY_LEN, TERMINATOR,
};

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Write timeout in milliseconds
    pub write_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ConnectionConfig {
    /// Default settings for the named port
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Read timeout as a Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Write timeout as a Duration
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ProtocolError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ProtocolError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// `<config dir>/nexstar/connection.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nexstar").join("connection.json"))
    }
}

/// Cumulative traffic on a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounters {
    /// Bytes written, including command bytes
    pub tx_bytes: u64,
    /// Reply bytes read, excluding terminators
    pub rx_bytes: u64,
    /// Completed transactions
    pub transactions: u64,
}

struct Link {
    transport: Option<Box<dyn Transport>>,
    counters: LinkCounters,
}

/// Mount connection serialising every exchange on one transport
pub struct Connection {
    link: Mutex<Link>,
    port_name: String,
}

impl Connection {
    /// Open the configured serial port
    pub fn open(config: &ConnectionConfig) -> Result<Self, ProtocolError> {
        let port = open_port(config)?;
        tracing::info!(
            port = %config.port_name,
            baud = config.baud_rate,
            "Opened mount connection"
        );
        let transport = SerialTransport::new(port, config.read_timeout(), config.write_timeout());
        Ok(Self::from_parts(Box::new(transport), config.port_name.clone()))
    }

    /// Run the protocol over an already-open transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self::from_parts(transport, String::from("<transport>"))
    }

    fn from_parts(transport: Box<dyn Transport>, port_name: String) -> Self {
        Self {
            link: Mutex::new(Link {
                transport: Some(transport),
                counters: LinkCounters::default(),
            }),
            port_name,
        }
    }

    /// Name of the port this connection was opened on
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn lock(&self) -> Result<MutexGuard<'_, Link>, ProtocolError> {
        self.link.lock().map_err(|_| ProtocolError::LockPoisoned)
    }

    /// Send one command and return its reply without the terminator.
    ///
    /// Blocks until no other exchange is in flight. The lock is held for the
    /// whole write+read cycle and released on every exit path.
    pub fn interact(&self, command: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let mut guard = self.lock()?;
        let link = &mut *guard;
        let transport = link
            .transport
            .as_mut()
            .ok_or(ProtocolError::NotConnected)?;

        tracing::debug!(frame = %command.escape_ascii(), "mount <");
        let result = exchange(transport.as_mut(), command);
        match &result {
            Ok(reply) => {
                link.counters.tx_bytes += command.len() as u64;
                link.counters.rx_bytes += reply.len() as u64;
                link.counters.transactions += 1;
                tracing::debug!(reply = %reply.escape_ascii(), "mount >");
            }
            Err(e) => {
                tracing::warn!(
                    command = %command.escape_ascii(),
                    error = %e,
                    "Mount transaction failed"
                );
            }
        }
        result
    }

    /// Drop whatever is waiting in the receive buffer
    pub fn discard_input(&self) -> Result<(), ProtocolError> {
        let mut link = self.lock()?;
        let transport = link
            .transport
            .as_mut()
            .ok_or(ProtocolError::NotConnected)?;
        transport.clear_input_buffer()?;
        Ok(())
    }

    /// Close the transport; later commands fail with `NotConnected`
    pub fn close(&self) -> Result<(), ProtocolError> {
        let mut link = self.lock()?;
        if link.transport.take().is_some() {
            tracing::info!(port = %self.port_name, "Closed mount connection");
        }
        Ok(())
    }

    /// Check if the transport is still open
    pub fn is_open(&self) -> bool {
        self.lock().map(|l| l.transport.is_some()).unwrap_or(false)
    }

    /// Traffic counters so far
    pub fn counters(&self) -> LinkCounters {
        match self.link.lock() {
            Ok(link) => link.counters,
            Err(poisoned) => poisoned.into_inner().counters,
        }
    }
}

fn exchange(transport: &mut dyn Transport, command: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    transport.write_all(command).map_err(transport_error)?;
    read_reply(transport)
}

/// Read single bytes until the terminator (consumed, not returned) or end of stream
fn read_reply(transport: &mut dyn Transport) -> Result<Vec<u8>, ProtocolError> {
    let mut reply = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match transport.read(&mut byte) {
            Ok(0) => break,
            Ok(_) if byte[0] == TERMINATOR => break,
            Ok(_) => {
                if reply.len() >= MAX_REPLY_LEN {
                    return Err(ProtocolError::BufferOverflow(MAX_REPLY_LEN));
                }
                reply.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(transport_error(e)),
        }
    }
    Ok(reply)
}

fn transport_error(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProtocolError::Timeout,
        _ => ProtocolError::IoError(e),
    }
}
