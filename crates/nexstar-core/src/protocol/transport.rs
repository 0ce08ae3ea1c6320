//! Byte transport underneath the transaction engine

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Duplex byte stream the mount is reached through.
///
/// Implementors report timeouts as `io::ErrorKind::TimedOut` and end of
/// stream as a zero-length read.
pub trait Transport: Read + Write + Send {
    /// Discard anything waiting in the receive buffer
    fn clear_input_buffer(&mut self) -> io::Result<()>;
}

/// Serial port wrapper implementing [`Transport`].
///
/// serialport has a single timeout per port, so the wrapper switches between
/// the read and write timeouts as the direction changes.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
    write_timeout: Duration,
    active: Option<Duration>,
}

impl SerialTransport {
    /// Wrap an opened port
    pub fn new(port: Box<dyn SerialPort>, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            port,
            read_timeout,
            write_timeout,
            active: None,
        }
    }

    fn use_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        if self.active != Some(timeout) {
            self.port
                .set_timeout(timeout)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            self.active = Some(timeout);
        }
        Ok(())
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.use_timeout(self.read_timeout)?;
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.use_timeout(self.write_timeout)?;
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialTransport {
    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
