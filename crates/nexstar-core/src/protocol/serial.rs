//! Serial port handling
//!
//! Port discovery and opening at the mount's fixed line settings (8N1).

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;

use super::{ConnectionConfig, ProtocolError};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            product: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            _ => Self::bare(info.port_name),
        }
    }
}

/// Sort key putting USB serial adapters first, numerically by suffix
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("COM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (2, num, basename.to_string());
    }
    (3, 0, basename.to_string())
}

/// List all available serial ports in a deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Some USB adapters never show up through the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyUSB") || fname.starts_with("ttyACM") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone())
                        .or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Names of the available serial ports
pub fn port_names() -> Vec<String> {
    list_ports().into_iter().map(|p| p.name).collect()
}

/// Pick the only available port, refusing to guess between several
pub fn auto_select_port(names: &[String]) -> Result<String, ProtocolError> {
    match names {
        [only] => Ok(only.clone()),
        _ => Err(ProtocolError::PortSelection {
            available: names.len(),
        }),
    }
}

/// Open the configured port at 8N1 with no flow control
pub fn open_port(config: &ConnectionConfig) -> Result<Box<dyn SerialPort>, ProtocolError> {
    serialport::new(&config.port_name, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(config.read_timeout())
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => ProtocolError::PortNotFound(config.port_name.clone()),
            _ => ProtocolError::SerialError(e.to_string()),
        })
}
