//! Real serial ports via the `serialport` crate.

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use soiling_traits::Connector;

use crate::error::{HwError, Result};
use crate::line::LineReader;

/// 8N1, no flow control; the read timeout bounds every `read_line` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Source = LineReader<Box<dyn SerialPort>>;

    fn open(
        &self,
        port: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> std::result::Result<Self::Source, Box<dyn std::error::Error + Send + Sync>> {
        let handle = serialport::new(port, baud)
            .timeout(read_timeout)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| HwError::Serial(format!("open {port}: {e}")))?;
        tracing::info!(port, baud, timeout_ms = read_timeout.as_millis() as u64, "serial port opened");
        Ok(LineReader::new(handle))
    }
}

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports visible to the OS.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| HwError::Serial(e.to_string()))?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match &p.port_type {
                SerialPortType::UsbPort(info) => {
                    let product = info.product.clone().unwrap_or_default();
                    format!("USB {:04x}:{:04x} {product}", info.vid, info.pid)
                        .trim_end()
                        .to_string()
                }
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::Unknown => "unknown".to_string(),
            };
            PortInfo {
                name: p.port_name,
                description,
            }
        })
        .collect())
}
