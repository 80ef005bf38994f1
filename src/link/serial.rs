//! Live serial link to the device.

use super::ByteSource;
use anyhow::{anyhow, Result};
use log::debug;
use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;

pub struct SerialSource {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialSource {
    /// Open `port_name` at `baud_rate`, 8N1.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        debug!("Opening serial port {} at {} baud", port_name, baud_rate);

        let builder = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None);
        let mut port = builder
            .open()
            .map_err(|e| anyhow!("Failed to open serial port {}: {}", port_name, e))?;

        // Some USB adapters hold the device in reset until DTR/RTS are raised
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);

        debug!("Serial port {} initialized", port_name);
        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ByteSource for SerialSource {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let waiting = self.port.bytes_to_read().map_err(io::Error::from)? as usize;
        if waiting == 0 {
            return Ok(0);
        }
        let want = waiting.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }
}
