//! Serial port transport implementation

use crate::error::{Result, SerialError};
use benchlink_core::Transport;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::{Duration, Instant};

/// Baud rate the benchmark firmware uses on its UART
pub const DEFAULT_BAUD: u32 = 38400;

/// Default per-read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between attempts while waiting for the device node
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Serial port settings
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g., "/dev/ttyACM0" or "COM3")
    pub device: String,
    /// Baud rate
    pub baud: u32,
    /// Maximum wait for any single read
    pub timeout: Duration,
    /// Keep retrying the open for this long if the device is missing
    pub open_wait: Option<Duration>,
}

impl SerialConfig {
    /// Settings for `device` with the firmware's default baud rate and timeout
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
            open_wait: None,
        }
    }

    /// Set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Set the per-read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait up to `wait` for the device to appear when opening
    pub fn wait_for_device(mut self, wait: Duration) -> Self {
        self.open_wait = Some(wait);
        self
    }
}

/// Serial port transport
///
/// The read timeout is a property of the open port, so every `read` blocks
/// for at most [`SerialConfig::timeout`].
pub struct SerialTransport {
    device: String,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the serial port described by `config`
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = match config.open_wait {
            None => Self::open_port(config)?,
            Some(wait) => Self::open_port_waiting(config, wait)?,
        };

        log::info!(
            "Opened serial port {} at {} baud",
            config.device,
            config.baud
        );

        Ok(Self {
            device: config.device.clone(),
            timeout: config.timeout,
            port: Some(port),
        })
    }

    fn open_port(config: &SerialConfig) -> Result<Box<dyn SerialPort>> {
        serialport::new(&config.device, config.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|source| SerialError::OpenFailed {
                device: config.device.clone(),
                source,
            })
    }

    fn open_port_waiting(config: &SerialConfig, wait: Duration) -> Result<Box<dyn SerialPort>> {
        let deadline = Instant::now() + wait;
        loop {
            match Self::open_port(config) {
                Ok(port) => return Ok(port),
                Err(e) if Instant::now() < deadline => {
                    log::debug!("Waiting for {}: {}", config.device, e);
                    std::thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(_) => {
                    return Err(SerialError::NotAvailable {
                        device: config.device.clone(),
                        waited: wait,
                    })
                }
            }
        }
    }

    /// Wrap a port that is already open, applying `timeout` to it
    pub fn from_port(
        device: impl Into<String>,
        mut port: Box<dyn SerialPort>,
        timeout: Duration,
    ) -> Result<Self> {
        port.set_timeout(timeout)?;
        Ok(Self {
            device: device.into(),
            timeout,
            port: Some(port),
        })
    }

    /// Device path this transport was opened on
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Set the read timeout
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port_mut()?.set_timeout(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    /// Whether the port has been closed
    pub fn is_closed(&self) -> bool {
        self.port.is_none()
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| SerialError::Closed(self.device.clone()))
    }

    fn read_port(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let device = self.device.clone();
        match self.port_mut()?.read(buf) {
            Ok(0) => Err(SerialError::Disconnected(device)),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(SerialError::Timeout(timeout)),
            Err(e) => Err(SerialError::from(e)),
        }
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> benchlink_core::Result<usize> {
        Ok(self.read_port(buf)?)
    }

    fn reset_input_buffer(&mut self) -> benchlink_core::Result<()> {
        self.port_mut()?.clear(ClearBuffer::Input).map_err(SerialError::from)?;
        Ok(())
    }

    fn close(&mut self) -> benchlink_core::Result<()> {
        if self.port.take().is_some() {
            log::debug!("Closed serial port {}", self.device);
        }
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
