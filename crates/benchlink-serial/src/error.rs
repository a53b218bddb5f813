//! Error types for the serial transport

use std::time::Duration;
use thiserror::Error;

/// Serial transport errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// Opening the device failed
    #[error("Failed to open {device}: {source}")]
    OpenFailed {
        device: String,
        #[source]
        source: serialport::Error,
    },

    /// Device did not appear before the wait deadline
    #[error("{device} did not become available within {waited:?}")]
    NotAvailable { device: String, waited: Duration },

    /// Port was used after close
    #[error("Serial port {0} is closed")]
    Closed(String),

    /// No byte arrived within the port timeout
    #[error("Communication timeout after {0:?}")]
    Timeout(Duration),

    /// Port returned end of file
    #[error("Serial port {0} reported end of stream")]
    Disconnected(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for serial operations
pub type Result<T> = core::result::Result<T, SerialError>;

impl From<SerialError> for benchlink_core::Error {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Timeout(waited) => benchlink_core::Error::TransportTimeout {
                waited: Some(waited),
            },
            SerialError::Io(io) => io.into(),
            other => benchlink_core::Error::TransportUnavailable(other.to_string()),
        }
    }
}
