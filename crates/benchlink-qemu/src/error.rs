//! Error types for emulator processes

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Emulator process errors
#[derive(Debug, Error)]
pub enum QemuError {
    /// The emulator could not be started
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The child was spawned without a stdout pipe
    #[error("Emulator stdout is not captured")]
    NoStdout,

    /// No emulator has been started yet
    #[error("No emulator process started yet")]
    NotStarted,

    /// Transport was used after close
    #[error("Emulator process is closed")]
    Closed,

    /// No output within the read timeout
    #[error("Timeout waiting for emulator output after {0:?}")]
    Timeout(Duration),

    /// The emulator closed its stdout (usually: it exited)
    #[error("Emulator closed its output (exit status: {0})")]
    Disconnected(String),

    /// I/O error on the pipe
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for emulator operations
pub type Result<T> = core::result::Result<T, QemuError>;

impl From<QemuError> for benchlink_core::Error {
    fn from(e: QemuError) -> Self {
        match e {
            QemuError::Timeout(waited) => benchlink_core::Error::TransportTimeout {
                waited: Some(waited),
            },
            QemuError::Io(io) => io.into(),
            other => benchlink_core::Error::TransportUnavailable(other.to_string()),
        }
    }
}
