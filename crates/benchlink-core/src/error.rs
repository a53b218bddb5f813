//! Error types for benchlink sessions
//!
//! Every failure a `run` can end in maps onto one of these variants. Crates
//! that wrap a concrete transport or flasher keep their own error enum and
//! convert into this one at the trait boundary.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Session-level errors
#[derive(Debug, Error)]
pub enum Error {
    /// Loading the binary onto the target failed
    #[error("Flashing {} failed: {reason}", .binary.display())]
    FlashFailure {
        /// Binary that was being flashed
        binary: PathBuf,
        /// Tool exit status or programmer step that failed
        reason: String,
    },

    /// No data arrived within the configured window
    #[error("Timeout: no data from target{}", waited_suffix(.waited))]
    TransportTimeout {
        /// How long the transport waited, when the transport knows it
        waited: Option<Duration>,
    },

    /// Data arrived but the start delimiter had the wrong shape
    #[error("Malformed start delimiter: {candidate:?}")]
    ProtocolMismatch {
        /// The start line as received (lossily decoded)
        candidate: String,
    },

    /// The underlying handle could not be opened or went away
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A reader was driven again after it completed or failed
    #[error("Session already finished")]
    SessionFinished,
}

impl Error {
    /// Build a [`Error::FlashFailure`] for `binary`
    pub fn flash_failure(binary: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::FlashFailure {
            binary: binary.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TransportTimeout { .. })
    }
}

fn waited_suffix(waited: &Option<Duration>) -> String {
    match waited {
        Some(waited) => format!(" within {:?}", waited),
        None => String::new(),
    }
}

/// Result type for benchlink operations
pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::TransportTimeout { waited: None },
            _ => Error::TransportUnavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_timeout_maps_to_transport_timeout() {
        let err: Error = io::Error::new(io::ErrorKind::TimedOut, "slow").into();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_io_timeout_has_no_window() {
        let err: Error = io::Error::new(io::ErrorKind::WouldBlock, "again").into();
        assert!(matches!(err, Error::TransportTimeout { waited: None }));
        assert_eq!(err.to_string(), "Timeout: no data from target");

        let err = Error::TransportTimeout {
            waited: Some(Duration::from_secs(60)),
        };
        assert_eq!(err.to_string(), "Timeout: no data from target within 60s");
    }

    #[test]
    fn test_io_other_maps_to_unavailable() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "no tty").into();
        assert!(matches!(err, Error::TransportUnavailable(msg) if msg.contains("no tty")));
    }

    #[test]
    fn test_flash_failure_display() {
        let err = Error::flash_failure("build/aes.bin", "exit status: 2");
        assert_eq!(err.to_string(), "Flashing build/aes.bin failed: exit status: 2");
    }
}
