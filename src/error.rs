//! Errors of the command-line front end

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while selecting and opening a platform
#[derive(Debug, Error)]
pub enum CliError {
    /// Platform name is not registered or its feature is disabled
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// Option without a value in the platform string
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    /// Option value failed to parse
    #[error("Invalid {key}='{value}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A flasher needs an option that was not given
    #[error("{flasher} requires {key}=<{what}>")]
    MissingParameter {
        flasher: &'static str,
        key: &'static str,
        what: &'static str,
    },

    /// Unsupported `flasher=` value
    #[error("Unknown flasher: {0} (expected st-flash, openocd or none)")]
    UnknownFlasher(String),

    /// Platform has no flash step of its own
    #[error("{platform} keeps no image outside a run; use `run` instead")]
    RunOnly { platform: String },

    /// Binary path does not name a file
    #[error("Binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// Serial port could not be opened
    #[cfg(feature = "serial")]
    #[error(transparent)]
    Serial(#[from] benchlink_serial::SerialError),

    /// Flashing or the framed session failed
    #[error(transparent)]
    Session(#[from] benchlink_core::Error),
}

/// Result type for the front end
pub type Result<T> = std::result::Result<T, CliError>;
