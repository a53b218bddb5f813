//! Error types for scope targets and programmers

use std::fmt;
use thiserror::Error;

/// Steps of the programmer sequence, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammerStep {
    /// Connect to the bootloader
    Open,
    /// Identify the target microcontroller
    Find,
    /// Mass-erase flash
    Erase,
    /// Write the image
    Program,
    /// Disconnect from the bootloader
    Close,
}

impl fmt::Display for ProgrammerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProgrammerStep::Open => "open",
            ProgrammerStep::Find => "find",
            ProgrammerStep::Erase => "erase",
            ProgrammerStep::Program => "program",
            ProgrammerStep::Close => "close",
        };
        f.write_str(name)
    }
}

/// Scope errors
#[derive(Debug, Error)]
pub enum ScopeError {
    /// A programmer step was rejected by the device
    #[error("Programmer {step} failed: {reason}")]
    Step {
        step: ProgrammerStep,
        reason: String,
    },

    /// Programmer used without a successful open
    #[error("Programmer is not open")]
    NotOpen,

    /// Target used after close
    #[error("Scope target is closed")]
    TargetClosed,

    /// Target-side communication error
    #[error("Scope target error: {0}")]
    Target(String),

    /// I/O error (e.g. reading the image)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scope operations
pub type Result<T> = core::result::Result<T, ScopeError>;

impl From<ScopeError> for benchlink_core::Error {
    fn from(e: ScopeError) -> Self {
        match e {
            ScopeError::Io(io) => io.into(),
            other => benchlink_core::Error::TransportUnavailable(other.to_string()),
        }
    }
}
