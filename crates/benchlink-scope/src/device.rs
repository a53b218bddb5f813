//! Vendor device interfaces
//!
//! A capture board exposes two things to the session layer: the target's
//! UART, which is read as decoded text, and a serial bootloader programmer.
//! Both are reached through the scope's own connection, so implementations
//! usually share one handle.

use crate::error::Result;
use std::path::Path;

/// Level driven on the target's nRST line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NrstLevel {
    /// Hold the target in reset
    Low,
    /// Release reset
    High,
}

/// Target-side UART and control lines of a capture board
pub trait ScopeTarget {
    /// Return whatever text the target has sent since the last read
    ///
    /// Never blocks; an empty string means nothing arrived.
    fn read(&mut self) -> Result<String>;

    /// Drop any text buffered on the scope side
    fn flush(&mut self) -> Result<()>;

    /// Drive the nRST line
    fn set_nrst(&mut self, level: NrstLevel) -> Result<()>;

    /// Release the target connection
    fn close(&mut self) -> Result<()>;
}

/// Bootloader programmer reached through the scope
pub trait ScopeProgrammer {
    /// Enter the bootloader
    fn open(&mut self) -> Result<()>;

    /// Identify the connected microcontroller
    fn find(&mut self) -> Result<()>;

    /// Erase the target flash
    fn erase(&mut self) -> Result<()>;

    /// Write `image` to flash, optionally reading it back
    fn program(&mut self, image: &Path, verify: bool) -> Result<()>;

    /// Leave the bootloader
    fn close(&mut self) -> Result<()>;
}

impl<T: ScopeTarget + ?Sized> ScopeTarget for Box<T> {
    fn read(&mut self) -> Result<String> {
        (**self).read()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn set_nrst(&mut self, level: NrstLevel) -> Result<()> {
        (**self).set_nrst(level)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<P: ScopeProgrammer + ?Sized> ScopeProgrammer for Box<P> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn find(&mut self) -> Result<()> {
        (**self).find()
    }

    fn erase(&mut self) -> Result<()> {
        (**self).erase()
    }

    fn program(&mut self, image: &Path, verify: bool) -> Result<()> {
        (**self).program(image, verify)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
