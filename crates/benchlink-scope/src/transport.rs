//! Scope target as a text transport

use crate::device::{NrstLevel, ScopeTarget};
use crate::error::ScopeError;
use benchlink_core::{Result, TextTransport};
use std::time::Duration;

/// How long each nRST level is held during a reset pulse
pub const RESET_HOLD: Duration = Duration::from_millis(50);

/// Text transport over a [`ScopeTarget`]
pub struct ScopeTransport<T: ScopeTarget> {
    target: T,
    closed: bool,
}

impl<T: ScopeTarget> ScopeTransport<T> {
    /// Wrap an open target
    pub fn new(target: T) -> Self {
        Self {
            target,
            closed: false,
        }
    }

    /// Access the target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Pulse nRST: low for `hold`, then high for `hold`
    pub fn reset_target(&mut self, hold: Duration) -> Result<()> {
        self.check_open()?;
        log::debug!("Pulsing nRST");
        self.target.set_nrst(NrstLevel::Low)?;
        std::thread::sleep(hold);
        self.target.set_nrst(NrstLevel::High)?;
        std::thread::sleep(hold);
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(ScopeError::TargetClosed.into());
        }
        Ok(())
    }
}

impl<T: ScopeTarget> TextTransport for ScopeTransport<T> {
    fn poll(&mut self) -> Result<String> {
        self.check_open()?;
        Ok(self.target.read()?)
    }

    fn reset_input_buffer(&mut self) -> Result<()> {
        self.check_open()?;
        Ok(self.target.flush()?)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::debug!("Closing scope target");
        Ok(self.target.close()?)
    }
}

impl<T: ScopeTarget> Drop for ScopeTransport<T> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
