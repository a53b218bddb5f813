//! Programming through the scope's bootloader programmer

use crate::device::ScopeProgrammer;
use benchlink_core::{Error, Flasher, Result};
use std::path::Path;

/// Flasher running open, find, erase, program and close on a programmer
///
/// Images are written without read-back verification. If any step fails the
/// programmer is still closed before the failure is returned.
pub struct ScopeFlasher<P: ScopeProgrammer> {
    programmer: P,
}

impl<P: ScopeProgrammer> ScopeFlasher<P> {
    /// Wrap a programmer
    pub fn new(programmer: P) -> Self {
        Self { programmer }
    }

    /// Access the programmer
    pub fn programmer(&self) -> &P {
        &self.programmer
    }

    fn program_image(&mut self, binary: &Path) -> crate::Result<()> {
        self.programmer.open()?;
        self.programmer.find()?;
        self.programmer.erase()?;
        self.programmer.program(binary, false)?;
        Ok(())
    }
}

impl<P: ScopeProgrammer> Flasher for ScopeFlasher<P> {
    fn flash(&mut self, binary: &Path) -> Result<()> {
        log::info!("Programming {} through the scope", binary.display());

        if let Err(e) = self.program_image(binary) {
            if let Err(close_err) = self.programmer.close() {
                log::debug!("Closing programmer after failure: {}", close_err);
            }
            return Err(Error::flash_failure(binary, e.to_string()));
        }

        self.programmer
            .close()
            .map_err(|e| Error::flash_failure(binary, e.to_string()))
    }
}
