//! Platform composition
//!
//! A platform ties a flasher and a transport together behind one
//! `run(binary) -> transcript` call. Platforms own their handles for their
//! whole lifetime and release them in [`Platform::close`] or on drop.

use crate::error::{Error, Result};
use crate::flasher::Flasher;
use crate::session::FramedReader;
use crate::transport::Transport;
use std::path::Path;

/// A benchmark target that can run a binary and capture its output
pub trait Platform {
    /// Short platform name for logs
    fn name(&self) -> &str;

    /// Flash `binary`, then capture the transcript it prints
    fn run(&mut self, binary: &Path) -> Result<String>;

    /// Release all handles. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

impl<P: Platform + ?Sized> Platform for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&mut self, binary: &Path) -> Result<String> {
        (**self).run(binary)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Platform built from an independent flasher and byte transport
///
/// Used for boards that are programmed by one tool and print over a separate
/// channel (e.g. an ST-LINK plus its virtual COM port).
pub struct FramedPlatform<F: Flasher, T: Transport> {
    name: String,
    flasher: F,
    transport: T,
    closed: bool,
}

impl<F: Flasher, T: Transport> FramedPlatform<F, T> {
    /// Create a platform named `name`
    pub fn new(name: impl Into<String>, flasher: F, transport: T) -> Self {
        Self {
            name: name.into(),
            flasher,
            transport,
            closed: false,
        }
    }

    /// Access the flasher
    pub fn flasher(&self) -> &F {
        &self.flasher
    }

    /// Access the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<F: Flasher, T: Transport> Platform for FramedPlatform<F, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, binary: &Path) -> Result<String> {
        if self.closed {
            return Err(Error::TransportUnavailable(format!("{} is closed", self.name)));
        }
        self.flasher.flash(binary)?;
        self.transport.reset_input_buffer()?;
        FramedReader::new(&mut self.transport).read_transcript()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::debug!("{}: closing", self.name);
        // Release both handles even if the first close fails
        let transport = self.transport.close();
        let flasher = self.flasher.close();
        transport.and(flasher)
    }
}

impl<F: Flasher, T: Transport> Drop for FramedPlatform<F, T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{}: error while closing: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFlasher, MockTransport};
    use std::path::PathBuf;

    #[test]
    fn test_run_flashes_resets_and_reads() {
        let transport = MockTransport::new().chunk(b"noise==========\nbench: 1234 cycles\n#");
        let mut platform = FramedPlatform::new("test", MockFlasher::default(), transport);

        let transcript = platform.run(Path::new("bin/test.bin")).unwrap();
        assert_eq!(transcript, "bench: 1234 cycles\n");
        assert_eq!(platform.flasher().flashed, vec![PathBuf::from("bin/test.bin")]);
        assert_eq!(platform.transport().resets, 1);
    }

    #[test]
    fn test_flash_failure_skips_transport() {
        let transport = MockTransport::new().chunk(b"====\nstale\n#");
        let mut platform = FramedPlatform::new("test", MockFlasher::failing(), transport);

        let err = platform.run(Path::new("bad.bin")).unwrap_err();
        assert!(matches!(err, Error::FlashFailure { .. }));
        assert_eq!(platform.transport().reads, 0);
        assert_eq!(platform.transport().resets, 0);
    }

    #[test]
    fn test_timeout_then_close_releases_transport() {
        let transport = MockTransport::new().timeout();
        let mut platform = FramedPlatform::new("test", MockFlasher::default(), transport);

        assert!(platform.run(Path::new("silent.bin")).unwrap_err().is_timeout());
        platform.close().unwrap();
        assert!(platform.transport().is_closed());
        assert_eq!(platform.flasher().closes, 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut platform =
            FramedPlatform::new("test", MockFlasher::default(), MockTransport::new());
        platform.close().unwrap();
        platform.close().unwrap();
        assert_eq!(platform.transport().closes, 1);
        assert_eq!(platform.flasher().closes, 1);
        assert!(matches!(
            platform.run(Path::new("late.bin")),
            Err(Error::TransportUnavailable(_))
        ));
        assert!(platform.flasher().flashed.is_empty());
    }

    #[test]
    fn test_consecutive_runs() {
        let transport = MockTransport::new()
            .chunk(b"====\nfirst\n#")
            .chunk(b"\r\nboot\r\n=====\nsecond\n#");
        let mut platform = FramedPlatform::new("test", MockFlasher::default(), transport);

        assert_eq!(platform.run(Path::new("a.bin")).unwrap(), "first\n");
        assert_eq!(platform.run(Path::new("b.bin")).unwrap(), "second\n");
        assert_eq!(platform.flasher().flashed.len(), 2);
    }
}
