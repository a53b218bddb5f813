//! Capture-board platform

use crate::device::{ScopeProgrammer, ScopeTarget};
use crate::flasher::ScopeFlasher;
use crate::transport::{ScopeTransport, RESET_HOLD};
use benchlink_core::session::DEFAULT_TEXT_TIMEOUT;
use benchlink_core::{Error, Flasher, Platform, Result, TextFramedReader, TextTransport};
use std::path::Path;
use std::time::Duration;

/// Platform for a target mounted on a capture board
///
/// A run programs the image, flushes stale target output, pulses nRST and
/// then reads the framed transcript. Target reads never block, so the whole
/// session is bounded by one run-level timeout.
pub struct ScopePlatform<P: ScopeProgrammer, T: ScopeTarget> {
    name: String,
    flasher: ScopeFlasher<P>,
    transport: ScopeTransport<T>,
    timeout: Duration,
    reset_hold: Duration,
    poll_interval: Option<Duration>,
    closed: bool,
}

impl<P: ScopeProgrammer, T: ScopeTarget> ScopePlatform<P, T> {
    /// Create a platform from a programmer and target sharing one scope
    pub fn new(name: impl Into<String>, programmer: P, target: T) -> Self {
        Self {
            name: name.into(),
            flasher: ScopeFlasher::new(programmer),
            transport: ScopeTransport::new(target),
            timeout: DEFAULT_TEXT_TIMEOUT,
            reset_hold: RESET_HOLD,
            poll_interval: None,
            closed: false,
        }
    }

    /// Bound the whole session by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Hold each nRST level for `hold`
    pub fn with_reset_hold(mut self, hold: Duration) -> Self {
        self.reset_hold = hold;
        self
    }

    /// Delay between empty target reads
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Access the target transport
    pub fn transport(&self) -> &ScopeTransport<T> {
        &self.transport
    }
}

impl<P: ScopeProgrammer, T: ScopeTarget> Platform for ScopePlatform<P, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, binary: &Path) -> Result<String> {
        if self.closed {
            return Err(Error::TransportUnavailable(format!("{} is closed", self.name)));
        }
        self.flasher.flash(binary)?;
        self.transport.reset_input_buffer()?;
        self.transport.reset_target(self.reset_hold)?;

        let mut reader = TextFramedReader::new(&mut self.transport, self.timeout);
        if let Some(interval) = self.poll_interval {
            reader = reader.with_poll_interval(interval);
        }
        reader.read_transcript()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::debug!("{}: closing", self.name);
        let transport = self.transport.close();
        let flasher = self.flasher.close();
        transport.and(flasher)
    }
}

impl<P: ScopeProgrammer, T: ScopeTarget> Drop for ScopePlatform<P, T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{}: error while closing: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NrstLevel;
    use crate::error::ProgrammerStep;
    use crate::sim::{SimBoard, SimEvent, SimProgrammer, SimTarget};
    use std::io::Write;

    fn image(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    fn platform(board: &SimBoard) -> ScopePlatform<SimProgrammer, SimTarget> {
        ScopePlatform::new("cw-sim", board.programmer(), board.target())
            .with_timeout(Duration::from_secs(2))
            .with_reset_hold(Duration::ZERO)
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_run_captures_transcript() {
        let bin = image(b"\0\0boot\r\n=====\nsign: 42 cycles\nverify: 7 cycles\n#\n");
        let board = SimBoard::new().with_chunk(5);
        let mut platform = platform(&board);

        let transcript = platform.run(bin.path()).unwrap();
        assert_eq!(transcript, "sign: 42 cycles\nverify: 7 cycles\n");
    }

    #[test]
    fn test_stale_output_is_flushed() {
        let bin = image(b"====\nfresh\n#\n");
        let board = SimBoard::new();
        board.emit("====\nstale\n#\n");
        let mut platform = platform(&board);

        assert_eq!(platform.run(bin.path()).unwrap(), "fresh\n");
    }

    #[test]
    fn test_run_order() {
        let bin = image(b"====\nx\n#\n");
        let board = SimBoard::new();
        let mut platform = platform(&board);
        platform.run(bin.path()).unwrap();

        let events = board.events();
        let close = events
            .iter()
            .position(|e| *e == SimEvent::Programmer(ProgrammerStep::Close))
            .unwrap();
        assert_eq!(
            events[close + 1..].to_vec(),
            vec![
                SimEvent::Flush,
                SimEvent::Nrst(NrstLevel::Low),
                SimEvent::Nrst(NrstLevel::High),
            ]
        );
    }

    #[test]
    fn test_flash_failure_skips_target() {
        let bin = image(b"====\nx\n#\n");
        let board = SimBoard::new().failing_at(ProgrammerStep::Find);
        let mut platform = platform(&board);

        assert!(matches!(
            platform.run(bin.path()),
            Err(Error::FlashFailure { .. })
        ));
        assert!(!board
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::Flush | SimEvent::Nrst(_))));
    }

    #[test]
    fn test_missing_stop_marker_times_out() {
        let bin = image(b"====\nno end in sight\n");
        let board = SimBoard::new();
        let mut platform = platform(&board).with_timeout(Duration::from_millis(100));

        assert!(platform.run(bin.path()).unwrap_err().is_timeout());
        platform.close().unwrap();
        assert!(board.is_target_closed());
    }

    #[test]
    fn test_hash_without_newline_is_not_the_end() {
        let bin = image(b"====\nkey#1: ok\n#");
        let board = SimBoard::new();
        let mut platform = platform(&board).with_timeout(Duration::from_millis(100));

        assert!(platform.run(bin.path()).unwrap_err().is_timeout());
    }

    #[test]
    fn test_short_start_line() {
        let bin = image(b"===\nx\n#\n");
        let board = SimBoard::new();
        let mut platform = platform(&board);

        assert!(matches!(
            platform.run(bin.path()),
            Err(Error::ProtocolMismatch { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let board = SimBoard::new();
        let mut platform = platform(&board);
        platform.close().unwrap();
        platform.close().unwrap();
        assert!(matches!(
            platform.run(Path::new("late.hex")),
            Err(Error::TransportUnavailable(_))
        ));
    }

    #[test]
    fn test_drop_closes_target() {
        let board = SimBoard::new();
        drop(platform(&board));
        assert!(board.is_target_closed());
    }
}
