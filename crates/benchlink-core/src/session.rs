//! Framed session reader
//!
//! A session waits for the start marker, discarding whatever the target
//! printed while booting, then accumulates output until the stop marker.
//!
//! ```text
//!   AwaitingStart ──start line ok──▶ Streaming ──stop marker──▶ Complete
//!        │                               │
//!        └──── timeout / mismatch / ─────┴──────────────────▶ Failed
//!                   closed handle
//! ```
//!
//! Two readers implement the same contract: [`FramedReader`] drives a
//! byte-oriented [`Transport`] with discrete `read_until` calls, while
//! [`TextFramedReader`] pattern-matches over text accumulated from a polling
//! [`TextTransport`] under a run-level deadline.
//!
//! The byte reader completes on a line-initial `#` and strips only that byte.
//! The text reader also requires the `\n` after it and strips both.

use crate::error::{Error, Result};
use crate::framing::{
    decode, ends_with_stop_marker, find_terminated_stop_marker, is_start_marker, NEWLINE,
    START_BYTE, STOP_BYTE,
};
use crate::transport::{TextTransport, Transport};
use std::time::{Duration, Instant};

/// Default run-level timeout for text sessions
pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between empty polls of a text transport
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Synchronization phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Discarding boot output until the start marker
    AwaitingStart,
    /// Accumulating transcript bytes
    Streaming,
    /// Transcript returned
    Complete,
    /// Session aborted; no further I/O
    Failed,
}

impl SessionState {
    /// Whether the session can no longer perform I/O
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed)
    }
}

/// Session reader over a byte-oriented transport
pub struct FramedReader<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    state: SessionState,
    buffer: Vec<u8>,
}

impl<'a, T: Transport + ?Sized> FramedReader<'a, T> {
    /// Start a session on `transport`
    pub fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            state: SessionState::AwaitingStart,
            buffer: Vec::new(),
        }
    }

    /// Current phase
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion
    ///
    /// Returns the decoded transcript without either marker. Any error moves
    /// the session to [`SessionState::Failed`].
    pub fn read_transcript(&mut self) -> Result<String> {
        if self.state.is_terminal() {
            return Err(Error::SessionFinished);
        }

        let result = self.await_start().and_then(|()| self.stream());
        self.state = match result {
            Ok(_) => SessionState::Complete,
            Err(ref e) => {
                log::debug!("Session failed in {:?}: {}", self.state, e);
                SessionState::Failed
            }
        };
        result
    }

    fn await_start(&mut self) -> Result<()> {
        let mut byte = [0u8];
        let mut skipped = 0usize;
        loop {
            if self.transport.read(&mut byte)? == 0 {
                continue;
            }
            if byte[0] == START_BYTE {
                break;
            }
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("Discarded {} bytes before start marker", skipped);
        }

        let mut candidate = vec![START_BYTE];
        candidate.extend(self.transport.read_until(NEWLINE)?);
        log::debug!("Found start pattern: {:?}", decode(&candidate));
        if !is_start_marker(&candidate) {
            return Err(Error::ProtocolMismatch {
                candidate: decode(&candidate),
            });
        }

        self.buffer.clear();
        self.state = SessionState::Streaming;
        Ok(())
    }

    fn stream(&mut self) -> Result<String> {
        while !ends_with_stop_marker(&self.buffer) {
            let chunk = self.transport.read_until(STOP_BYTE)?;
            log::trace!("Received {} byte chunk", chunk.len());
            self.buffer.extend_from_slice(&chunk);
        }

        self.buffer.pop();
        let transcript = decode(&self.buffer);
        self.buffer = Vec::new();
        Ok(transcript)
    }
}

/// Run a byte-oriented session on `transport`
pub fn read_transcript<T: Transport + ?Sized>(transport: &mut T) -> Result<String> {
    FramedReader::new(transport).read_transcript()
}

/// Session reader over a polling text transport
pub struct TextFramedReader<'a, T: TextTransport + ?Sized> {
    transport: &'a mut T,
    state: SessionState,
    buffer: Vec<u8>,
    timeout: Duration,
    poll_interval: Duration,
    deadline: Option<Instant>,
}

impl<'a, T: TextTransport + ?Sized> TextFramedReader<'a, T> {
    /// Start a session on `transport` that must finish within `timeout`
    pub fn new(transport: &'a mut T, timeout: Duration) -> Self {
        Self {
            transport,
            state: SessionState::AwaitingStart,
            buffer: Vec::new(),
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }

    /// Set the delay between empty polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current phase
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion
    pub fn read_transcript(&mut self) -> Result<String> {
        if self.state.is_terminal() {
            return Err(Error::SessionFinished);
        }

        self.deadline = Some(Instant::now() + self.timeout);
        let result = self.await_start().and_then(|()| self.stream());
        self.state = match result {
            Ok(_) => SessionState::Complete,
            Err(ref e) => {
                log::debug!("Session failed in {:?}: {}", self.state, e);
                SessionState::Failed
            }
        };
        result
    }

    /// Append the next non-empty poll to the buffer
    fn poll_more(&mut self) -> Result<()> {
        loop {
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(Error::TransportTimeout {
                    waited: Some(self.timeout),
                });
            }
            let text = self.transport.poll()?;
            if !text.is_empty() {
                log::trace!("Polled {} bytes", text.len());
                self.buffer.extend_from_slice(text.as_bytes());
                return Ok(());
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn await_start(&mut self) -> Result<()> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == START_BYTE) {
                if pos > 0 {
                    log::debug!("Discarded {} bytes before start marker", pos);
                }
                self.buffer.drain(..pos);
                break;
            }
            if !self.buffer.is_empty() {
                log::debug!("Discarded {} bytes before start marker", self.buffer.len());
                self.buffer.clear();
            }
            self.poll_more()?;
        }

        let newline = loop {
            if let Some(nl) = self.buffer.iter().position(|&b| b == NEWLINE) {
                break nl;
            }
            self.poll_more()?;
        };

        // Whatever followed the start line in the same poll is payload
        let candidate: Vec<u8> = self.buffer.drain(..=newline).collect();
        log::debug!("Found start pattern: {:?}", decode(&candidate));
        if !is_start_marker(&candidate) {
            return Err(Error::ProtocolMismatch {
                candidate: decode(&candidate),
            });
        }

        self.state = SessionState::Streaming;
        Ok(())
    }

    fn stream(&mut self) -> Result<String> {
        let mut scanned = 0;
        loop {
            if let Some(at) = find_terminated_stop_marker(&self.buffer, scanned) {
                let trailing = self.buffer.len() - (at + 2);
                if trailing > 0 {
                    log::debug!("Ignoring {} bytes after stop marker", trailing);
                }
                self.buffer.truncate(at);
                let transcript = decode(&self.buffer);
                self.buffer = Vec::new();
                return Ok(transcript);
            }
            // The last byte may be a `#` still waiting for its newline
            scanned = self.buffer.len().saturating_sub(1);
            self.poll_more()?;
        }
    }
}

/// Run a text session on `transport` with a run-level `timeout`
pub fn read_text_transcript<T: TextTransport + ?Sized>(
    transport: &mut T,
    timeout: Duration,
) -> Result<String> {
    TextFramedReader::new(transport, timeout).read_transcript()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTextTransport, MockTransport};

    #[test]
    fn test_noise_then_transcript() {
        let mut t = MockTransport::new()
            .chunk(b"noise==========\n")
            .chunk(b"bench: 1234 cycles\n#");
        let transcript = read_transcript(&mut t).unwrap();
        assert_eq!(transcript, "bench: 1234 cycles\n");
    }

    #[test]
    fn test_bytes_split_across_reads() {
        let mut t = MockTransport::new()
            .chunk(b"boot")
            .chunk(b"loader ==")
            .chunk(b"==")
            .chunk(b"==\nkeygen: ")
            .chunk(b"42\nsign: 7")
            .chunk(b"\n#");
        assert_eq!(read_transcript(&mut t).unwrap(), "keygen: 42\nsign: 7\n");
    }

    #[test]
    fn test_interior_markers_do_not_terminate() {
        let mut t = MockTransport::new().chunk(b"====\na=b#c\n#");
        assert_eq!(read_transcript(&mut t).unwrap(), "a=b#c\n");
    }

    #[test]
    fn test_empty_transcript() {
        let mut t = MockTransport::new().chunk(b"=====\n#");
        assert_eq!(read_transcript(&mut t).unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut t = MockTransport::new().chunk(b"====\nx\xfe\n#");
        assert_eq!(read_transcript(&mut t).unwrap(), "x\u{fffd}\n");
    }

    #[test]
    fn test_timeout_before_start() {
        let mut t = MockTransport::new().chunk(b"booting...").timeout();
        let mut reader = FramedReader::new(&mut t);
        let err = reader.read_transcript().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(reader.state(), SessionState::Failed);
    }

    #[test]
    fn test_short_start_is_mismatch() {
        let mut t = MockTransport::new().chunk(b"==\nbench\n#");
        let err = read_transcript(&mut t).unwrap_err();
        assert!(matches!(err, Error::ProtocolMismatch { ref candidate } if candidate == "==\n"));
    }

    #[test]
    fn test_timeout_while_streaming() {
        let mut t = MockTransport::new().chunk(b"====\npartial").timeout();
        let mut reader = FramedReader::new(&mut t);
        assert!(reader.read_transcript().unwrap_err().is_timeout());
        assert_eq!(reader.state(), SessionState::Failed);
    }

    #[test]
    fn test_no_io_after_completion() {
        let mut t = MockTransport::new().chunk(b"====\nok\n#").chunk(b"====\nagain\n#");
        let mut reader = FramedReader::new(&mut t);
        assert_eq!(reader.read_transcript().unwrap(), "ok\n");
        assert_eq!(reader.state(), SessionState::Complete);
        assert!(matches!(
            reader.read_transcript(),
            Err(Error::SessionFinished)
        ));
        assert_eq!(t.remaining(), 1);
    }

    #[test]
    fn test_closed_transport_fails_session() {
        let mut t = MockTransport::new().chunk(b"====\n");
        t.close().unwrap();
        let err = read_transcript(&mut t).unwrap_err();
        assert!(matches!(err, Error::TransportUnavailable(_)));
    }

    fn text_reader(t: &mut MockTextTransport) -> TextFramedReader<'_, MockTextTransport> {
        TextFramedReader::new(t, Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn test_text_session() {
        let mut t = MockTextTransport::new()
            .text("reset\r\n")
            .text("")
            .text("===")
            .text("==\nbench: 1234 cycles\n")
            .text("#")
            .text("\ntrailing");
        let transcript = text_reader(&mut t).read_transcript().unwrap();
        assert_eq!(transcript, "bench: 1234 cycles\n");
    }

    #[test]
    fn test_text_payload_in_start_poll_is_kept() {
        let mut t = MockTextTransport::new().text("xx=====\nfirst\n#\n");
        assert_eq!(text_reader(&mut t).read_transcript().unwrap(), "first\n");
    }

    #[test]
    fn test_text_interior_markers() {
        let mut t = MockTextTransport::new().text("====\na=b#c\n#y\n").text("#\n");
        assert_eq!(
            text_reader(&mut t).read_transcript().unwrap(),
            "a=b#c\n#y\n"
        );
    }

    #[test]
    fn test_text_short_start_is_mismatch() {
        let mut t = MockTextTransport::new().text("==\n");
        let mut reader = text_reader(&mut t);
        assert!(matches!(
            reader.read_transcript(),
            Err(Error::ProtocolMismatch { .. })
        ));
        assert_eq!(reader.state(), SessionState::Failed);
    }

    #[test]
    fn test_text_run_timeout() {
        let mut t = MockTextTransport::new().text("====\nno end in sight");
        let mut reader = text_reader(&mut t);
        assert!(reader.read_transcript().unwrap_err().is_timeout());
        assert_eq!(reader.state(), SessionState::Failed);
    }

    #[test]
    fn test_text_timeout_without_start() {
        let mut t = MockTextTransport::new();
        assert!(text_reader(&mut t).read_transcript().unwrap_err().is_timeout());
    }
}
