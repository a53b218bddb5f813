//! Scripted transports and flashers for tests

use crate::error::{Error, Result};
use crate::flasher::Flasher;
use crate::transport::{TextTransport, Transport};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

enum Step {
    Data(VecDeque<u8>),
    Timeout,
}

/// Byte transport that replays a script of chunks and timeouts
///
/// Each `read` serves bytes from the front chunk only, so chunk boundaries
/// behave like separate arrivals. An exhausted script times out.
#[derive(Default)]
pub struct MockTransport {
    script: VecDeque<Step>,
    pub reads: usize,
    pub resets: usize,
    pub closes: usize,
    closed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk(mut self, data: &[u8]) -> Self {
        self.script.push_back(Step::Data(data.iter().copied().collect()));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(Step::Timeout);
        self
    }

    /// Script steps not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::TransportUnavailable("closed".into()));
        }
        self.reads += 1;

        let timeout = Error::TransportTimeout {
            waited: Some(Duration::from_millis(1)),
        };
        match self.script.front_mut() {
            None => Err(timeout),
            Some(Step::Timeout) => {
                self.script.pop_front();
                Err(timeout)
            }
            Some(Step::Data(data)) => {
                let n = buf.len().min(data.len());
                for (slot, byte) in buf.iter_mut().zip(data.drain(..n)) {
                    *slot = byte;
                }
                if data.is_empty() {
                    self.script.pop_front();
                }
                Ok(n)
            }
        }
    }

    fn reset_input_buffer(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closes += 1;
            self.closed = true;
        }
        Ok(())
    }
}

/// Text transport that replays a script of polls, then returns nothing
#[derive(Default)]
pub struct MockTextTransport {
    polls: VecDeque<String>,
    closed: bool,
}

impl MockTextTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.polls.push_back(text.to_string());
        self
    }
}

impl TextTransport for MockTextTransport {
    fn poll(&mut self) -> Result<String> {
        if self.closed {
            return Err(Error::TransportUnavailable("closed".into()));
        }
        Ok(self.polls.pop_front().unwrap_or_default())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Flasher that records binaries and optionally fails
#[derive(Default)]
pub struct MockFlasher {
    pub flashed: Vec<PathBuf>,
    pub fail: bool,
    pub closes: usize,
}

impl MockFlasher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Flasher for MockFlasher {
    fn flash(&mut self, binary: &Path) -> Result<()> {
        self.flashed.push(binary.to_path_buf());
        if self.fail {
            return Err(Error::flash_failure(binary, "exit status: 1"));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closes += 1;
        Ok(())
    }
}
