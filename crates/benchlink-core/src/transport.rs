//! Transport abstraction for target output
//!
//! Targets print their benchmark output over a channel that is either
//! byte-oriented (serial port, emulator stdout pipe) or only hands out decoded
//! text (scope target interfaces). The two shapes get separate traits since
//! their read primitives have nothing in common.

use crate::error::Result;

/// Byte-oriented receive channel
pub trait Transport {
    /// Read at least one and at most `buf.len()` bytes
    ///
    /// Blocks until data is available. Returns
    /// [`Error::TransportTimeout`](crate::Error::TransportTimeout) if nothing
    /// arrived within the transport's configured window.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read until `delimiter` has been received
    ///
    /// The returned bytes include the delimiter. A timeout while waiting for
    /// further bytes is returned as an error; bytes read before it are
    /// dropped along with the session.
    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut byte = [0u8];
        loop {
            let n = self.read(&mut byte)?;
            if n == 0 {
                continue;
            }
            out.push(byte[0]);
            if byte[0] == delimiter {
                return Ok(out);
            }
        }
    }

    /// Discard bytes received before this call
    ///
    /// No-op for channels without an input queue.
    fn reset_input_buffer(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying handle
    ///
    /// Must be idempotent. Reads after `close` fail with
    /// [`Error::TransportUnavailable`](crate::Error::TransportUnavailable).
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        (**self).read_until(delimiter)
    }

    fn reset_input_buffer(&mut self) -> Result<()> {
        (**self).reset_input_buffer()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Character-oriented receive channel
///
/// Reads are non-blocking polls that return whatever text the target has
/// buffered, possibly nothing. There is no timeout at this level; readers
/// enforce a run-level deadline instead.
pub trait TextTransport {
    /// Poll for pending text
    fn poll(&mut self) -> Result<String>;

    /// Discard text received before this call
    fn reset_input_buffer(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying handle (idempotent)
    fn close(&mut self) -> Result<()>;
}
