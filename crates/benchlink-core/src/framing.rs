//! Wire framing rules
//!
//! The target brackets its output with two markers:
//!
//! ```text
//! <boot noise>=====\n<transcript>#[\n]
//! ```
//!
//! The start marker is four or more `=` immediately followed by a newline.
//! The stop marker is a `#` at the beginning of a line. A `#` or `=` inside a
//! line of benchmark output is ordinary payload.

/// First byte of the start marker
pub const START_BYTE: u8 = b'=';

/// Byte that terminates the start marker line
pub const NEWLINE: u8 = b'\n';

/// Stop marker byte
pub const STOP_BYTE: u8 = b'#';

/// Minimum run of `=` that forms a start marker
pub const MIN_START_RUN: usize = 4;

/// Check whether `candidate` is a valid start line
///
/// Matches "anything, then at least [`MIN_START_RUN`] `=`, then `\n`" against
/// the whole candidate, so the newline must be its last byte.
pub fn is_start_marker(candidate: &[u8]) -> bool {
    let Some((&last, body)) = candidate.split_last() else {
        return false;
    };
    if last != NEWLINE {
        return false;
    }
    let run = body.iter().rev().take_while(|&&b| b == START_BYTE).count();
    run >= MIN_START_RUN
}

/// Whether the byte at `i` begins a line
fn at_line_start(buf: &[u8], i: usize) -> bool {
    i == 0 || buf[i - 1] == NEWLINE
}

/// Locate the stop marker in an accumulated buffer
///
/// Returns the offset of the first `#` that sits at the start of a line
/// (offset 0, or directly after `\n`). The transcript is everything before
/// that offset.
pub fn find_stop_marker(buf: &[u8]) -> Option<usize> {
    (0..buf.len()).find(|&i| buf[i] == STOP_BYTE && at_line_start(buf, i))
}

/// Whether the buffer ends in a stop marker
///
/// Byte-oriented readers append chunks that end at the first `#`, so only the
/// final byte can complete the frame.
pub fn ends_with_stop_marker(buf: &[u8]) -> bool {
    match buf.last() {
        Some(&STOP_BYTE) => at_line_start(buf, buf.len() - 1),
        _ => false,
    }
}

/// Locate a stop marker that is also followed by its newline
///
/// Used by character-oriented transports where the firmware always sends
/// `#\n`. Scanning starts at `from` so callers can skip data they already
/// checked; line starts are still judged against the whole buffer. Returns the
/// offset of the `#`.
pub fn find_terminated_stop_marker(buf: &[u8], from: usize) -> Option<usize> {
    (from..buf.len()).find(|&i| {
        buf[i] == STOP_BYTE && at_line_start(buf, i) && buf.get(i + 1) == Some(&NEWLINE)
    })
}

/// Decode captured bytes, replacing invalid sequences
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
