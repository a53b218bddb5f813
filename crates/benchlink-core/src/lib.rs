//! benchlink-core - Framed device sessions for embedded benchmarks
//!
//! This crate captures the text a benchmark binary prints after it has been
//! loaded onto a target. The target's output is bracketed by a start line of
//! `=` characters and a closing `#`; everything before the start line is boot
//! noise and is dropped.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Platform::run(binary)                                    │
//! │   1. Flasher::flash(binary)                              │
//! │   2. Transport::reset_input_buffer()                     │
//! │   3. FramedReader / TextFramedReader -> transcript       │
//! └──────────────────────────────────────────────────────────┘
//!            │                              │
//!            ▼                              ▼
//! ┌──────────────────────┐     ┌──────────────────────────────┐
//! │ Flasher              │     │ Transport / TextTransport    │
//! │ - st-flash, openocd  │     │ - serial port                │
//! │ - scope programmer   │     │ - emulator stdout pipe       │
//! │ - emulator spawn     │     │ - scope target (polled text) │
//! └──────────────────────┘     └──────────────────────────────┘
//! ```
//!
//! Concrete transports and flashers live in the `benchlink-serial`,
//! `benchlink-tools`, `benchlink-qemu` and `benchlink-scope` crates.
//!
//! # Example
//!
//! ```ignore
//! use benchlink_core::{FramedPlatform, Platform};
//!
//! let mut platform = FramedPlatform::new("stm32f4discovery", flasher, transport);
//! let transcript = platform.run(Path::new("bin/crypto_kem_kyber768_m4_speed.bin"))?;
//! print!("{}", transcript);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod flasher;
pub mod framing;
pub mod platform;
pub mod session;
pub mod transport;

#[cfg(test)]
#[allow(missing_docs)]
mod mock;

pub use error::{Error, Result};
pub use flasher::{expand_args, Flasher, NoFlash, BINARY_PLACEHOLDER};
pub use platform::{FramedPlatform, Platform};
pub use session::{
    read_text_transcript, read_transcript, FramedReader, SessionState, TextFramedReader,
};
pub use transport::{TextTransport, Transport};
