//! benchlink-scope - Targets on power-analysis capture boards
//!
//! A capture board (e.g. a ChipWhisperer with a CW308 UFO target) both
//! programs the target through its serial bootloader and relays the target's
//! UART. The vendor library only hands out decoded text, so this crate uses
//! the character-oriented session reader.
//!
//! The vendor interface is abstracted as [`ScopeTarget`] and
//! [`ScopeProgrammer`]. The [`sim`] module provides an in-memory board
//! implementing both, useful for testing without hardware.
//!
//! # Example
//!
//! ```
//! use benchlink_core::Platform;
//! use benchlink_scope::sim::SimBoard;
//! use benchlink_scope::ScopePlatform;
//!
//! let board = SimBoard::new();
//! let mut platform = ScopePlatform::new("cw-sim", board.programmer(), board.target());
//! platform.close()?;
//! # Ok::<(), benchlink_core::Error>(())
//! ```

pub mod device;
pub mod error;
pub mod flasher;
pub mod platform;
pub mod sim;
pub mod transport;

pub use device::{NrstLevel, ScopeProgrammer, ScopeTarget};
pub use error::{ProgrammerStep, Result, ScopeError};
pub use flasher::ScopeFlasher;
pub use platform::ScopePlatform;
pub use transport::{ScopeTransport, RESET_HOLD};
