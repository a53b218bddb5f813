//! benchlink-serial - Serial port transport
//!
//! Development boards such as the STM32F4 Discovery or Nucleo-L476RG expose
//! the target UART as a USB CDC-ACM device next to their ST-LINK. This crate
//! wraps that port as a byte [`Transport`](benchlink_core::Transport).
//!
//! # Example
//!
//! ```no_run
//! use benchlink_serial::{SerialConfig, SerialTransport};
//! use std::time::Duration;
//!
//! let config = SerialConfig::new("/dev/ttyACM0")
//!     .with_baud(38400)
//!     .with_timeout(Duration::from_secs(60));
//! let mut transport = SerialTransport::open(&config)?;
//! let transcript = benchlink_core::read_transcript(&mut transport)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod transport;

pub use error::{Result, SerialError};
pub use transport::{SerialConfig, SerialTransport, DEFAULT_BAUD, DEFAULT_TIMEOUT};
