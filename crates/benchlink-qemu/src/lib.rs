//! benchlink-qemu - Emulated targets
//!
//! Runs benchmark binaries in `qemu-system-arm` instead of on hardware. The
//! binary is the emulator's boot image, and the emulated UART is the
//! emulator's stdout, read through a pipe with `poll(2)` so every read is
//! bounded by a timeout.
//!
//! # Example
//!
//! ```no_run
//! use benchlink_core::Platform;
//! use benchlink_qemu::QemuPlatform;
//! use std::path::Path;
//!
//! let mut platform = QemuPlatform::new("mps2-an386");
//! let transcript = platform.run(Path::new("elf/crypto_sign_dilithium2_m4_speed.elf"))?;
//! print!("{}", transcript);
//! # Ok::<(), benchlink_core::Error>(())
//! ```

#![cfg(unix)]

pub mod emulator;
pub mod error;
pub mod process;

pub use emulator::{Emulator, EmulatorConfig, QemuPlatform, DEFAULT_MACHINE};
pub use error::{QemuError, Result};
pub use process::ProcessTransport;
