//! benchlink-tools - Flashing through external programmer tools
//!
//! Each tool is described by a fixed argument template in which the
//! placeholder `{binary}` is replaced with the image path. The tool's exit
//! status is the only success signal; a non-zero status fails the run and is
//! never retried.
//!
//! # Supported tools
//!
//! - `st-flash` (stlink-tools): `st-flash --reset write <bin> 0x8000000`
//! - `openocd`: `openocd -f <script> -c "program <bin> verify reset exit"`

use benchlink_core::{expand_args, Error, Flasher, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

pub use benchlink_core::BINARY_PLACEHOLDER;

/// Flash base address of STM32 parts
pub const STM32_FLASH_BASE: &str = "0x8000000";

/// Flasher that runs an external tool and checks its exit status
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: OsString,
    args: Vec<String>,
}

impl ExternalTool {
    /// Tool invoking `program` with no arguments
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument template
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `st-flash --reset write <bin> 0x8000000`
    pub fn st_flash() -> Self {
        Self::new("st-flash")
            .arg("--reset")
            .arg("write")
            .arg(BINARY_PLACEHOLDER)
            .arg(STM32_FLASH_BASE)
    }

    /// `openocd -f <script> -c "program <bin> verify reset exit"`
    pub fn openocd(script: impl Into<String>) -> Self {
        Self::new("openocd")
            .arg("-f")
            .arg(script)
            .arg("-c")
            .arg(format!("program {} verify reset exit", BINARY_PLACEHOLDER))
    }

    /// Program name
    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Arguments with `binary` substituted in
    pub fn args_for(&self, binary: &Path) -> Vec<OsString> {
        expand_args(&self.args, binary)
    }
}

impl Flasher for ExternalTool {
    fn flash(&mut self, binary: &Path) -> Result<()> {
        let program = self.program.to_string_lossy().into_owned();
        log::info!("Flashing {} with {}", binary.display(), program);

        let args = self.args_for(binary);
        log::debug!("Running {} {:?}", program, args);

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::flash_failure(binary, format!("failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(Error::flash_failure(
                binary,
                format!("{} exited with {}", program, status),
            ));
        }

        log::debug!("{} finished", program);
        Ok(())
    }
}
