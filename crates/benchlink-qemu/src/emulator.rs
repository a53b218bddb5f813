//! Emulator launch and the QEMU platform
//!
//! There is no separate flashing step for an emulated target: the binary is
//! handed to the emulator as its boot image when the process is spawned, and
//! the process's stdout carries the target's UART output.

use crate::error::{QemuError, Result};
use crate::process::ProcessTransport;
use benchlink_core::{expand_args, read_transcript, Flasher, Platform, Transport};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

pub use benchlink_core::BINARY_PLACEHOLDER;

/// Default board emulated for Cortex-M4 targets
pub const DEFAULT_MACHINE: &str = "mps2-an386";

/// Default per-read timeout for emulator output
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How to start the emulator
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Emulator executable
    pub program: OsString,
    /// Argument templates; `{binary}` is replaced by the boot image path
    pub args: Vec<String>,
    /// Maximum wait for any single read of emulator output
    pub timeout: Duration,
}

impl EmulatorConfig {
    /// Emulator invoking `program` with no arguments
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// `qemu-system-arm -cpu cortex-m4 -M <machine> -nographic -kernel <bin>`
    pub fn qemu(machine: &str) -> Self {
        Self::new("qemu-system-arm")
            .arg("-cpu")
            .arg("cortex-m4")
            .arg("-M")
            .arg(machine)
            .arg("-nographic")
            .arg("-kernel")
            .arg(BINARY_PLACEHOLDER)
    }

    /// Append an argument template
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the per-read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the command that boots `binary`
    pub fn command(&self, binary: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(expand_args(&self.args, binary));
        command
    }
}

/// Emulator process manager
///
/// Flashing spawns a fresh emulator with the binary as boot image. Only one
/// emulator runs at a time; a still-running previous one is terminated first.
pub struct Emulator {
    config: EmulatorConfig,
    process: Option<ProcessTransport>,
}

impl Emulator {
    /// Create an emulator manager; nothing is spawned yet
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            config,
            process: None,
        }
    }

    /// Launch settings
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Spawn the emulator booting `binary`
    pub fn launch(&mut self, binary: &Path) -> Result<&mut ProcessTransport> {
        self.terminate();

        log::info!(
            "Booting {} in {}",
            binary.display(),
            self.config.program.to_string_lossy()
        );
        let process = ProcessTransport::spawn(self.config.command(binary), self.config.timeout)?;
        Ok(self.process.insert(process))
    }

    /// Output of the running emulator
    pub fn device(&mut self) -> Result<&mut ProcessTransport> {
        self.process.as_mut().ok_or(QemuError::NotStarted)
    }

    /// Whether an emulator process is currently running
    pub fn is_running(&mut self) -> bool {
        self.process.as_mut().is_some_and(ProcessTransport::is_alive)
    }

    /// Stop the running emulator, if any
    pub fn terminate(&mut self) {
        if let Some(mut process) = self.process.take() {
            log::debug!("Terminating emulator process");
            let _ = process.close();
        }
    }
}

impl Flasher for Emulator {
    fn flash(&mut self, binary: &Path) -> benchlink_core::Result<()> {
        self.launch(binary).map_err(|e| match e {
            QemuError::SpawnFailed { .. } => {
                benchlink_core::Error::flash_failure(binary, e.to_string())
            }
            other => other.into(),
        })?;
        Ok(())
    }

    fn close(&mut self) -> benchlink_core::Result<()> {
        self.terminate();
        Ok(())
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Platform running binaries in an emulator
///
/// Each run boots a fresh emulator and terminates it once the transcript is
/// captured or the session fails.
pub struct QemuPlatform {
    name: String,
    emulator: Emulator,
    closed: bool,
}

impl QemuPlatform {
    /// Create a platform emulating `machine` with `qemu-system-arm`
    pub fn new(machine: &str) -> Self {
        Self::with_config(format!("qemu-{}", machine), EmulatorConfig::qemu(machine))
    }

    /// Create a platform from an explicit emulator configuration
    pub fn with_config(name: impl Into<String>, config: EmulatorConfig) -> Self {
        Self {
            name: name.into(),
            emulator: Emulator::new(config),
            closed: false,
        }
    }

    /// The emulator manager
    pub fn emulator(&mut self) -> &mut Emulator {
        &mut self.emulator
    }
}

impl Platform for QemuPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self, binary: &Path) -> benchlink_core::Result<String> {
        if self.closed {
            return Err(benchlink_core::Error::TransportUnavailable(format!(
                "{} is closed",
                self.name
            )));
        }
        self.emulator.flash(binary)?;
        let result = self
            .emulator
            .device()
            .map_err(benchlink_core::Error::from)
            .and_then(|device| read_transcript(device));
        self.emulator.terminate();
        result
    }

    fn close(&mut self) -> benchlink_core::Result<()> {
        self.closed = true;
        self.emulator.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchlink_core::Error;
    use std::io::Write;

    /// Emulator stand-in that prints the "boot image" and then idles
    fn cat_emulator(timeout: Duration) -> EmulatorConfig {
        EmulatorConfig::new("sh")
            .arg("-c")
            .arg("cat \"$1\"; sleep 5")
            .arg("sh")
            .arg(BINARY_PLACEHOLDER)
            .with_timeout(timeout)
    }

    fn image(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_qemu_command_line() {
        let command = EmulatorConfig::qemu("mps2-an386").command(Path::new("bin/aes.bin"));
        assert_eq!(command.get_program(), "qemu-system-arm");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(
            args,
            vec![
                "-cpu",
                "cortex-m4",
                "-M",
                "mps2-an386",
                "-nographic",
                "-kernel",
                "bin/aes.bin"
            ]
        );
    }

    #[test]
    fn test_run_captures_transcript_and_stops_emulator() {
        let bin = image(b"Booting...\n==========\nbench: 1234 cycles\n#");
        let mut platform = QemuPlatform::with_config("test", cat_emulator(Duration::from_secs(5)));

        let transcript = platform.run(bin.path()).unwrap();
        assert_eq!(transcript, "bench: 1234 cycles\n");
        assert!(!platform.emulator().is_running());
        assert!(matches!(
            platform.emulator().device(),
            Err(QemuError::NotStarted)
        ));
    }

    #[test]
    fn test_run_twice() {
        let first = image(b"====\none\n#");
        let second = image(b"====\ntwo\n#");
        let mut platform = QemuPlatform::with_config("test", cat_emulator(Duration::from_secs(5)));

        assert_eq!(platform.run(first.path()).unwrap(), "one\n");
        assert_eq!(platform.run(second.path()).unwrap(), "two\n");
    }

    #[test]
    fn test_silent_image_times_out() {
        let bin = image(b"no marker here");
        let mut platform =
            QemuPlatform::with_config("test", cat_emulator(Duration::from_millis(200)));

        assert!(platform.run(bin.path()).unwrap_err().is_timeout());
        assert!(!platform.emulator().is_running());
    }

    #[test]
    fn test_short_start_line() {
        let bin = image(b"==\nbench\n#");
        let mut platform = QemuPlatform::with_config("test", cat_emulator(Duration::from_secs(5)));

        assert!(matches!(
            platform.run(bin.path()),
            Err(Error::ProtocolMismatch { .. })
        ));
    }

    #[test]
    fn test_launch_replaces_running_emulator() {
        let bin = image(b"");
        let mut emulator = Emulator::new(cat_emulator(Duration::from_secs(1)));

        let first = emulator.launch(bin.path()).unwrap().id();
        let second = emulator.launch(bin.path()).unwrap().id();
        assert_ne!(first, second);
        assert!(emulator.is_running());

        emulator.close().unwrap();
        emulator.close().unwrap();
        assert!(!emulator.is_running());
    }

    #[test]
    fn test_run_after_close_spawns_nothing() {
        let bin = image(b"====\nbench\n#");
        let mut platform = QemuPlatform::with_config("test", cat_emulator(Duration::from_secs(5)));

        platform.close().unwrap();
        platform.close().unwrap();
        assert!(matches!(
            platform.run(bin.path()),
            Err(Error::TransportUnavailable(_))
        ));
        assert!(matches!(
            platform.emulator().device(),
            Err(QemuError::NotStarted)
        ));
    }

    #[test]
    fn test_missing_emulator_is_flash_failure() {
        let mut platform = QemuPlatform::with_config(
            "test",
            EmulatorConfig::new("benchlink-no-such-qemu").arg(BINARY_PLACEHOLDER),
        );
        assert!(matches!(
            platform.run(Path::new("x.bin")),
            Err(Error::FlashFailure { .. })
        ));
    }
}
