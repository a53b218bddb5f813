//! Run and flash commands implementation

use crate::error::CliError;
use crate::platforms;
use benchlink_core::{Flasher, Platform};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Flash `binary` on the platform, print the transcript and optionally save it
pub fn run_binary(
    platform: &str,
    binary: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !binary.is_file() {
        return Err(CliError::BinaryNotFound(binary.to_path_buf()).into());
    }

    let mut platform = platforms::open_platform(platform)?;

    let pb = spinner(format!("Running {} on {}", binary.display(), platform.name()))?;
    let result = platform.run(binary);
    pb.finish_and_clear();

    let close = platform.close();
    let transcript = result?;
    close?;

    print!("{}", transcript);
    if let Some(path) = output {
        fs::write(path, &transcript)?;
        log::info!("Transcript written to {}", path.display());
    }
    Ok(())
}

/// Flash `binary` without capturing output
pub fn run_flash(platform: &str, binary: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !binary.is_file() {
        return Err(CliError::BinaryNotFound(binary.to_path_buf()).into());
    }

    let mut flasher = platforms::open_flasher(platform)?;

    let pb = spinner(format!("Flashing {}", binary.display()))?;
    let result = flasher.flash(binary);
    pb.finish_and_clear();

    let close = flasher.close();
    result?;
    close?;

    println!("Flashed {}", binary.display());
    Ok(())
}
