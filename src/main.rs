//! benchlink - Run benchmark binaries on embedded targets
//!
//! Flashes a firmware image onto a development board, an emulator or a
//! capture-board target, waits for the framed benchmark output and prints it.
//!
//! # Architecture
//!
//! Every platform is a `benchlink_core::Platform`: a flasher and a transport
//! composed with the framed session reader. This binary only picks and
//! configures the platform from a `name:key=value,...` string.

mod cli;
mod commands;
mod error;
mod platforms;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use settings::BuildSettings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG overrides the verbosity flags
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Run {
            platform,
            binary,
            output,
        } => commands::run_binary(&platform, &binary, output.as_deref()),
        Commands::Flash { platform, binary } => commands::run_flash(&platform, &binary),
        Commands::Settings {
            platform,
            opt,
            lto,
            aio,
        } => {
            commands::print_settings(&BuildSettings::new(platform, opt, lto, aio));
            Ok(())
        }
        Commands::ListPlatforms => {
            commands::list_platforms();
            Ok(())
        }
    }
}
