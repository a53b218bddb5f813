//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Platforms the firmware build knows about
pub const BUILD_PLATFORMS: &[&str] = &[
    "stm32f4discovery",
    "nucleo-l476rg",
    "cw308t-stm32f3",
    "mps2-an386",
];

const PLATFORM_HELP: &str = "Platform to use, as name[:key=value,...] (see list-platforms)";

#[derive(Parser)]
#[command(name = "benchlink")]
#[command(author, version, about = "Run benchmark binaries on embedded targets", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Optimization profile of the firmware build
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptLevel {
    /// Optimize for speed
    #[default]
    Speed,
    /// Optimize for size
    Size,
    /// Debug build
    Debug,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Flash a binary and print its benchmark output
    Run {
        /// Platform to use
        #[arg(short, long, help = PLATFORM_HELP)]
        platform: String,

        /// Binary image to run
        binary: PathBuf,

        /// Also write the transcript to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flash a binary without waiting for output
    Flash {
        /// Platform to use
        #[arg(short, long, help = PLATFORM_HELP)]
        platform: String,

        /// Binary image to flash
        binary: PathBuf,
    },

    /// Print the build settings for a platform
    Settings {
        /// Firmware platform
        #[arg(short, long, default_value = "stm32f4discovery",
              value_parser = clap::builder::PossibleValuesParser::new(BUILD_PLATFORMS))]
        platform: String,

        /// Optimization flags
        #[arg(short, long, value_enum, default_value_t = OptLevel::Speed)]
        opt: OptLevel,

        /// Enable LTO flags
        #[arg(short, long)]
        lto: bool,

        /// Enable all-in-one compilation
        #[arg(short, long)]
        aio: bool,
    },

    /// List supported platforms
    ListPlatforms,
}
