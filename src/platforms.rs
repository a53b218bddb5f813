//! Platform registration and dispatch
//!
//! Platforms are selected with a string of the form `name` or
//! `name:key1=value1,key2=value2`, for example
//! `stm32f4discovery:dev=/dev/ttyACM1,baud=115200`.

use crate::error::{CliError, Result};
use benchlink_core::{Flasher, Platform};
use std::collections::HashMap;
use std::time::Duration;

/// Information about a platform
pub struct PlatformInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all platforms enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_platforms() -> Vec<PlatformInfo> {
    let mut platforms = Vec::new();

    #[cfg(feature = "serial")]
    platforms.push(PlatformInfo {
        name: "stm32f4discovery",
        aliases: &["nucleo-l476rg"],
        description: "ST-LINK board with UART on a serial port (dev=,baud=,timeout=,wait=,flasher=st-flash|openocd|none,script=)",
    });

    #[cfg(all(unix, feature = "qemu"))]
    platforms.push(PlatformInfo {
        name: "qemu",
        aliases: &["mps2-an386"],
        description: "qemu-system-arm emulation (machine=,timeout=)",
    });

    #[cfg(feature = "scope")]
    platforms.push(PlatformInfo {
        name: "cw-sim",
        aliases: &[],
        description: "Simulated capture board; prints the image contents (timeout=)",
    });

    platforms
}

/// Generate help text listing all available platforms
pub fn platform_help() -> String {
    let platforms = available_platforms();

    if platforms.is_empty() {
        return "No platforms available (recompile with platform features enabled)".to_string();
    }

    let mut help = String::from("Available platforms:\n");
    for p in &platforms {
        help.push_str(&format!("  {:18} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:18}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }
    help
}

/// Parsed platform parameters
#[derive(Debug)]
pub struct PlatformParams {
    /// Platform name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl PlatformParams {
    /// Raw value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Value of `key` as a number
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        self.get(key)
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|e| invalid_value(key, v, e.to_string()))
            })
            .transpose()
    }

    /// Value of `key` as a duration in (possibly fractional) seconds
    pub fn get_secs(&self, key: &str) -> Result<Option<Duration>> {
        self.get(key)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|e| e.to_string())
                    .and_then(|secs| Duration::try_from_secs_f64(secs).map_err(|e| e.to_string()))
                    .map_err(|reason| invalid_value(key, v, reason))
            })
            .transpose()
    }
}

fn invalid_value(key: &str, value: &str, reason: String) -> CliError {
    CliError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

/// Parse a platform string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_platform_params(s: &str) -> Result<PlatformParams> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(CliError::InvalidParameter(opt.to_string()));
            }
        }
    }

    Ok(PlatformParams {
        name: name.to_string(),
        params,
    })
}

/// Open a platform from its `name:key=value` string
pub fn open_platform(platform: &str) -> Result<Box<dyn Platform>> {
    let params = parse_platform_params(platform)?;

    match params.name.as_str() {
        #[cfg(feature = "serial")]
        "stm32f4discovery" | "nucleo-l476rg" => open_serial_board(&params),

        #[cfg(all(unix, feature = "qemu"))]
        "qemu" | "mps2-an386" => open_qemu(&params),

        #[cfg(feature = "scope")]
        "cw-sim" => open_scope_sim(&params),

        _ => Err(CliError::UnknownPlatform(params.name)),
    }
}

/// Open only the flasher of a platform
pub fn open_flasher(platform: &str) -> Result<Box<dyn Flasher>> {
    let params = parse_platform_params(platform)?;

    match params.name.as_str() {
        #[cfg(feature = "serial")]
        "stm32f4discovery" | "nucleo-l476rg" => serial_board_flasher(&params),

        #[cfg(all(unix, feature = "qemu"))]
        "qemu" | "mps2-an386" => Err(CliError::RunOnly {
            platform: params.name,
        }),

        #[cfg(feature = "scope")]
        "cw-sim" => Err(CliError::RunOnly {
            platform: params.name,
        }),

        _ => Err(CliError::UnknownPlatform(params.name)),
    }
}

#[cfg(feature = "serial")]
fn serial_board_flasher(params: &PlatformParams) -> Result<Box<dyn Flasher>> {
    use benchlink_core::NoFlash;
    use benchlink_tools::ExternalTool;

    match params.get("flasher").unwrap_or("st-flash") {
        "st-flash" => Ok(Box::new(ExternalTool::st_flash())),
        "openocd" => {
            let script = params.get("script").ok_or(CliError::MissingParameter {
                flasher: "openocd",
                key: "script",
                what: "config file",
            })?;
            Ok(Box::new(ExternalTool::openocd(script)))
        }
        "none" => Ok(Box::new(NoFlash)),
        other => Err(CliError::UnknownFlasher(other.to_string())),
    }
}

#[cfg(feature = "serial")]
fn open_serial_board(params: &PlatformParams) -> Result<Box<dyn Platform>> {
    use benchlink_core::FramedPlatform;
    use benchlink_serial::{SerialConfig, SerialTransport};

    let flasher = serial_board_flasher(params)?;

    let mut config = SerialConfig::new(params.get("dev").unwrap_or("/dev/ttyACM0"));
    if let Some(baud) = params.get_u32("baud")? {
        config = config.with_baud(baud);
    }
    if let Some(timeout) = params.get_secs("timeout")? {
        config = config.with_timeout(timeout);
    }
    if let Some(wait) = params.get_secs("wait")? {
        config = config.wait_for_device(wait);
    }

    log::info!("Opening serial port {}...", config.device);
    let transport = SerialTransport::open(&config)?;

    Ok(Box::new(FramedPlatform::new(
        params.name.clone(),
        flasher,
        transport,
    )))
}

#[cfg(all(unix, feature = "qemu"))]
fn open_qemu(params: &PlatformParams) -> Result<Box<dyn Platform>> {
    use benchlink_qemu::{EmulatorConfig, QemuPlatform, DEFAULT_MACHINE};

    let machine = match params.name.as_str() {
        "qemu" => params.get("machine").unwrap_or(DEFAULT_MACHINE),
        board => board,
    };
    let mut config = EmulatorConfig::qemu(machine);
    if let Some(timeout) = params.get_secs("timeout")? {
        config = config.with_timeout(timeout);
    }

    Ok(Box::new(QemuPlatform::with_config(
        format!("qemu-{}", machine),
        config,
    )))
}

#[cfg(feature = "scope")]
fn open_scope_sim(params: &PlatformParams) -> Result<Box<dyn Platform>> {
    use benchlink_scope::sim::SimBoard;
    use benchlink_scope::ScopePlatform;

    let board = SimBoard::new();
    let mut platform = ScopePlatform::new("cw-sim", board.programmer(), board.target());
    if let Some(timeout) = params.get_secs("timeout")? {
        platform = platform.with_timeout(timeout);
    }
    Ok(Box::new(platform))
}
