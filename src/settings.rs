//! Firmware build settings
//!
//! The build itself happens elsewhere; this only derives the make variables
//! and the image type a platform expects.

use crate::cli::OptLevel;

/// Build configuration for one platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Firmware platform name (e.g. "stm32f4discovery")
    pub platform: String,
    /// Optimization profile
    pub opt: OptLevel,
    /// Link-time optimization
    pub lto: bool,
    /// All-in-one compilation
    pub aio: bool,
}

impl BuildSettings {
    /// Settings for `platform` with the given build options
    pub fn new(platform: impl Into<String>, opt: OptLevel, lto: bool, aio: bool) -> Self {
        Self {
            platform: platform.into(),
            opt,
            lto,
            aio,
        }
    }

    /// Image format the platform's programmer takes
    pub fn binary_type(&self) -> &'static str {
        match self.platform.as_str() {
            // The scope's bootloader programmer reads Intel HEX
            "cw308t-stm32f3" => "hex",
            _ => "bin",
        }
    }

    /// Variables to pass to make
    pub fn makeflags(&self) -> Vec<String> {
        let mut flags = vec![format!("PLATFORM={}", self.platform)];
        match self.opt {
            OptLevel::Speed => {}
            OptLevel::Size => flags.push("OPT_SIZE=1".to_string()),
            OptLevel::Debug => flags.push("DEBUG=1".to_string()),
        }
        if self.lto {
            flags.push("LTO=1".to_string());
        }
        if self.aio {
            flags.push("AIO=1".to_string());
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_speed_build() {
        let settings = BuildSettings::new("stm32f4discovery", OptLevel::Speed, false, false);
        assert_eq!(settings.makeflags(), vec!["PLATFORM=stm32f4discovery"]);
        assert_eq!(settings.binary_type(), "bin");
    }

    #[test]
    fn test_all_flags() {
        let settings = BuildSettings::new("nucleo-l476rg", OptLevel::Size, true, true);
        assert_eq!(
            settings.makeflags(),
            vec!["PLATFORM=nucleo-l476rg", "OPT_SIZE=1", "LTO=1", "AIO=1"]
        );

        let settings = BuildSettings::new("nucleo-l476rg", OptLevel::Debug, false, false);
        assert_eq!(settings.makeflags(), vec!["PLATFORM=nucleo-l476rg", "DEBUG=1"]);
    }

    #[test]
    fn test_scope_target_uses_hex() {
        let settings = BuildSettings::new("cw308t-stm32f3", OptLevel::Speed, false, false);
        assert_eq!(settings.binary_type(), "hex");
    }
}
