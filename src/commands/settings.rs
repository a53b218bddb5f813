//! Settings command implementation

use crate::settings::BuildSettings;

/// Print make variables and image type, one `KEY=value` per line
pub fn print_settings(settings: &BuildSettings) {
    println!("MAKEFLAGS={}", settings.makeflags().join(" "));
    println!("BINARY_TYPE={}", settings.binary_type());
}
