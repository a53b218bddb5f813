//! List commands implementation

use crate::platforms;

/// List all platforms enabled at compile time
pub fn list_platforms() {
    print!("{}", platforms::platform_help());
    println!();
    println!("Platforms take options as name:key=value,... for example");
    println!("  stm32f4discovery:dev=/dev/ttyACM0,baud=38400,timeout=60");
}
