//! CLI command implementations
//!
//! `run` and `flash` drive a platform opened from its `name:key=value` string;
//! `settings` and `list-platforms` only print information.

mod list;
mod run;
mod settings;

pub use list::list_platforms;
pub use run::{run_binary, run_flash};
pub use settings::print_settings;
