//! Flasher abstraction

use crate::error::Result;
use std::ffi::OsString;
use std::path::Path;

/// Placeholder replaced with the binary path in tool and emulator arguments
pub const BINARY_PLACEHOLDER: &str = "{binary}";

/// Expand argument templates for `binary`
///
/// An argument equal to [`BINARY_PLACEHOLDER`] becomes the path unchanged;
/// an argument containing it gets the (lossily converted) path spliced in.
pub fn expand_args(templates: &[String], binary: &Path) -> Vec<OsString> {
    templates
        .iter()
        .map(|arg| {
            if arg == BINARY_PLACEHOLDER {
                binary.as_os_str().to_owned()
            } else if arg.contains(BINARY_PLACEHOLDER) {
                arg.replace(BINARY_PLACEHOLDER, &binary.to_string_lossy())
                    .into()
            } else {
                arg.into()
            }
        })
        .collect()
}

/// Loads a binary image onto the target and resets it
///
/// Returns once the target is running the new image, or
/// [`Error::FlashFailure`](crate::Error::FlashFailure). Implementations keep no
/// state from one call to the next that affects the result.
pub trait Flasher {
    /// Program `binary` and reset the target
    fn flash(&mut self, binary: &Path) -> Result<()>;

    /// Release any programmer handle
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F: Flasher + ?Sized> Flasher for Box<F> {
    fn flash(&mut self, binary: &Path) -> Result<()> {
        (**self).flash(binary)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Flasher for targets that are already programmed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFlash;

impl Flasher for NoFlash {
    fn flash(&mut self, binary: &Path) -> Result<()> {
        log::debug!("Skipping flash of {}", binary.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_args() {
        let templates = vec![
            "-kernel".to_string(),
            BINARY_PLACEHOLDER.to_string(),
            format!("program {} verify", BINARY_PLACEHOLDER),
        ];
        assert_eq!(
            expand_args(&templates, Path::new("bin/kem.bin")),
            vec!["-kernel", "bin/kem.bin", "program bin/kem.bin verify"]
        );
    }

    #[test]
    fn test_expand_args_without_placeholder() {
        let templates = vec!["--reset".to_string()];
        assert_eq!(expand_args(&templates, Path::new("x.bin")), vec!["--reset"]);
    }
}
