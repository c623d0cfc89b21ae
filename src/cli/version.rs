//! Version command for prompt-gallery.

/// The current version of prompt-gallery, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line printed by `--version`.
pub fn version_line() -> String {
    format!("prompt-gallery {}", VERSION)
}
