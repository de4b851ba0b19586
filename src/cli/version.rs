//! Version command for the glossa CLI.

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line as printed by `glossa --version`.
pub fn version_line() -> String {
    format!("glossa {}", VERSION)
}
