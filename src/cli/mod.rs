//! CLI module for glossa.
//!
//! This module provides the command-line interface:
//! - Argument parsing
//! - Version display
//! - Command handlers (ask, vocabulary management, documents)
//!
//! # Usage
//!
//! ```ignore
//! use glossa::cli::{parse_args, run_command, run_local_command};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_local_command(&command, &mut std::io::stdout()) {
//!     return result;
//! }
//! // Commands that talk to the backend or storage need a context
//! run_command(&ctx, command, &mut std::io::stdout()).await?;
//! ```

pub mod args;
pub mod commands;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use commands::{run_command, run_local_command};
pub use version::{version_line, VERSION};
