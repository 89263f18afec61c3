//! Library portion of the trackmux CLI.
//!
//! Split from `main.rs` so argument parsing and command logic can be
//! exercised from tests without spawning the binary.

/// Command-line argument definitions (clap).
pub mod cli;

/// Subcommand implementations.
pub mod commands;

/// Result alias and error-context helpers.
pub mod error;

/// Run-log naming helpers.
pub mod logging;

/// Resolution of `-o` into an output directory and optional filename.
pub mod output_path;

pub use cli::{Cli, Commands, ConvertArgs, parse_cli, parse_cli_from};
pub use commands::convert::{discover_convert_files, run_convert};
