//! Command implementations for the CLI.

/// The `convert` command: MKV/AVI to MP4 with language-ordered tracks.
pub mod convert;
