//! Output path resolution for the CLI.
//!
//! Decides whether the `-o` argument names a directory or, for a single
//! input file, the exact `.mp4` file to write.

use trackmux_core::CoreError;
use trackmux_core::config::OUTPUT_EXTENSION;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Resolved output path information.
#[derive(Debug)]
pub struct OutputPathInfo {
    /// The directory where output files should be written.
    pub output_dir: PathBuf,
    /// Set when the user named the output file (`-o movie.mp4`).
    pub filename_override: Option<OsString>,
}

/// Resolves the output path argument into a directory and optional filename.
///
/// When the input is a single file AND the output has an extension, the
/// output is treated as a filename and must end in `.mp4`. Otherwise it is a
/// directory.
pub fn resolve_output_path(input_path: &Path, output_path: &Path) -> Result<OutputPathInfo, CoreError> {
    if input_path.is_file() && output_path.extension().is_some() {
        let ext = output_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        if ext.as_deref() != Some(OUTPUT_EXTENSION) {
            return Err(CoreError::PathError(format!(
                "Output filename must have .{} extension",
                OUTPUT_EXTENSION
            )));
        }

        let parent_dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(OutputPathInfo {
            output_dir: parent_dir,
            filename_override: output_path.file_name().map(OsString::from),
        })
    } else {
        Ok(OutputPathInfo {
            output_dir: output_path.to_path_buf(),
            filename_override: None,
        })
    }
}
