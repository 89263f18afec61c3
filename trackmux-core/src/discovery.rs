//! File discovery for conversion batches.
//!
//! Only the top level of the input directory is scanned; subdirectories are
//! not descended into.

use crate::error::{CoreError, CoreResult};
use crate::utils::has_supported_extension;

use std::path::{Path, PathBuf};

/// Finds `.mkv` and `.avi` files (case-insensitive) directly inside `input_dir`.
///
/// The result is sorted by path so batches run in a stable order.
///
/// # Errors
///
/// * `CoreError::Io` - If the directory cannot be read
/// * `CoreError::NoFilesFound` - If no eligible files are found
///
/// # Examples
///
/// ```rust,no_run
/// use trackmux_core::find_processable_files;
/// use std::path::Path;
///
/// match find_processable_files(Path::new("input")) {
///     Ok(files) => println!("Found {} file(s)", files.len()),
///     Err(e) => eprintln!("Error finding files: {e}"),
/// }
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.is_file() && has_supported_extension(&path)).then_some(path)
        })
        .collect();

    if files.is_empty() {
        return Err(CoreError::NoFilesFound);
    }

    files.sort();
    log::debug!("Found {} convertible file(s) in {}", files.len(), input_dir.display());
    Ok(files)
}
