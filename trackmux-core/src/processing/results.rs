//! Per-file results and the batch summary built from them.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConversionWarning;

/// Terminal state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionStatus {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConversionStatus::Success => "success",
            ConversionStatus::Skipped => "skipped",
            ConversionStatus::Failed => "failed",
        })
    }
}

/// Outcome of converting one input file. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub status: ConversionStatus,
    pub error_detail: Option<String>,
    pub input_size: u64,
    pub output_size: u64,
    pub elapsed: Duration,
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionResult {
    pub(crate) fn skipped(input_path: PathBuf, output_path: PathBuf, input_size: u64, output_size: u64) -> Self {
        Self {
            input_path,
            output_path,
            status: ConversionStatus::Skipped,
            error_detail: None,
            input_size,
            output_size,
            elapsed: Duration::ZERO,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn failed(
        input_path: PathBuf,
        output_path: PathBuf,
        error_detail: String,
        input_size: u64,
        elapsed: Duration,
        warnings: Vec<ConversionWarning>,
    ) -> Self {
        Self {
            input_path,
            output_path,
            status: ConversionStatus::Failed,
            error_detail: Some(error_detail),
            input_size,
            output_size: 0,
            elapsed,
            warnings,
        }
    }
}

/// Counts per terminal state plus totals over converted files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub warnings: usize,
    /// Input bytes of successfully converted files
    pub total_input_size: u64,
    /// Output bytes of successfully converted files
    pub total_output_size: u64,
    pub total_elapsed: Duration,
    pub failed_files: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        let mut summary = Self {
            total_files: results.len(),
            ..Default::default()
        };

        for result in results {
            summary.warnings += result.warnings.len();
            summary.total_elapsed += result.elapsed;
            match result.status {
                ConversionStatus::Success => {
                    summary.succeeded += 1;
                    summary.total_input_size += result.input_size;
                    summary.total_output_size += result.output_size;
                }
                ConversionStatus::Skipped => summary.skipped += 1,
                ConversionStatus::Failed => {
                    summary.failed += 1;
                    summary.failed_files.push((
                        crate::utils::get_filename_lossy(&result.input_path),
                        result.error_detail.clone().unwrap_or_default(),
                    ));
                }
            }
        }

        summary
    }

    /// `true` when every file ended `Success` or `Skipped`.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Everything a batch run produces.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    pub summary: BatchSummary,
}
