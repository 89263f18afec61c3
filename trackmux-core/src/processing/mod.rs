//! Conversion pipeline: track selection, progress supervision and batch
//! orchestration.

/// Batch orchestration and the per-file pipeline
pub mod convert;

/// ffmpeg progress parsing and diagnostics
pub mod progress;

/// Per-file results and batch summary
pub mod results;

/// Language-priority track ordering
pub mod selection;

pub use convert::{
    ConversionContext, convert_file, convert_files, convert_single_file, output_path_for,
};
pub use results::{BatchReport, BatchSummary, ConversionResult, ConversionStatus};
pub use selection::{TrackPlan, TrackSelection, select_tracks};
