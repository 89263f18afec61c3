//! Core library for converting MKV/AVI files to MP4 with language-ordered
//! audio and subtitle tracks, using ffmpeg and ffprobe.
//!
//! Each input is probed, its audio (and subtitle) streams are stable-sorted
//! by a language priority list so the preferred language becomes the default
//! track, and ffmpeg writes a fast-start MP4 with that order.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use trackmux_core::{CoreConfig, ConversionContext, convert_files, find_processable_files};
//! use trackmux_core::external::{FfprobeProber, SidecarSpawner, StdFsMetadataProvider};
//! use trackmux_core::reporting::TerminalReporter;
//! use std::path::PathBuf;
//!
//! let config = CoreConfig::new(
//!     PathBuf::from("input"),
//!     PathBuf::from("output"),
//!     PathBuf::from("output/logs"),
//! );
//! config.validate().unwrap();
//!
//! let files = find_processable_files(&config.input_dir).unwrap();
//! let prober = FfprobeProber::new();
//! let reporter = TerminalReporter::new();
//! let ctx = ConversionContext::new(
//!     &SidecarSpawner,
//!     &prober,
//!     &StdFsMetadataProvider,
//!     &reporter,
//! );
//!
//! let report = convert_files(&ctx, &config, &files);
//! println!("{} failed", report.summary.failed);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod media;
pub mod processing;
pub mod reporting;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, LanguagePriority, QualityConfig, WarningPolicy};
pub use discovery::find_processable_files;
pub use error::{ConversionWarning, CoreError, CoreResult};
pub use media::{ProbeReport, StreamDescriptor, StreamKind};
pub use processing::{
    BatchReport, BatchSummary, ConversionContext, ConversionResult, ConversionStatus,
    convert_file, convert_files, convert_single_file, output_path_for, select_tracks,
};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
