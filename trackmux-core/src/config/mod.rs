//! Configuration structures and constants for the trackmux-core library.
//!
//! A [`CoreConfig`] is built once (usually by the CLI), validated, and then
//! passed by reference into every conversion of a batch. Nothing in it is
//! mutated while the batch runs.

pub mod languages;
pub mod quality;

use std::path::PathBuf;

use crate::error::CoreError;

pub use languages::{DEFAULT_TARGET_LANGUAGE, LanguagePriority, PriorityTier, language_equivalents};
pub use quality::{
    DEFAULT_AUDIO_BITRATE, DEFAULT_AUDIO_CHANNELS, DEFAULT_AUDIO_CODEC, DEFAULT_CRF,
    DEFAULT_HARDWARE_ENCODER, DEFAULT_PIXEL_FORMAT, DEFAULT_SUBTITLE_CODEC, DEFAULT_VIDEO_CODEC,
    EncoderPreset, MAX_CRF, PresetParseError, QualityConfig, QualityPreset, QualityPresetValues,
};

// Default constants

/// Source container extensions accepted for conversion (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mkv", "avi"];

/// Extension of produced files.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Appended to the input stem to form the output name.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_converted";

pub const DEFAULT_INPUT_DIR: &str = "input";

pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Places the moov atom at the front for progressive playback.
pub const MOVFLAGS_FASTSTART: &str = "+faststart";

/// Maximum allowed difference between source and output duration.
pub const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// Per-warning switches for promoting a warning to a failure.
///
/// Both default to off: a missing target language or a drifted duration is
/// logged and recorded on the result, and the file still counts as converted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarningPolicy {
    /// Fail when no audio track matches the target language. A subtitle
    /// miss is always only a warning.
    pub fail_on_missing_language: bool,
    pub fail_on_duration_mismatch: bool,
}

/// Configuration for a conversion batch.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory scanned for input files
    pub input_dir: PathBuf,

    /// Directory where converted files are written
    pub output_dir: PathBuf,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Suffix inserted between the input stem and `.mp4`
    pub output_suffix: String,

    /// Leave inputs whose output already exists untouched
    pub skip_existing: bool,

    /// Codec and quality settings
    pub quality: QualityConfig,

    /// Priority tiers for audio track ordering
    pub audio_languages: LanguagePriority,

    /// Priority tiers for subtitle track ordering
    pub subtitle_languages: LanguagePriority,

    pub warning_policy: WarningPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            skip_existing: true,
            quality: QualityConfig::default(),
            audio_languages: LanguagePriority::default(),
            subtitle_languages: LanguagePriority::default(),
            warning_policy: WarningPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Creates config with required paths. Other fields use defaults.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            log_dir,
            ..Default::default()
        }
    }

    /// Uses the same priority list for audio and subtitles.
    pub fn set_languages(&mut self, priority: LanguagePriority) {
        self.subtitle_languages = priority.clone();
        self.audio_languages = priority;
    }

    /// Validates quality settings, the output suffix and the language tiers.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.quality.validate()?;

        if self
            .output_suffix
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\0')
        {
            return Err(CoreError::Config(format!(
                "output_suffix must not contain path separators, got '{}'",
                self.output_suffix
            )));
        }

        for (field, priority) in [
            ("audio_languages", &self.audio_languages),
            ("subtitle_languages", &self.subtitle_languages),
        ] {
            if priority.tiers().first().is_none_or(PriorityTier::is_empty) {
                return Err(CoreError::Config(format!(
                    "{field} must start with a non-empty target language tier"
                )));
            }
        }

        Ok(())
    }
}
