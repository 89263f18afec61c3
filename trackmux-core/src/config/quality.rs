//! Encoder quality settings: x264 speed presets, named quality presets and the
//! resolved [`QualityConfig`] that the command builder consumes.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Default video encoder.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Hardware encoder selected by `--gpu` (macOS VideoToolbox).
pub const DEFAULT_HARDWARE_ENCODER: &str = "h264_videotoolbox";

/// Default CRF. Range 0-51, lower is better quality.
pub const DEFAULT_CRF: u8 = 23;

/// Highest CRF accepted by x264.
pub const MAX_CRF: u8 = 51;

pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

pub const DEFAULT_AUDIO_CODEC: &str = "aac";

pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Stereo downmix.
pub const DEFAULT_AUDIO_CHANNELS: u8 = 2;

/// The only text subtitle codec the MP4 container carries natively.
pub const DEFAULT_SUBTITLE_CODEC: &str = "mov_text";

// ---- Encoder speed presets ----

/// x264 speed/quality trade-off keyword passed as `-preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncoderPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl EncoderPreset {
    pub const ALL: [EncoderPreset; 9] = [
        EncoderPreset::Ultrafast,
        EncoderPreset::Superfast,
        EncoderPreset::Veryfast,
        EncoderPreset::Faster,
        EncoderPreset::Fast,
        EncoderPreset::Medium,
        EncoderPreset::Slow,
        EncoderPreset::Slower,
        EncoderPreset::Veryslow,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EncoderPreset::Ultrafast => "ultrafast",
            EncoderPreset::Superfast => "superfast",
            EncoderPreset::Veryfast => "veryfast",
            EncoderPreset::Faster => "faster",
            EncoderPreset::Fast => "fast",
            EncoderPreset::Medium => "medium",
            EncoderPreset::Slow => "slow",
            EncoderPreset::Slower => "slower",
            EncoderPreset::Veryslow => "veryslow",
        }
    }

    pub const fn variants_display() -> &'static str {
        "ultrafast, superfast, veryfast, faster, fast, medium, slow, slower, veryslow"
    }
}

impl Default for EncoderPreset {
    fn default() -> Self {
        EncoderPreset::Medium
    }
}

impl fmt::Display for EncoderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an encoder or quality preset name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetParseError {
    kind: &'static str,
    invalid_value: String,
    valid: &'static str,
}

impl fmt::Display for PresetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown {} '{}'. Valid options: {}",
            self.kind, self.invalid_value, self.valid
        )
    }
}

impl std::error::Error for PresetParseError {}

impl FromStr for EncoderPreset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        EncoderPreset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PresetParseError {
                kind: "encoder preset",
                invalid_value: s.to_string(),
                valid: EncoderPreset::variants_display(),
            })
    }
}

// ---- Named quality presets ----

/// Shorthand that sets CRF and encoder preset together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    /// Visually transparent, slow.
    High,
    /// The defaults.
    Balanced,
    /// Smaller files, faster encodes.
    Compressed,
}

/// Values bundled by a [`QualityPreset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPresetValues {
    pub crf: u8,
    pub encoder_preset: EncoderPreset,
}

pub const QUALITY_PRESET_HIGH_VALUES: QualityPresetValues = QualityPresetValues {
    crf: 18,
    encoder_preset: EncoderPreset::Slow,
};

pub const QUALITY_PRESET_BALANCED_VALUES: QualityPresetValues = QualityPresetValues {
    crf: DEFAULT_CRF,
    encoder_preset: EncoderPreset::Medium,
};

pub const QUALITY_PRESET_COMPRESSED_VALUES: QualityPresetValues = QualityPresetValues {
    crf: 28,
    encoder_preset: EncoderPreset::Fast,
};

impl QualityPreset {
    pub const fn as_str(self) -> &'static str {
        match self {
            QualityPreset::High => "high",
            QualityPreset::Balanced => "balanced",
            QualityPreset::Compressed => "compressed",
        }
    }

    pub const fn variants_display() -> &'static str {
        "high, balanced, compressed"
    }

    pub const fn values(self) -> QualityPresetValues {
        match self {
            QualityPreset::High => QUALITY_PRESET_HIGH_VALUES,
            QualityPreset::Balanced => QUALITY_PRESET_BALANCED_VALUES,
            QualityPreset::Compressed => QUALITY_PRESET_COMPRESSED_VALUES,
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityPreset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s_trim = s.trim();
        if s_trim.eq_ignore_ascii_case("high") {
            Ok(QualityPreset::High)
        } else if s_trim.eq_ignore_ascii_case("balanced") {
            Ok(QualityPreset::Balanced)
        } else if s_trim.eq_ignore_ascii_case("compressed") {
            Ok(QualityPreset::Compressed)
        } else {
            Err(PresetParseError {
                kind: "quality preset",
                invalid_value: s.to_string(),
                valid: QualityPreset::variants_display(),
            })
        }
    }
}

// ---- Resolved quality configuration ----

/// Codec and quality parameters for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    pub crf: u8,
    pub encoder_preset: EncoderPreset,
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub audio_channels: u8,
    pub pixel_format: String,
    pub subtitle_codec: String,
    pub include_subtitles: bool,
    /// When set, replaces `video_codec` and drops `-preset`/`-crf`.
    pub hardware_encoder: Option<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF,
            encoder_preset: EncoderPreset::default(),
            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            audio_channels: DEFAULT_AUDIO_CHANNELS,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            subtitle_codec: DEFAULT_SUBTITLE_CODEC.to_string(),
            include_subtitles: true,
            hardware_encoder: None,
        }
    }
}

impl QualityConfig {
    /// Builds a config from an optional named preset plus explicit overrides.
    ///
    /// Explicit `crf`/`encoder_preset` always win over the named preset.
    pub fn resolve(
        preset: Option<QualityPreset>,
        crf: Option<u8>,
        encoder_preset: Option<EncoderPreset>,
    ) -> Self {
        let mut config = Self::default();
        if let Some(preset) = preset {
            config.apply_quality_preset(preset);
        }
        if let Some(crf) = crf {
            config.crf = crf;
        }
        if let Some(encoder_preset) = encoder_preset {
            config.encoder_preset = encoder_preset;
        }
        config
    }

    /// Overwrites CRF and encoder preset with the preset's bundled values.
    pub fn apply_quality_preset(&mut self, preset: QualityPreset) {
        let values = preset.values();
        self.crf = values.crf;
        self.encoder_preset = values.encoder_preset;
    }

    /// The encoder actually passed to `-c:v`.
    #[must_use]
    pub fn effective_video_codec(&self) -> &str {
        self.hardware_encoder
            .as_deref()
            .unwrap_or(&self.video_codec)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.crf > MAX_CRF {
            return Err(CoreError::Config(format!(
                "crf must be 0-{MAX_CRF}, got {}",
                self.crf
            )));
        }

        for (field, value) in [
            ("video_codec", &self.video_codec),
            ("audio_codec", &self.audio_codec),
            ("pixel_format", &self.pixel_format),
            ("subtitle_codec", &self.subtitle_codec),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Config(format!("{field} must not be empty")));
            }
        }

        if !is_valid_bitrate(&self.audio_bitrate) {
            return Err(CoreError::Config(format!(
                "audio_bitrate must look like '192k', got '{}'",
                self.audio_bitrate
            )));
        }

        if self.audio_channels == 0 {
            return Err(CoreError::Config(
                "audio_channels must be at least 1".to_string(),
            ));
        }

        if self
            .hardware_encoder
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            return Err(CoreError::Config(
                "hardware_encoder must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Accepts plain bit counts or a k/M suffix (`128000`, `192k`, `1.5M`).
fn is_valid_bitrate(value: &str) -> bool {
    let number = value
        .strip_suffix(['k', 'K', 'm', 'M'])
        .unwrap_or(value);
    !number.is_empty()
        && number.parse::<f64>().is_ok_and(|n| n > 0.0 && n.is_finite())
}
