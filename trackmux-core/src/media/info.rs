use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of stream the converter cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
}

impl StreamKind {
    /// Parses an ffprobe `codec_type`. Data and attachment streams yield `None`.
    #[must_use]
    pub fn from_codec_type(codec_type: &str) -> Option<Self> {
        match codec_type {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "subtitle" => Some(Self::Subtitle),
            _ => None,
        }
    }

    /// The ffmpeg stream specifier letter (`v`, `a`, `s`).
    #[must_use]
    pub fn specifier(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
            Self::Subtitle => "s",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one track as reported by the source container.
///
/// `source_index` is the position of the stream among streams of the same
/// kind (what ffmpeg addresses as `0:a:N`), not the global container index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub source_index: usize,
    pub kind: StreamKind,
    pub codec: String,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_default: bool,
}

impl StreamDescriptor {
    pub fn new(source_index: usize, kind: StreamKind, codec: impl Into<String>) -> Self {
        Self {
            source_index,
            kind,
            codec: codec.into(),
            language: None,
            title: None,
            is_default: false,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Short human label, e.g. `#2 ac3 [fra] "Commentary"`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut label = format!("#{} {}", self.source_index, self.codec);
        if let Some(lang) = &self.language {
            label.push_str(&format!(" [{lang}]"));
        }
        if let Some(title) = &self.title {
            label.push_str(&format!(" \"{title}\""));
        }
        label
    }
}

/// Everything the pipeline needs from one probe of a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Streams in container order; per-kind order is preserved.
    pub streams: Vec<StreamDescriptor>,
    /// Container duration in seconds, when reported.
    pub duration: Option<f64>,
}

impl ProbeReport {
    /// Streams of one kind, in native order.
    #[must_use]
    pub fn of_kind(&self, kind: StreamKind) -> Vec<StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn count(&self, kind: StreamKind) -> usize {
        self.streams.iter().filter(|s| s.kind == kind).count()
    }

    /// The first video stream, if any.
    #[must_use]
    pub fn primary_video(&self) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.kind == StreamKind::Video)
    }
}
