//! Reduction of `ffprobe -print_format json -show_format -show_streams` output
//! to a [`ProbeReport`].

use std::collections::HashMap;

use serde::Deserialize;

use crate::media::info::{ProbeReport, StreamDescriptor, StreamKind};

#[derive(Debug, Deserialize)]
struct RawProbe {
    streams: Option<Vec<RawStream>>,
    #[serde(default)]
    format: Option<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    disposition: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    // ffprobe prints numeric fields as strings
    #[serde(default)]
    duration: Option<String>,
}

/// Parses ffprobe's JSON into normalized stream descriptors.
///
/// Returns an error string when the document is not valid JSON or has no
/// stream table at all. Tag keys are matched case-insensitively since some
/// muxers write `LANGUAGE`/`TITLE`. Empty tags are treated as absent.
pub fn parse_probe_output(json: &str) -> Result<ProbeReport, String> {
    let raw: RawProbe =
        serde_json::from_str(json).map_err(|e| format!("invalid ffprobe JSON: {e}"))?;

    let raw_streams = raw
        .streams
        .ok_or_else(|| "ffprobe output has no stream table".to_string())?;

    let mut counters: HashMap<StreamKind, usize> = HashMap::new();
    let mut streams = Vec::with_capacity(raw_streams.len());

    for raw_stream in raw_streams {
        let Some(kind) = raw_stream
            .codec_type
            .as_deref()
            .and_then(StreamKind::from_codec_type)
        else {
            continue;
        };

        let counter = counters.entry(kind).or_insert(0);
        let source_index = *counter;
        *counter += 1;

        streams.push(StreamDescriptor {
            source_index,
            kind,
            codec: raw_stream
                .codec_name
                .unwrap_or_else(|| "unknown".to_string()),
            language: tag_value(&raw_stream.tags, "language"),
            title: tag_value(&raw_stream.tags, "title"),
            is_default: raw_stream.disposition.get("default").copied() == Some(1),
        });
    }

    let duration = raw
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(ProbeReport { streams, duration })
}

fn tag_value(tags: &HashMap<String, String>, key: &str) -> Option<String> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
