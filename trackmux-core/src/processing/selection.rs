//! Track selection: ordering the audio and subtitle streams of a source by
//! language priority.
//!
//! Each stream is ranked by the first [`LanguagePriority`] tier its language
//! tag belongs to, then the streams are stable-sorted on that rank alone.
//! Streams that share a rank therefore keep their source order exactly, and
//! the first stream after sorting becomes the default track of its kind.

use crate::config::LanguagePriority;
use crate::error::{CoreError, CoreResult};
use crate::media::{StreamDescriptor, StreamKind};

/// Output order for one stream kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackPlan {
    pub kind: StreamKind,
    /// Per-kind source indices in output order. Output position `i` carries
    /// source stream `ordered_indices[i]`.
    pub ordered_indices: Vec<usize>,
    /// Always `ordered_indices.first()`; `None` only for an empty plan.
    pub default_index: Option<usize>,
}

impl TrackPlan {
    pub fn empty(kind: StreamKind) -> Self {
        Self {
            kind,
            ordered_indices: Vec::new(),
            default_index: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered_indices.is_empty()
    }
}

/// A plan plus what the selector noticed while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSelection {
    pub plan: TrackPlan,
    /// No stream matched the top tier, so the default came from a lower one.
    pub target_missing: bool,
}

/// Orders the streams of `kind` by `priority`.
///
/// Streams of other kinds in `streams` are ignored. An audio selection over
/// zero streams fails with [`CoreError::NoStreams`]; any other kind yields an
/// empty plan.
pub fn select_tracks(
    kind: StreamKind,
    streams: &[StreamDescriptor],
    priority: &LanguagePriority,
) -> CoreResult<TrackSelection> {
    let mut ranked: Vec<(usize, usize)> = streams
        .iter()
        .filter(|s| s.kind == kind)
        .map(|s| (priority.rank(s.language.as_deref()), s.source_index))
        .collect();

    if ranked.is_empty() {
        if kind == StreamKind::Audio {
            return Err(CoreError::NoStreams(kind));
        }
        return Ok(TrackSelection {
            plan: TrackPlan::empty(kind),
            target_missing: false,
        });
    }

    // slice::sort_by_key is stable: equal ranks keep their source order
    ranked.sort_by_key(|&(rank, _)| rank);

    let target_missing = ranked[0].0 != 0;
    let ordered_indices: Vec<usize> = ranked.into_iter().map(|(_, idx)| idx).collect();
    let default_index = ordered_indices.first().copied();

    log::debug!(
        "{} order {:?} (default {:?}, priority {})",
        kind,
        ordered_indices,
        default_index,
        priority
    );

    Ok(TrackSelection {
        plan: TrackPlan {
            kind,
            ordered_indices,
            default_index,
        },
        target_missing,
    })
}
