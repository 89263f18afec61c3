//! Media stream model and ffprobe output parsing
//!
//! This module defines the normalized view of a container's tracks that the
//! rest of the pipeline works with, and the parser that reduces ffprobe's JSON
//! output to that shape.

pub mod info;
pub mod probe;

// Re-export commonly used types
pub use info::{ProbeReport, StreamDescriptor, StreamKind};
pub use probe::parse_probe_output;
