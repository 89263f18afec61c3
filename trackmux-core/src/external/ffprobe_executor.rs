//! ffprobe integration for stream inspection.
//!
//! [`StreamProber`] is the seam the orchestrator depends on; [`FfprobeProber`]
//! runs the real `ffprobe` binary and hands its JSON to
//! [`crate::media::parse_probe_output`].

use crate::error::{CoreResult, probe_error};
use crate::media::{ProbeReport, parse_probe_output};
use std::path::Path;
use std::process::Command;

/// Inspects a media container.
pub trait StreamProber {
    /// Returns the container's streams and duration.
    ///
    /// Fails with `CoreError::Probe` when the file cannot be read, the probe
    /// exits abnormally, or no stream table can be parsed.
    fn probe(&self, input_path: &Path) -> CoreResult<ProbeReport>;
}

/// Production prober invoking `ffprobe -print_format json`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// Uses a specific ffprobe binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl StreamProber for FfprobeProber {
    fn probe(&self, input_path: &Path) -> CoreResult<ProbeReport> {
        log::debug!("Running ffprobe on: {}", input_path.display());

        if !input_path.is_file() {
            return Err(probe_error(input_path, "file does not exist or is not readable"));
        }

        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input_path)
            .output()
            .map_err(|e| probe_error(input_path, format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(probe_error(
                input_path,
                format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = parse_probe_output(&stdout).map_err(|msg| probe_error(input_path, msg))?;

        log::debug!(
            "ffprobe found {} stream(s), duration {:?} in {}",
            report.streams.len(),
            report.duration,
            input_path.display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn missing_file_is_a_probe_error() {
        let prober = FfprobeProber::new();
        let err = prober
            .probe(Path::new("/definitely/not/here.mkv"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Probe { .. }));
    }

    #[test]
    fn unstartable_program_is_a_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.mkv");
        std::fs::write(&file, b"not a real container").unwrap();

        let prober = FfprobeProber::with_program("trackmux-no-such-ffprobe");
        let err = prober.probe(&file).unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
