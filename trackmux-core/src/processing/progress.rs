//! ffmpeg progress handling
//!
//! Turns the encoder's event stream into percent-complete/ETA snapshots for
//! the [`Reporter`], forwards log lines to the `log` facade and keeps the
//! diagnostic text needed to explain a failed run.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::CoreResult;
use crate::external::EncoderEvent;
use crate::reporting::{ProgressSnapshot, Reporter};
use crate::utils::{format_duration, parse_ffmpeg_time};

/// Log lines kept for the failure report when ffmpeg emits no error lines.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Error lines kept for the failure report; older ones are dropped.
const MAX_ERROR_LINES: usize = 50;

/// Fraction of the source processed, clamped to `0.0..=1.0`.
///
/// `None` when the source duration is unknown or not positive.
#[must_use]
pub fn progress_fraction(current_secs: f64, duration: Option<f64>) -> Option<f64> {
    duration
        .filter(|d| *d > 0.0 && d.is_finite())
        .map(|d| (current_secs / d).clamp(0.0, 1.0))
}

/// Remaining wall time, `elapsed * (1 / fraction - 1)`.
///
/// `None` before any progress has been made.
#[must_use]
pub fn estimate_eta(wall_elapsed_secs: f64, fraction: f64) -> Option<f64> {
    (fraction > 0.0 && fraction.is_finite())
        .then(|| (wall_elapsed_secs * (1.0 / fraction - 1.0)).max(0.0))
}

/// Handler for encoder events of one conversion.
pub struct FfmpegProgressHandler<'a> {
    reporter: &'a dyn Reporter,
    duration: Option<f64>,
    start_time: Instant,
    last_reported_percent: f64,
    last_logged_threshold: i32,
    last_log_time: Instant,
    error_lines: VecDeque<String>,
    recent_lines: VecDeque<String>,
    last_snapshot: Option<ProgressSnapshot>,
}

impl<'a> FfmpegProgressHandler<'a> {
    pub fn new(duration: Option<f64>, reporter: &'a dyn Reporter) -> Self {
        Self {
            reporter,
            duration: duration.filter(|d| *d > 0.0),
            start_time: Instant::now(),
            last_reported_percent: -1.0,
            last_logged_threshold: -1,
            last_log_time: Instant::now(),
            error_lines: VecDeque::with_capacity(MAX_ERROR_LINES),
            recent_lines: VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES),
            last_snapshot: None,
        }
    }

    /// Handles an encoder event.
    pub fn handle_event(&mut self, event: EncoderEvent) -> CoreResult<()> {
        match event {
            EncoderEvent::Progress { time, speed, frame } => {
                let elapsed = self.start_time.elapsed().as_secs_f64();
                self.handle_progress_at(&time, speed, frame, elapsed);
            }
            EncoderEvent::Log(level, message) => self.handle_log(level, &message),
            EncoderEvent::Error(error) => self.handle_error(&error),
        }
        Ok(())
    }

    /// The most recent error lines, newline-joined.
    #[must_use]
    pub fn error_text(&self) -> String {
        join_lines(&self.error_lines)
    }

    /// Text explaining a failure: the captured error lines, or the last log
    /// lines when ffmpeg reported no explicit error.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        if self.error_lines.is_empty() {
            join_lines(&self.recent_lines)
        } else {
            self.error_text()
        }
    }

    /// Most recent snapshot sent to the reporter.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&ProgressSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Processes one progress line given the wall time since start.
    pub(crate) fn handle_progress_at(&mut self, time: &str, speed: f32, frame: u32, wall_elapsed: f64) {
        let Some(current_secs) = parse_ffmpeg_time(time) else {
            return;
        };

        let fraction = progress_fraction(current_secs, self.duration);
        let percent = fraction.map_or(0.0, |f| f * 100.0);

        // Report on every whole percent, and once at completion
        if fraction.is_some()
            && percent < self.last_reported_percent + 1.0
            && !(percent >= 100.0 && self.last_reported_percent < 100.0)
        {
            return;
        }

        let eta = fraction
            .and_then(|f| estimate_eta(wall_elapsed, f))
            .map(Duration::from_secs_f64);
        let fps = if wall_elapsed > 0.01 {
            (f64::from(frame) / wall_elapsed) as f32
        } else {
            0.0
        };

        let snapshot = ProgressSnapshot {
            percent: percent as f32,
            current_secs,
            total_secs: self.duration,
            speed,
            fps,
            eta,
        };
        self.reporter.encoding_progress(&snapshot);
        self.log_progress_if_needed(&snapshot);

        self.last_reported_percent = percent;
        self.last_snapshot = Some(snapshot);
    }

    fn handle_log(&mut self, level: log::Level, message: &str) {
        self.remember_line(message);

        if level <= log::Level::Error {
            log::error!(target: "ffmpeg_log", "{message}");
            push_capped(&mut self.error_lines, message, MAX_ERROR_LINES);
        } else if looks_like_problem(message) {
            log::warn!(target: "ffmpeg_log", "{message}");
        } else if level == log::Level::Info {
            log::debug!(target: "ffmpeg_log", "{message}");
        } else {
            log::log!(target: "ffmpeg_log", level, "{message}");
        }
    }

    fn handle_error(&mut self, error: &str) {
        self.remember_line(error);

        if is_non_critical_ffmpeg_error(error) {
            log::debug!("ffmpeg non-critical message: {error}");
            return;
        }

        log::error!(target: "ffmpeg_log", "ffmpeg error: {error}");
        push_capped(&mut self.error_lines, error, MAX_ERROR_LINES);
    }

    fn remember_line(&mut self, line: &str) {
        push_capped(&mut self.recent_lines, line, DIAGNOSTIC_TAIL_LINES);
    }

    /// Logs progress every 10% and at least every 5 minutes.
    fn log_progress_if_needed(&mut self, snapshot: &ProgressSnapshot) {
        let percent = f64::from(snapshot.percent);
        let current_threshold = (percent as i32 / 10) * 10;
        let should_log = current_threshold > self.last_logged_threshold
            || percent >= 100.0 && self.last_logged_threshold < 100
            || self.last_log_time.elapsed() >= Duration::from_secs(300);

        if should_log {
            log::info!(
                target: "trackmux::progress",
                "Conversion progress: {:.1}% | Time: {} / {} | Speed: {:.2}x | FPS: {:.1} | ETA: {}",
                percent,
                format_duration(snapshot.current_secs),
                self.duration.map_or_else(|| "??:??:??".to_string(), format_duration),
                snapshot.speed,
                snapshot.fps,
                snapshot
                    .eta
                    .map_or_else(|| "??:??:??".to_string(), |d| format_duration(d.as_secs_f64()))
            );
            self.last_log_time = Instant::now();
            self.last_logged_threshold = current_threshold.max(self.last_logged_threshold);
        }
    }
}

/// Lines ffmpeg prints at info level that still point at a problem.
fn looks_like_problem(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("error") || lower.contains("invalid")
}

/// ffmpeg messages that appear as errors but do not indicate a failed conversion.
fn is_non_critical_ffmpeg_error(error: &str) -> bool {
    error.contains("deprecated pixel format")
        || error.contains("No accelerated colorspace conversion")
        || error.contains("automatically inserted filter")
        || error.contains("Timestamps are unset")
        || error.contains("Queue input is backward")
        || error.contains("first frame is no keyframe")
}

fn push_capped(lines: &mut VecDeque<String>, line: &str, cap: usize) {
    if lines.len() == cap {
        lines.pop_front();
    }
    lines.push_back(line.trim_end().to_string());
}

fn join_lines(lines: &VecDeque<String>) -> String {
    lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        snapshots: Mutex<Vec<ProgressSnapshot>>,
    }

    impl Reporter for RecordingReporter {
        fn encoding_progress(&self, progress: &ProgressSnapshot) {
            self.snapshots.lock().unwrap().push(progress.clone());
        }
    }

    #[test]
    fn fraction_is_capped_and_requires_duration() {
        assert_eq!(progress_fraction(30.0, Some(120.0)), Some(0.25));
        assert_eq!(progress_fraction(150.0, Some(120.0)), Some(1.0));
        assert_eq!(progress_fraction(10.0, None), None);
        assert_eq!(progress_fraction(10.0, Some(0.0)), None);
    }

    #[test]
    fn eta_scales_elapsed_by_remaining_fraction() {
        assert_eq!(estimate_eta(60.0, 0.25), Some(180.0));
        assert_eq!(estimate_eta(60.0, 1.0), Some(0.0));
        assert_eq!(estimate_eta(60.0, 0.0), None);
    }

    #[test]
    fn progress_snapshots_carry_percent_and_eta() {
        let reporter = RecordingReporter::default();
        let mut handler = FfmpegProgressHandler::new(Some(200.0), &reporter);

        handler.handle_progress_at("00:00:50.00", 2.0, 1200, 20.0);
        handler.handle_progress_at("00:00:50.50", 2.0, 1212, 20.2);
        handler.handle_progress_at("00:04:00.00", 2.0, 5000, 80.0);

        let snapshots = reporter.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2, "sub-percent update must be throttled");

        assert!((snapshots[0].percent - 25.0).abs() < 1e-4);
        assert_eq!(snapshots[0].eta, Some(Duration::from_secs(60)));
        assert!((snapshots[0].fps - 60.0).abs() < 1e-4);

        assert!((snapshots[1].percent - 100.0).abs() < 1e-4);
        assert_eq!(snapshots[1].eta, Some(Duration::ZERO));
        assert_eq!(handler.last_snapshot().map(|s| s.current_secs), Some(240.0));
    }

    #[test]
    fn unknown_duration_still_reports_position() {
        let reporter = RecordingReporter::default();
        let mut handler = FfmpegProgressHandler::new(None, &reporter);

        handler.handle_progress_at("00:00:10.00", 1.0, 240, 10.0);
        handler.handle_progress_at("garbage", 1.0, 0, 11.0);

        let snapshots = reporter.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].percent, 0.0);
        assert_eq!(snapshots[0].eta, None);
        assert_eq!(snapshots[0].current_secs, 10.0);
    }

    #[test]
    fn errors_are_buffered_and_noise_is_not() {
        let reporter = RecordingReporter::default();
        let mut handler = FfmpegProgressHandler::new(Some(10.0), &reporter);

        handler
            .handle_event(EncoderEvent::Error("deprecated pixel format used".to_string()))
            .unwrap();
        handler
            .handle_event(EncoderEvent::Error("Conversion failed!".to_string()))
            .unwrap();
        handler
            .handle_event(EncoderEvent::Log(
                log::Level::Error,
                "Subtitle encoding currently only possible from text to text".to_string(),
            ))
            .unwrap();

        assert_eq!(
            handler.error_text(),
            "Conversion failed!\nSubtitle encoding currently only possible from text to text"
        );
        assert!(handler.diagnostics().starts_with("Conversion failed!"));
    }

    #[test]
    fn error_lines_are_capped_to_the_latest() {
        let reporter = RecordingReporter::default();
        let mut handler = FfmpegProgressHandler::new(Some(10.0), &reporter);

        for i in 0..(MAX_ERROR_LINES * 4) {
            handler
                .handle_event(EncoderEvent::Error(format!("decode failure {i}")))
                .unwrap();
        }

        let errors = handler.error_text();
        assert_eq!(errors.lines().count(), MAX_ERROR_LINES);
        assert!(errors.starts_with(&format!("decode failure {}\n", MAX_ERROR_LINES * 3)));
        assert!(errors.ends_with(&format!("decode failure {}", MAX_ERROR_LINES * 4 - 1)));
    }

    #[test]
    fn diagnostics_fall_back_to_recent_log_lines() {
        let reporter = RecordingReporter::default();
        let mut handler = FfmpegProgressHandler::new(Some(10.0), &reporter);

        for i in 0..(DIAGNOSTIC_TAIL_LINES + 5) {
            handler
                .handle_event(EncoderEvent::Log(log::Level::Info, format!("line {i}")))
                .unwrap();
        }

        let diagnostics = handler.diagnostics();
        assert!(diagnostics.starts_with("line 5\n"));
        assert!(diagnostics.ends_with(&format!("line {}", DIAGNOSTIC_TAIL_LINES + 4)));
    }

    #[test]
    fn problem_lines_are_detected_case_insensitively() {
        assert!(looks_like_problem("Invalid data found when processing input"));
        assert!(looks_like_problem("decoding ERROR in frame"));
        assert!(!looks_like_problem("Stream mapping:"));
    }
}
