use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::processing::results::BatchSummary;
use crate::utils::{format_bytes, format_duration};

/// Batch start metadata.
#[derive(Clone, Debug)]
pub struct BatchStartInfo {
    pub total_files: usize,
    pub file_list: Vec<String>,
    pub output_dir: String,
}

/// Current file index within a batch.
#[derive(Clone, Debug)]
pub struct FileProgressContext {
    pub current_file: usize,
    pub total_files: usize,
    pub input_file: String,
}

/// Track layout chosen for one file, in output order.
#[derive(Clone, Debug)]
pub struct TrackPlanSummary {
    pub input_file: String,
    pub output_file: String,
    pub duration: Option<f64>,
    pub video: Option<String>,
    pub audio_tracks: Vec<String>,
    pub subtitle_tracks: Vec<String>,
    pub encoder: String,
}

/// Snapshot of encoding progress.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSnapshot {
    pub percent: f32,
    pub current_secs: f64,
    pub total_secs: Option<f64>,
    pub speed: f32,
    pub fps: f32,
    pub eta: Option<Duration>,
}

/// Final outcome of one successful conversion.
#[derive(Clone, Debug)]
pub struct ConversionOutcome {
    pub input_file: String,
    pub output_file: String,
    pub input_size: u64,
    pub output_size: u64,
    pub elapsed: Duration,
    pub warnings: Vec<String>,
}

/// High-level error message.
#[derive(Clone, Debug)]
pub struct ReporterError {
    pub title: String,
    pub message: String,
    pub context: Option<String>,
    pub suggestion: Option<String>,
}

/// Reporter interface implemented by both human-readable and JSON reporters.
pub trait Reporter: Send + Sync {
    fn batch_started(&self, _info: &BatchStartInfo) {}
    fn file_progress(&self, _context: &FileProgressContext) {}
    fn file_skipped(&self, _input_file: &str, _output_file: &str) {}
    fn track_plan(&self, _summary: &TrackPlanSummary) {}
    fn encoding_started(&self, _duration: Option<f64>) {}
    fn encoding_progress(&self, _progress: &ProgressSnapshot) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _error: &ReporterError) {}
    fn conversion_complete(&self, _outcome: &ConversionOutcome) {}
    fn batch_complete(&self, _summary: &BatchSummary) {}
}

/// No-op reporter that discards all updates.
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Human-friendly reporter that prints concise text output.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
    max_percent: Mutex<f32>,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
            max_percent: Mutex::new(0.0),
        }
    }

    fn finish_progress(&self) {
        if let Ok(mut guard) = self.progress.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        if let Ok(mut max_percent) = self.max_percent.lock() {
            *max_percent = 0.0;
        }
    }

    /// Prints above the active bar so its redraw does not overwrite the line.
    fn print_line(&self, line: &str) {
        match self.progress.lock() {
            Ok(guard) if guard.is_some() => {
                if let Some(pb) = guard.as_ref() {
                    pb.println(line);
                }
            }
            _ => println!("{line}"),
        }
    }

    fn update_progress_bar(&self, progress: &ProgressSnapshot) {
        let Ok(guard) = self.progress.lock() else {
            return;
        };
        let Some(pb) = guard.as_ref() else {
            return;
        };
        let Ok(mut max_percent) = self.max_percent.lock() else {
            return;
        };

        let clamped = progress.percent.clamp(0.0, 100.0);
        if clamped >= *max_percent {
            *max_percent = clamped;
            pb.set_position(clamped as u64);
        }

        let eta = progress
            .eta
            .map_or_else(|| "--:--:--".to_string(), |d| format_duration(d.as_secs_f64()));
        pb.set_message(format!(
            "speed {:.1}x, fps {:.1}, eta {}",
            progress.speed, progress.fps, eta
        ));
    }
}

impl Reporter for TerminalReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        println!("\n{}", style("BATCH").bold().cyan());
        println!(
            "  Converting {} files -> {}",
            info.total_files,
            style(&info.output_dir).bold()
        );
        for (idx, name) in info.file_list.iter().enumerate() {
            println!("  {}. {}", idx + 1, name);
        }
    }

    fn file_progress(&self, context: &FileProgressContext) {
        println!(
            "\nFile {} of {}: {}",
            style(context.current_file.to_string()).bold(),
            context.total_files,
            context.input_file
        );
    }

    fn file_skipped(&self, input_file: &str, output_file: &str) {
        println!(
            "  {} {} ({} already exists)",
            style("Skipped").yellow().bold(),
            input_file,
            output_file
        );
    }

    fn track_plan(&self, summary: &TrackPlanSummary) {
        println!("\n{}", style("TRACKS").bold().cyan());
        println!("  {:<10} {}", style("Output:").bold(), summary.output_file);
        if let Some(duration) = summary.duration {
            println!("  {:<10} {}", style("Duration:").bold(), format_duration(duration));
        }
        println!("  {:<10} {}", style("Encoder:").bold(), summary.encoder);
        println!(
            "  {:<10} {}",
            style("Video:").bold(),
            summary.video.as_deref().unwrap_or("none")
        );
        for (pos, track) in summary.audio_tracks.iter().enumerate() {
            let marker = if pos == 0 { style("default").green().to_string() } else { String::new() };
            println!("  {:<10} a:{} {} {}", style("Audio:").bold(), pos, track, marker);
        }
        for (pos, track) in summary.subtitle_tracks.iter().enumerate() {
            let marker = if pos == 0 { style("default").green().to_string() } else { String::new() };
            println!("  {:<10} s:{} {} {}", style("Subtitle:").bold(), pos, track, marker);
        }
    }

    fn encoding_started(&self, duration: Option<f64>) {
        self.finish_progress();
        let pb = match duration {
            Some(_) => ProgressBar::new(100),
            None => ProgressBar::new_spinner(),
        };
        let style = ProgressStyle::default_bar()
            .template("Converting [{bar:40}] {percent:>3}% | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut guard) = self.progress.lock() {
            *guard = Some(pb);
        }
    }

    fn encoding_progress(&self, progress: &ProgressSnapshot) {
        self.update_progress_bar(progress);
    }

    fn warning(&self, message: &str) {
        self.print_line(&style(format!("WARN: {}", message)).yellow().bold().to_string());
    }

    fn error(&self, error: &ReporterError) {
        self.finish_progress();
        eprintln!(
            "\n{} {}",
            style("ERROR").red().bold(),
            style(&error.title).red().bold()
        );
        eprintln!("  {}", error.message);
        if let Some(ctx) = &error.context {
            eprintln!("  Context: {}", ctx);
        }
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  Suggestion: {}", suggestion);
        }
    }

    fn conversion_complete(&self, outcome: &ConversionOutcome) {
        self.finish_progress();
        println!("\n{}", style("RESULT").bold().cyan());
        println!(
            "  {} {}",
            style("Output:").bold(),
            style(&outcome.output_file).green()
        );
        println!(
            "  Size: {} -> {} ({:.1}% of original)",
            format_bytes(outcome.input_size),
            format_bytes(outcome.output_size),
            size_ratio(outcome.input_size, outcome.output_size)
        );
        println!("  Time: {}", format_duration(outcome.elapsed.as_secs_f64()));
        for warning in &outcome.warnings {
            println!("  {}", style(format!("warning: {warning}")).yellow());
        }
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        println!("\n{}", style("BATCH SUMMARY").bold().cyan());
        println!(
            "  {} converted, {} skipped, {} failed (of {})",
            style(summary.succeeded.to_string()).green().bold(),
            style(summary.skipped.to_string()).yellow(),
            style(summary.failed.to_string()).red().bold(),
            summary.total_files
        );
        if summary.succeeded > 0 {
            println!(
                "  Size: {} -> {} ({:.1}% of original)",
                format_bytes(summary.total_input_size),
                format_bytes(summary.total_output_size),
                size_ratio(summary.total_input_size, summary.total_output_size)
            );
        }
        if summary.warnings > 0 {
            println!("  Warnings: {}", style(summary.warnings.to_string()).yellow());
        }
        println!("  Time: {}", format_duration(summary.total_elapsed.as_secs_f64()));
        for (file, reason) in &summary.failed_files {
            println!("  - {} {}: {}", style("failed").red(), file, reason);
        }
    }
}

/// JSON-lines reporter for machine consumers.
pub struct JsonReporter {
    writer: Mutex<Box<dyn Write + Send>>,
    last_progress_bucket: Mutex<i32>,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            last_progress_bucket: Mutex::new(-1),
        }
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn write_value(&self, value: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", value);
            let _ = writer.flush();
        }
    }
}

impl Reporter for JsonReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        self.write_value(json!({
            "type": "batch_started",
            "total_files": info.total_files,
            "files": info.file_list,
            "output_dir": info.output_dir,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_progress(&self, context: &FileProgressContext) {
        self.write_value(json!({
            "type": "file_progress",
            "current_file": context.current_file,
            "total_files": context.total_files,
            "input_file": context.input_file,
            "timestamp": Self::timestamp(),
        }));
    }

    fn file_skipped(&self, input_file: &str, output_file: &str) {
        self.write_value(json!({
            "type": "file_skipped",
            "input_file": input_file,
            "output_file": output_file,
            "timestamp": Self::timestamp(),
        }));
    }

    fn track_plan(&self, summary: &TrackPlanSummary) {
        self.write_value(json!({
            "type": "track_plan",
            "input_file": summary.input_file,
            "output_file": summary.output_file,
            "duration_seconds": summary.duration,
            "video": summary.video,
            "audio_tracks": summary.audio_tracks,
            "subtitle_tracks": summary.subtitle_tracks,
            "encoder": summary.encoder,
            "timestamp": Self::timestamp(),
        }));
    }

    fn encoding_started(&self, _duration: Option<f64>) {
        if let Ok(mut bucket) = self.last_progress_bucket.lock() {
            *bucket = -1;
        }
    }

    fn encoding_progress(&self, progress: &ProgressSnapshot) {
        let bucket = (progress.percent as i32) / 5;
        {
            let Ok(mut guard) = self.last_progress_bucket.lock() else {
                return;
            };
            if bucket <= *guard && progress.percent < 99.0 {
                return;
            }
            *guard = bucket;
        }

        self.write_value(json!({
            "type": "encoding_progress",
            "percent": progress.percent,
            "current_seconds": progress.current_secs,
            "total_seconds": progress.total_secs,
            "speed": progress.speed,
            "fps": progress.fps,
            "eta_seconds": progress.eta.map(|d| d.as_secs()),
            "timestamp": Self::timestamp(),
        }));
    }

    fn warning(&self, message: &str) {
        self.write_value(json!({
            "type": "warning",
            "message": message,
            "timestamp": Self::timestamp(),
        }));
    }

    fn error(&self, error: &ReporterError) {
        self.write_value(json!({
            "type": "error",
            "title": error.title,
            "message": error.message,
            "context": error.context,
            "suggestion": error.suggestion,
            "timestamp": Self::timestamp(),
        }));
    }

    fn conversion_complete(&self, outcome: &ConversionOutcome) {
        self.write_value(json!({
            "type": "conversion_complete",
            "input_file": outcome.input_file,
            "output_file": outcome.output_file,
            "input_size": outcome.input_size,
            "output_size": outcome.output_size,
            "elapsed_seconds": outcome.elapsed.as_secs(),
            "size_ratio_percent": size_ratio(outcome.input_size, outcome.output_size),
            "warnings": outcome.warnings,
            "timestamp": Self::timestamp(),
        }));
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        let failed: Vec<_> = summary
            .failed_files
            .iter()
            .map(|(file, reason)| json!({ "file": file, "reason": reason }))
            .collect();

        self.write_value(json!({
            "type": "batch_complete",
            "total_files": summary.total_files,
            "succeeded": summary.succeeded,
            "skipped": summary.skipped,
            "failed": summary.failed,
            "warnings": summary.warnings,
            "total_input_size": summary.total_input_size,
            "total_output_size": summary.total_output_size,
            "total_elapsed_seconds": summary.total_elapsed.as_secs(),
            "failed_files": failed,
            "timestamp": Self::timestamp(),
        }));
    }
}

fn size_ratio(original: u64, converted: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        converted as f64 / original as f64 * 100.0
    }
}
