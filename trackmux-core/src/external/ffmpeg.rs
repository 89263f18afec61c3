//! ffmpeg argument synthesis and conversion supervision.
//!
//! [`build_ffmpeg_args`] turns a [`ConversionJob`] into the argument vector
//! for one MP4 conversion. [`run_conversion`] runs it through an
//! [`FfmpegSpawner`], feeding progress to the reporter and classifying the
//! outcome. [`verify_output_duration`] re-inspects the finished file.

use crate::config::{DURATION_TOLERANCE_SECS, MOVFLAGS_FASTSTART, QualityConfig};
use crate::error::{ConversionWarning, CoreResult, command_failed_error};
use crate::external::{FfmpegProcess, FfmpegSpawner, StreamProber};
use crate::media::StreamDescriptor;
use crate::processing::progress::FfmpegProgressHandler;
use crate::processing::selection::TrackPlan;
use crate::reporting::{ProgressSnapshot, Reporter};

use log::{debug, info, warn};

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything needed to convert one source file.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// First video stream of the source, if any.
    pub video: Option<StreamDescriptor>,
    pub audio_plan: TrackPlan,
    pub subtitle_plan: TrackPlan,
    /// Source audio descriptors, looked up by `source_index`.
    pub audio_streams: Vec<StreamDescriptor>,
    /// Source subtitle descriptors, looked up by `source_index`.
    pub subtitle_streams: Vec<StreamDescriptor>,
    /// Container duration in seconds, used for percent/ETA.
    pub source_duration: Option<f64>,
    pub quality: QualityConfig,
}

impl ConversionJob {
    /// `true` when subtitle streams will be mapped into the output.
    #[must_use]
    pub fn maps_subtitles(&self) -> bool {
        self.quality.include_subtitles && !self.subtitle_plan.is_empty()
    }
}

/// Builds the ffmpeg argument list (without the program name) for `job`.
///
/// Output position `i` of each kind carries source stream
/// `plan.ordered_indices[i]`; position 0 is the only one flagged default.
#[must_use]
pub fn build_ffmpeg_args(job: &ConversionJob) -> Vec<String> {
    let quality = &job.quality;
    let mut args: Vec<String> = Vec::new();

    push(&mut args, ["-i", &job.input_path.to_string_lossy()]);

    // Video codec
    match quality.hardware_encoder.as_deref() {
        Some(encoder) => push(&mut args, ["-c:v", encoder]),
        None => push(
            &mut args,
            [
                "-c:v",
                &quality.video_codec,
                "-preset",
                quality.encoder_preset.as_str(),
                "-crf",
                &quality.crf.to_string(),
            ],
        ),
    }
    push(&mut args, ["-pix_fmt", &quality.pixel_format]);

    // Audio codec
    push(
        &mut args,
        [
            "-c:a",
            &quality.audio_codec,
            "-b:a",
            &quality.audio_bitrate,
            "-ac",
            &quality.audio_channels.to_string(),
        ],
    );

    if job.video.is_some() {
        push(&mut args, ["-map", "0:v:0"]);
    }

    push_track_mapping(&mut args, &job.audio_plan, &job.audio_streams);

    if job.maps_subtitles() {
        push(&mut args, ["-c:s", &quality.subtitle_codec]);
        push_track_mapping(&mut args, &job.subtitle_plan, &job.subtitle_streams);
    }

    push(
        &mut args,
        ["-movflags", MOVFLAGS_FASTSTART, "-map_metadata", "0", "-y"],
    );
    args.push(job.output_path.to_string_lossy().into_owned());

    args
}

/// Maps, dispositions and per-stream metadata for one kind, in plan order.
fn push_track_mapping(args: &mut Vec<String>, plan: &TrackPlan, streams: &[StreamDescriptor]) {
    let spec = plan.kind.specifier();

    for &source_index in &plan.ordered_indices {
        args.push("-map".to_string());
        args.push(format!("0:{spec}:{source_index}"));
    }

    for (output_index, &source_index) in plan.ordered_indices.iter().enumerate() {
        let disposition = if output_index == 0 { "default" } else { "0" };
        args.push(format!("-disposition:{spec}:{output_index}"));
        args.push(disposition.to_string());

        let Some(stream) = streams.iter().find(|s| s.source_index == source_index) else {
            continue;
        };
        if let Some(language) = &stream.language {
            args.push(format!("-metadata:s:{spec}:{output_index}"));
            args.push(format!("language={language}"));
        }
        if let Some(title) = &stream.title {
            args.push(format!("-metadata:s:{spec}:{output_index}"));
            args.push(format!("title={title}"));
        }
    }
}

fn push<const N: usize>(args: &mut Vec<String>, items: [&str; N]) {
    args.extend(items.iter().map(|s| (*s).to_string()));
}

/// What a successful supervised run observed.
#[derive(Debug, Clone)]
pub struct SupervisedRun {
    pub elapsed: Duration,
    pub last_progress: Option<ProgressSnapshot>,
    /// Error lines ffmpeg printed even though it succeeded.
    pub diagnostics: String,
}

/// Runs ffmpeg for `job` and waits for it to finish.
///
/// `on_spawned` is called once the process has started, before any output
/// can have been written. A spawn failure never calls it.
///
/// Returns `CoreError::Process` when ffmpeg exits non-zero or exits cleanly
/// without leaving the output file behind.
pub fn run_conversion<S, F>(
    spawner: &S,
    job: &ConversionJob,
    reporter: &dyn Reporter,
    on_spawned: F,
) -> CoreResult<SupervisedRun>
where
    S: FfmpegSpawner,
    F: FnOnce(),
{
    let args = build_ffmpeg_args(job);

    if job.video.is_none() {
        warn!(
            "No video stream in {}; converting audio only",
            job.input_path.display()
        );
    }
    if job.source_duration.is_none() {
        warn!("Source duration unknown; progress percentage will not be available.");
    }
    info!("ffmpeg {}", args.join(" "));

    let start_time = Instant::now();
    let mut process = spawner.spawn(&args)?;
    on_spawned();
    reporter.encoding_started(job.source_duration);

    let mut handler = FfmpegProgressHandler::new(job.source_duration, reporter);
    process.handle_events(|event| handler.handle_event(event))?;
    let status = process.wait()?;
    let elapsed = start_time.elapsed();

    if !status.success() {
        let diagnostics = handler.diagnostics();
        warn!(
            "ffmpeg exited with {} for {}",
            status,
            job.input_path.display()
        );
        return Err(command_failed_error("ffmpeg", status, diagnostics));
    }

    if !job.output_path.is_file() {
        return Err(command_failed_error(
            "ffmpeg",
            status,
            format!(
                "exited successfully but {} was not created",
                job.output_path.display()
            ),
        ));
    }

    debug!(
        "ffmpeg finished in {:.1}s for {}",
        elapsed.as_secs_f64(),
        job.input_path.display()
    );

    Ok(SupervisedRun {
        elapsed,
        last_progress: handler.last_snapshot().cloned(),
        diagnostics: handler.error_text(),
    })
}

/// Re-probes `output` and compares its duration with the source's.
///
/// Only a drift above [`DURATION_TOLERANCE_SECS`] produces a warning. When
/// either duration is unknown, or the re-probe fails, the check is skipped
/// with a log line.
pub fn verify_output_duration<P: StreamProber + ?Sized>(
    prober: &P,
    output: &Path,
    expected: Option<f64>,
) -> Option<ConversionWarning> {
    let Some(expected) = expected else {
        debug!("Skipping duration check for {}: source duration unknown", output.display());
        return None;
    };

    let actual = match prober.probe(output) {
        Ok(report) => report.duration?,
        Err(e) => {
            warn!("Could not re-probe {} to verify duration: {}", output.display(), e);
            return None;
        }
    };

    let difference = (expected - actual).abs();
    if difference > DURATION_TOLERANCE_SECS {
        warn!(
            "Duration mismatch for {}: source {:.2}s, output {:.2}s",
            output.display(),
            expected,
            actual
        );
        Some(ConversionWarning::DurationMismatch { expected, actual })
    } else {
        debug!("Duration verified for {} ({difference:.2}s drift)", output.display());
        None
    }
}

/// Label of a stream kind's default track, for logs.
pub(crate) fn default_track_label(plan: &TrackPlan, streams: &[StreamDescriptor]) -> Option<String> {
    let index = plan.default_index?;
    streams
        .iter()
        .find(|s| s.source_index == index)
        .map(StreamDescriptor::label)
}

/// Streams in output order, for reporting.
pub(crate) fn ordered_labels(plan: &TrackPlan, streams: &[StreamDescriptor]) -> Vec<String> {
    plan.ordered_indices
        .iter()
        .filter_map(|&idx| streams.iter().find(|s| s.source_index == idx))
        .map(StreamDescriptor::label)
        .collect()
}
