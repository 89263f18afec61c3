// ============================================================================
// trackmux-core/src/processing/convert.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Per-file Conversion Pipeline
//
// This module drives the conversion of each input file through the full
// chain and turns every outcome, good or bad, into one ConversionResult.
//
// KEY COMPONENTS:
// - ConversionContext: the injected spawner, prober, metadata provider and
//   reporter
// - convert_files: batch entry point, one result per input
// - convert_file: the per-file pipeline
// - output_path_for: `<stem><suffix>.mp4` naming
//
// WORKFLOW (per file):
// 1. Validate the input path and extension
// 2. Skip when the output already exists (no probe, no ffmpeg)
// 3. Probe streams and duration
// 4. Order audio and subtitle tracks by language priority
// 5. Synthesize and run the ffmpeg command
// 6. Re-probe the output and compare durations
//
// A failure at any step marks that file Failed and the batch moves on.

// ---- Internal crate imports ----
use crate::config::{CoreConfig, OUTPUT_EXTENSION};
use crate::error::{ConversionWarning, CoreError, CoreResult, input_validation_error};
use crate::external::ffmpeg::{
    ConversionJob, SupervisedRun, default_track_label, ordered_labels, run_conversion,
    verify_output_duration,
};
use crate::external::{FfmpegSpawner, FileMetadataProvider, StreamProber};
use crate::media::StreamKind;
use crate::processing::results::{BatchReport, BatchSummary, ConversionResult, ConversionStatus};
use crate::processing::selection::{TrackPlan, select_tracks};
use crate::reporting::{
    BatchStartInfo, ConversionOutcome, FileProgressContext, Reporter, ReporterError,
    TrackPlanSummary,
};
use crate::utils::{format_bytes, get_filename_lossy, has_supported_extension};

// ---- External crate imports ----
use log::{debug, error, info, warn};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ============================================================================
// CONTEXT
// ============================================================================

/// External collaborators of a conversion run.
///
/// Generic so tests can inject the mocks from `external::mocks`.
pub struct ConversionContext<'a, S, P, M>
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    pub spawner: &'a S,
    pub prober: &'a P,
    pub metadata: &'a M,
    pub reporter: &'a dyn Reporter,
}

impl<'a, S, P, M> ConversionContext<'a, S, P, M>
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    pub fn new(spawner: &'a S, prober: &'a P, metadata: &'a M, reporter: &'a dyn Reporter) -> Self {
        Self {
            spawner,
            prober,
            metadata,
            reporter,
        }
    }
}

// ============================================================================
// OUTPUT NAMING
// ============================================================================

/// Output path for `input`: `<output_dir>/<stem><suffix>.mp4`.
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> CoreResult<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        CoreError::PathError(format!("Failed to get filename stem for {}", input.display()))
    })?;
    let mut filename = stem.to_os_string();
    filename.push(suffix);
    filename.push(".");
    filename.push(OUTPUT_EXTENSION);
    Ok(output_dir.join(filename))
}

// ============================================================================
// BATCH ENTRY POINTS
// ============================================================================

/// Converts every file in `files`, in order, into `config.output_dir`.
///
/// Never fails as a whole: each file ends as exactly one
/// [`ConversionResult`], and the summary is sent to the reporter at the end.
pub fn convert_files<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    config: &CoreConfig,
    files: &[PathBuf],
) -> BatchReport
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    let jobs: Vec<(PathBuf, CoreResult<PathBuf>)> = files
        .iter()
        .map(|input| {
            let output = output_path_for(input, &config.output_dir, &config.output_suffix);
            (input.clone(), output)
        })
        .collect();
    run_batch(ctx, config, jobs)
}

/// Converts one file to an explicit output path.
pub fn convert_single_file<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    config: &CoreConfig,
    input: &Path,
    output: &Path,
) -> BatchReport
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    run_batch(ctx, config, vec![(input.to_path_buf(), Ok(output.to_path_buf()))])
}

fn run_batch<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    config: &CoreConfig,
    jobs: Vec<(PathBuf, CoreResult<PathBuf>)>,
) -> BatchReport
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    let total_files = jobs.len();
    info!("Starting batch conversion of {} file(s)", total_files);
    ctx.reporter.batch_started(&BatchStartInfo {
        total_files,
        file_list: jobs.iter().map(|(input, _)| get_filename_lossy(input)).collect(),
        output_dir: config.output_dir.display().to_string(),
    });

    let mut results = Vec::with_capacity(total_files);
    for (position, (input, output)) in jobs.into_iter().enumerate() {
        ctx.reporter.file_progress(&FileProgressContext {
            current_file: position + 1,
            total_files,
            input_file: get_filename_lossy(&input),
        });

        let result = match output {
            Ok(output) => convert_file(ctx, config, &input, &output),
            Err(e) => fail(ctx, &input, PathBuf::new(), &e, 0, Duration::ZERO, Vec::new()),
        };
        info!("----------------------------------------");
        results.push(result);
    }

    let summary = BatchSummary::from_results(&results);
    info!(
        "Batch complete: {} converted, {} skipped, {} failed",
        summary.succeeded, summary.skipped, summary.failed
    );
    ctx.reporter.batch_complete(&summary);

    BatchReport { results, summary }
}

// ============================================================================
// PER-FILE PIPELINE
// ============================================================================

/// Converts `input` into `output` and reports the terminal state.
pub fn convert_file<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    config: &CoreConfig,
    input: &Path,
    output: &Path,
) -> ConversionResult
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    let start_time = Instant::now();
    let filename = get_filename_lossy(input);
    info!("Processing: {}", filename);

    if let Err(e) = validate_input(input) {
        return fail(ctx, input, output.to_path_buf(), &e, 0, start_time.elapsed(), Vec::new());
    }

    let input_size = ctx.metadata.get_size(input).unwrap_or_else(|e| {
        warn!("Could not read size of {}: {}", input.display(), e);
        0
    });

    if config.skip_existing && output.exists() {
        let output_size = ctx.metadata.get_size(output).unwrap_or(0);
        info!(
            "Output {} already exists; skipping {}",
            output.display(),
            filename
        );
        ctx.reporter
            .file_skipped(&filename, &output.display().to_string());
        return ConversionResult::skipped(
            input.to_path_buf(),
            output.to_path_buf(),
            input_size,
            output_size,
        );
    }

    let mut warnings = Vec::new();
    let mut launched = false;
    match run_pipeline(ctx, config, input, output, &mut warnings, &mut launched) {
        Ok(_run) => {
            let output_size = ctx.metadata.get_size(output).unwrap_or_else(|e| {
                warn!("Could not read size of {}: {}", output.display(), e);
                0
            });
            let elapsed = start_time.elapsed();

            info!(
                "Converted {} in {:.1}s: {} -> {}",
                filename,
                elapsed.as_secs_f64(),
                format_bytes(input_size),
                format_bytes(output_size)
            );
            ctx.reporter.conversion_complete(&ConversionOutcome {
                input_file: filename,
                output_file: output.display().to_string(),
                input_size,
                output_size,
                elapsed,
                warnings: warnings.iter().map(ToString::to_string).collect(),
            });

            ConversionResult {
                input_path: input.to_path_buf(),
                output_path: output.to_path_buf(),
                status: ConversionStatus::Success,
                error_detail: None,
                input_size,
                output_size,
                elapsed,
                warnings,
            }
        }
        Err(e) => {
            if launched {
                remove_partial_output(output);
            }
            fail(
                ctx,
                input,
                output.to_path_buf(),
                &e,
                input_size,
                start_time.elapsed(),
                warnings,
            )
        }
    }
}

/// Probe, select, run, verify. `launched` is set once ffmpeg has started
/// and may have written to `output`.
fn run_pipeline<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    config: &CoreConfig,
    input: &Path,
    output: &Path,
    warnings: &mut Vec<ConversionWarning>,
    launched: &mut bool,
) -> CoreResult<SupervisedRun>
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    let policy = config.warning_policy;
    let report = ctx.prober.probe(input)?;
    debug!(
        "{}: {} video, {} audio, {} subtitle stream(s), duration {:?}",
        input.display(),
        report.count(StreamKind::Video),
        report.count(StreamKind::Audio),
        report.count(StreamKind::Subtitle),
        report.duration
    );

    let audio = select_tracks(StreamKind::Audio, &report.streams, &config.audio_languages)?;
    if audio.target_missing {
        record_warning(
            ctx.reporter,
            warnings,
            ConversionWarning::LanguageNotFound {
                kind: StreamKind::Audio,
                language: config.audio_languages.target_label().to_string(),
            },
            policy.fail_on_missing_language,
        )?;
    }

    let subtitle_plan = if config.quality.include_subtitles {
        let subtitles =
            select_tracks(StreamKind::Subtitle, &report.streams, &config.subtitle_languages)?;
        if subtitles.target_missing {
            record_warning(
                ctx.reporter,
                warnings,
                ConversionWarning::LanguageNotFound {
                    kind: StreamKind::Subtitle,
                    language: config.subtitle_languages.target_label().to_string(),
                },
                false,
            )?;
        }
        subtitles.plan
    } else {
        TrackPlan::empty(StreamKind::Subtitle)
    };

    let job = ConversionJob {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        video: report.primary_video().cloned(),
        audio_plan: audio.plan,
        subtitle_plan,
        audio_streams: report.of_kind(StreamKind::Audio),
        subtitle_streams: report.of_kind(StreamKind::Subtitle),
        source_duration: report.duration,
        quality: config.quality.clone(),
    };

    log_track_plan(&job);
    ctx.reporter.track_plan(&TrackPlanSummary {
        input_file: get_filename_lossy(input),
        output_file: output.display().to_string(),
        duration: job.source_duration,
        video: job.video.as_ref().map(|v| v.label()),
        audio_tracks: ordered_labels(&job.audio_plan, &job.audio_streams),
        subtitle_tracks: if job.maps_subtitles() {
            ordered_labels(&job.subtitle_plan, &job.subtitle_streams)
        } else {
            Vec::new()
        },
        encoder: job.quality.effective_video_codec().to_string(),
    });

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let run = run_conversion(ctx.spawner, &job, ctx.reporter, || *launched = true)?;
    if !run.diagnostics.is_empty() {
        debug!("ffmpeg reported errors during a successful run:\n{}", run.diagnostics);
    }

    if let Some(warning) = verify_output_duration(ctx.prober, output, job.source_duration) {
        record_warning(ctx.reporter, warnings, warning, policy.fail_on_duration_mismatch)?;
    }

    Ok(run)
}

// ============================================================================
// HELPERS
// ============================================================================

/// Checks existence, file type and extension of an input.
fn validate_input(input: &Path) -> CoreResult<()> {
    if !input.exists() {
        return Err(input_validation_error(input, "file does not exist"));
    }
    if !input.is_file() {
        return Err(input_validation_error(input, "not a regular file"));
    }
    if !has_supported_extension(input) {
        return Err(input_validation_error(
            input,
            "unsupported extension (expected .mkv or .avi)",
        ));
    }
    Ok(())
}

/// Logs and reports a warning, then promotes it when `promote` is set.
fn record_warning(
    reporter: &dyn Reporter,
    warnings: &mut Vec<ConversionWarning>,
    warning: ConversionWarning,
    promote: bool,
) -> CoreResult<()> {
    warn!("{warning}");
    reporter.warning(&warning.to_string());
    warnings.push(warning.clone());
    if promote {
        Err(CoreError::WarningPromoted(warning))
    } else {
        Ok(())
    }
}

fn log_track_plan(job: &ConversionJob) {
    match &job.video {
        Some(video) => info!("Video: {}", video.label()),
        None => warn!("No video stream in {}", job.input_path.display()),
    }
    for (position, label) in ordered_labels(&job.audio_plan, &job.audio_streams)
        .iter()
        .enumerate()
    {
        info!("Audio {position}: {label}");
    }
    if let Some(default) = default_track_label(&job.audio_plan, &job.audio_streams) {
        info!("Default audio: {default}");
    }
    if job.maps_subtitles() {
        for (position, label) in ordered_labels(&job.subtitle_plan, &job.subtitle_streams)
            .iter()
            .enumerate()
        {
            info!("Subtitle {position}: {label}");
        }
    }
}

/// Builds a Failed result and reports it.
fn fail<S, P, M>(
    ctx: &ConversionContext<'_, S, P, M>,
    input: &Path,
    output: PathBuf,
    err: &CoreError,
    input_size: u64,
    elapsed: Duration,
    warnings: Vec<ConversionWarning>,
) -> ConversionResult
where
    S: FfmpegSpawner,
    P: StreamProber,
    M: FileMetadataProvider,
{
    let filename = get_filename_lossy(input);
    error!("Conversion failed for {}: {}", filename, err);
    ctx.reporter.error(&ReporterError {
        title: "Conversion failed".to_string(),
        message: err.to_string(),
        context: Some(filename),
        suggestion: suggestion_for(err),
    });
    ConversionResult::failed(
        input.to_path_buf(),
        output,
        err.to_string(),
        input_size,
        elapsed,
        warnings,
    )
}

fn suggestion_for(err: &CoreError) -> Option<String> {
    match err {
        CoreError::NoStreams(_) => Some("The source has no audio track to reorder".to_string()),
        CoreError::Probe { .. } => {
            Some("Check that the file is a readable MKV or AVI container".to_string())
        }
        CoreError::CommandStart(..) | CoreError::DependencyNotFound(_) => {
            Some("Make sure ffmpeg and ffprobe are installed and on PATH".to_string())
        }
        CoreError::WarningPromoted(_) => {
            Some("Rerun without the strict option to accept this file".to_string())
        }
        _ => None,
    }
}

/// Deletes what a failed ffmpeg run left behind so a later run does not skip it.
fn remove_partial_output(output: &Path) {
    if output.exists() {
        match std::fs::remove_file(output) {
            Ok(()) => debug!("Removed incomplete output {}", output.display()),
            Err(e) => warn!("Could not remove incomplete output {}: {}", output.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_uses_stem_and_suffix() {
        let out = output_path_for(Path::new("/in/Film.Name.mkv"), Path::new("/out"), "_converted")
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/Film.Name_converted.mp4"));

        let out = output_path_for(Path::new("clip.AVI"), Path::new("out"), "").unwrap();
        assert_eq!(out, PathBuf::from("out/clip.mp4"));

        assert!(output_path_for(Path::new("/"), Path::new("/out"), "_x").is_err());
    }

    #[test]
    fn input_validation_rejects_missing_and_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "x").unwrap();

        assert!(matches!(
            validate_input(&dir.path().join("absent.mkv")),
            Err(CoreError::InputValidation { .. })
        ));
        assert!(validate_input(dir.path()).is_err());
        assert!(validate_input(&text).is_err());

        let mkv = dir.path().join("movie.MKV");
        std::fs::write(&mkv, "x").unwrap();
        assert!(validate_input(&mkv).is_ok());
    }

    #[test]
    fn promoted_warnings_become_errors() {
        let reporter = crate::reporting::NullReporter;
        let mut warnings = Vec::new();
        let warning = ConversionWarning::DurationMismatch {
            expected: 10.0,
            actual: 5.0,
        };

        assert!(record_warning(&reporter, &mut warnings, warning.clone(), false).is_ok());
        let err = record_warning(&reporter, &mut warnings, warning.clone(), true).unwrap_err();
        assert!(matches!(err, CoreError::WarningPromoted(w) if w == warning));
        assert_eq!(warnings.len(), 2);
    }
}
