// trackmux-core/tests/convert_tests.rs

use trackmux_core::config::CoreConfig;
use trackmux_core::error::{ConversionWarning, command_start_error};
use trackmux_core::external::EncoderEvent;
use trackmux_core::external::mocks::{MockFfmpegSpawner, MockMetadataProvider, MockStreamProber};
use trackmux_core::media::{ProbeReport, StreamDescriptor, StreamKind};
use trackmux_core::processing::{
    ConversionContext, ConversionStatus, convert_files, convert_single_file,
};
use trackmux_core::reporting::{BatchStartInfo, Reporter, ReporterError};
use trackmux_core::BatchSummary;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::{TempDir, tempdir};

fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content").expect("Failed to write dummy content");
    file_path
}

fn test_config(input_dir: &TempDir, output_dir: &TempDir) -> CoreConfig {
    CoreConfig::new(
        input_dir.path().to_path_buf(),
        output_dir.path().to_path_buf(),
        output_dir.path().join("logs"),
    )
}

fn audio(index: usize, language: Option<&str>) -> StreamDescriptor {
    let stream = StreamDescriptor::new(index, StreamKind::Audio, "ac3");
    match language {
        Some(lang) => stream.with_language(lang),
        None => stream,
    }
}

fn report(audio_languages: &[Option<&str>], duration: f64) -> ProbeReport {
    let mut streams = vec![StreamDescriptor::new(0, StreamKind::Video, "h264")];
    streams.extend(
        audio_languages
            .iter()
            .enumerate()
            .map(|(idx, lang)| audio(idx, *lang)),
    );
    ProbeReport {
        streams,
        duration: Some(duration),
    }
}

fn output_report(duration: f64) -> ProbeReport {
    ProbeReport {
        streams: Vec::new(),
        duration: Some(duration),
    }
}

fn values_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
    errors: Mutex<Vec<ReporterError>>,
    summary: Mutex<Option<BatchSummary>>,
}

impl RecordingReporter {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn batch_started(&self, info: &BatchStartInfo) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch_started:{}", info.total_files));
    }

    fn file_skipped(&self, input_file: &str, _output_file: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("skipped:{input_file}"));
    }

    fn warning(&self, message: &str) {
        self.events.lock().unwrap().push(format!("warning:{message}"));
    }

    fn error(&self, error: &ReporterError) {
        self.errors.lock().unwrap().push(error.clone());
    }

    fn batch_complete(&self, summary: &BatchSummary) {
        *self.summary.lock().unwrap() = Some(summary.clone());
    }
}

#[test]
fn test_french_track_becomes_first_and_default() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "film.mkv");
    let output = output_dir.path().join("film_converted.mp4");

    let prober = MockStreamProber::new();
    let mut source = report(&[Some("eng"), Some("jpn"), Some("fra")], 120.0);
    source.streams.push(
        StreamDescriptor::new(0, StreamKind::Subtitle, "subrip").with_language("eng"),
    );
    source.streams.push(
        StreamDescriptor::new(1, StreamKind::Subtitle, "subrip")
            .with_language("fre")
            .with_title("Forced"),
    );
    prober.add_report(&input, source);
    prober.add_report(&output, output_report(120.4));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation(
        "film_converted.mp4",
        vec![EncoderEvent::Progress {
            time: "00:02:00.00".to_string(),
            speed: 3.0,
            frame: 2880,
        }],
        true,
    );

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    metadata.set_size(&input, 4_000);
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input.clone()]);

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.status, ConversionStatus::Success, "{:?}", result.error_detail);
    assert_eq!(result.output_path, output);
    assert_eq!(result.input_size, 4_000);
    assert!(result.output_size > 0);
    assert!(result.warnings.is_empty());
    assert!(output.exists());

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(
        values_after(args, "-map"),
        vec!["0:v:0", "0:a:2", "0:a:0", "0:a:1", "0:s:1", "0:s:0"]
    );
    assert_eq!(values_after(args, "-disposition:a:0"), vec!["default"]);
    assert_eq!(values_after(args, "-disposition:a:1"), vec!["0"]);
    assert_eq!(values_after(args, "-metadata:s:a:0"), vec!["language=fra"]);
    assert_eq!(values_after(args, "-disposition:s:0"), vec!["default"]);
    assert_eq!(
        values_after(args, "-metadata:s:s:0"),
        vec!["language=fre", "title=Forced"]
    );
    assert_eq!(args.last().map(String::as_str), output.to_str());

    assert_eq!(prober.probed_paths(), vec![input, output]);
    assert!(report.summary.all_succeeded());
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(*reporter.summary.lock().unwrap(), Some(report.summary.clone()));
    Ok(())
}

#[test]
fn test_missing_target_language_warns_and_keeps_order() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "english.mkv");
    let output = output_dir.path().join("english_converted.mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("eng"), Some("deu")], 60.0));
    prober.add_report(&output, output_report(60.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("english_converted.mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);
    let result = &report.results[0];

    assert_eq!(result.status, ConversionStatus::Success);
    assert_eq!(
        result.warnings,
        vec![ConversionWarning::LanguageNotFound {
            kind: StreamKind::Audio,
            language: "fr".to_string(),
        }]
    );
    assert_eq!(report.summary.warnings, 1);

    let args = &spawner.get_received_calls()[0];
    assert_eq!(values_after(args, "-map"), vec!["0:v:0", "0:a:0", "0:a:1"]);
    assert_eq!(values_after(args, "-disposition:a:0"), vec!["default"]);
    assert!(reporter.events().iter().any(|e| e.starts_with("warning:")));
    Ok(())
}

#[test]
fn test_strict_language_fails_before_ffmpeg() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);
    config.warning_policy.fail_on_missing_language = true;

    let input = create_dummy_file(input_dir.path(), "english.mkv");
    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("eng")], 60.0));

    let spawner = MockFfmpegSpawner::new();
    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);
    let result = &report.results[0];

    assert_eq!(result.status, ConversionStatus::Failed);
    assert!(result.error_detail.as_deref().unwrap().contains("Warning treated as error"));
    assert_eq!(result.warnings.len(), 1);
    assert!(spawner.get_received_calls().is_empty());
    assert!(!report.summary.all_succeeded());
    Ok(())
}

#[test]
fn test_strict_language_ignores_subtitle_miss() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);
    config.warning_policy.fail_on_missing_language = true;

    let input = create_dummy_file(input_dir.path(), "film.mkv");
    let output = output_dir.path().join("film_converted.mp4");
    let prober = MockStreamProber::new();
    let mut source = report(&[Some("fra")], 60.0);
    source.streams.push(
        StreamDescriptor::new(0, StreamKind::Subtitle, "subrip").with_language("eng"),
    );
    prober.add_report(&input, source);
    prober.add_report(&output, output_report(60.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("film_converted.mp4", vec![], true);
    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);
    let result = &report.results[0];

    assert_eq!(result.status, ConversionStatus::Success);
    assert_eq!(
        result.warnings,
        vec![ConversionWarning::LanguageNotFound {
            kind: StreamKind::Subtitle,
            language: "fr".to_string(),
        }]
    );
    assert_eq!(spawner.get_received_calls().len(), 1);
    assert!(output.exists());
    Ok(())
}

#[test]
fn test_existing_output_is_skipped_without_probing() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "done.mkv");
    create_dummy_file(output_dir.path(), "done_converted.mp4");

    let prober = MockStreamProber::new();
    let spawner = MockFfmpegSpawner::new();
    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);

    assert_eq!(report.results[0].status, ConversionStatus::Skipped);
    assert!(prober.probed_paths().is_empty());
    assert!(spawner.get_received_calls().is_empty());
    assert_eq!(report.summary.skipped, 1);
    assert!(report.summary.all_succeeded());
    assert_eq!(
        reporter.events(),
        vec!["batch_started:1".to_string(), "skipped:done.mkv".to_string()]
    );
    Ok(())
}

#[test]
fn test_existing_output_is_overwritten_when_skip_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);
    config.skip_existing = false;

    let input = create_dummy_file(input_dir.path(), "redo.mkv");
    let output = create_dummy_file(output_dir.path(), "redo_converted.mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("fra")], 30.0));
    prober.add_report(&output, output_report(30.0));
    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("redo_converted.mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);
    assert_eq!(report.results[0].status, ConversionStatus::Success);
    assert!(spawner.get_received_calls()[0].contains(&"-y".to_string()));
    Ok(())
}

#[test]
fn test_spawn_failure_keeps_previous_output() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);
    config.skip_existing = false;

    let input = create_dummy_file(input_dir.path(), "film.mkv");
    let output = create_dummy_file(output_dir.path(), "film_converted.mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("fra")], 30.0));
    let spawner = MockFfmpegSpawner::new();
    spawner.add_spawn_error_expectation(
        "film_converted.mp4",
        command_start_error("ffmpeg", io::Error::new(io::ErrorKind::NotFound, "no ffmpeg")),
    );

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);

    assert_eq!(report.results[0].status, ConversionStatus::Failed);
    assert!(output.exists());
    assert_eq!(std::fs::read(&output)?, b"dummy content");
    Ok(())
}

#[test]
fn test_ffmpeg_failure_does_not_halt_batch() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let broken = create_dummy_file(input_dir.path(), "broken.mkv");
    let fine = create_dummy_file(input_dir.path(), "fine.avi");
    let fine_output = output_dir.path().join("fine_converted.mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&broken, report(&[Some("fra")], 90.0));
    prober.add_report(&fine, report(&[Some("fra")], 90.0));
    prober.add_report(&fine_output, output_report(90.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation(
        "broken.mkv",
        vec![EncoderEvent::Error("Error while decoding stream #0:1".to_string())],
        1,
    );
    spawner.add_success_expectation("fine_converted.mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[broken, fine]);

    let statuses: Vec<ConversionStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![ConversionStatus::Failed, ConversionStatus::Success]);
    assert!(report.results[0]
        .error_detail
        .as_deref()
        .unwrap()
        .contains("Error while decoding"));
    assert!(!output_dir.path().join("broken_converted.mp4").exists());

    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed_files[0].0, "broken.mkv");

    let errors = reporter.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context.as_deref(), Some("broken.mkv"));
    Ok(())
}

#[test]
fn test_source_without_audio_fails() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "silent.mkv");
    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[], 10.0));

    let spawner = MockFfmpegSpawner::new();
    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);

    assert_eq!(report.results[0].status, ConversionStatus::Failed);
    assert_eq!(
        report.results[0].error_detail.as_deref(),
        Some("No audio streams found")
    );
    assert!(spawner.get_received_calls().is_empty());
    Ok(())
}

#[test]
fn test_probe_failure_and_bad_input_are_failed_results() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let corrupt = create_dummy_file(input_dir.path(), "corrupt.mkv");
    let wrong_type = create_dummy_file(input_dir.path(), "clip.mov");
    let missing = input_dir.path().join("missing.mkv");

    let prober = MockStreamProber::new();
    prober.add_failure(&corrupt, "Invalid data found when processing input");

    let spawner = MockFfmpegSpawner::new();
    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[corrupt.clone(), wrong_type, missing]);

    assert!(report.results.iter().all(|r| r.status == ConversionStatus::Failed));
    assert_eq!(report.summary.failed, 3);
    assert_eq!(prober.probed_paths(), vec![corrupt]);
    assert!(spawner.get_received_calls().is_empty());
    Ok(())
}

#[test]
fn test_duration_mismatch_warns_or_fails_by_policy() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "short.mkv");
    let output = output_dir.path().join("short_converted.mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("fra")], 100.0));
    prober.add_report(&output, output_report(95.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("short_converted.mp4", vec![], true);
    spawner.add_success_expectation("short_converted.mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    config.skip_existing = false;
    let lenient = convert_files(&ctx, &config, &[input.clone()]);
    assert_eq!(lenient.results[0].status, ConversionStatus::Success);
    assert_eq!(
        lenient.results[0].warnings,
        vec![ConversionWarning::DurationMismatch {
            expected: 100.0,
            actual: 95.0,
        }]
    );

    config.warning_policy.fail_on_duration_mismatch = true;
    let strict = convert_files(&ctx, &config, &[input]);
    assert_eq!(strict.results[0].status, ConversionStatus::Failed);
    assert!(!output.exists(), "rejected output must not be left behind");
    Ok(())
}

#[test]
fn test_subtitles_disabled_maps_audio_only() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let mut config = test_config(&input_dir, &output_dir);
    config.quality.include_subtitles = false;

    let input = create_dummy_file(input_dir.path(), "subs.mkv");
    let output = output_dir.path().join("subs_converted.mp4");

    let prober = MockStreamProber::new();
    let mut source = report(&[Some("fra")], 50.0);
    source
        .streams
        .push(StreamDescriptor::new(0, StreamKind::Subtitle, "subrip").with_language("eng"));
    prober.add_report(&input, source);
    prober.add_report(&output, output_report(50.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("subs_converted.mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_files(&ctx, &config, &[input]);
    assert_eq!(report.results[0].status, ConversionStatus::Success);
    assert!(report.results[0].warnings.is_empty());

    let args = &spawner.get_received_calls()[0];
    assert!(!args.contains(&"-c:s".to_string()));
    assert_eq!(values_after(args, "-map"), vec!["0:v:0", "0:a:0"]);
    Ok(())
}

#[test]
fn test_single_file_uses_explicit_output() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let config = test_config(&input_dir, &output_dir);

    let input = create_dummy_file(input_dir.path(), "movie.avi");
    let output = output_dir.path().join("nested").join("Movie (1999).mp4");

    let prober = MockStreamProber::new();
    prober.add_report(&input, report(&[Some("fr")], 20.0));
    prober.add_report(&output, output_report(20.0));

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("Movie (1999).mp4", vec![], true);

    let reporter = RecordingReporter::default();
    let metadata = MockMetadataProvider::new();
    let ctx = ConversionContext::new(&spawner, &prober, &metadata, &reporter);

    let report = convert_single_file(&ctx, &config, &input, &output);
    assert_eq!(report.results[0].status, ConversionStatus::Success);
    assert_eq!(report.results[0].output_path, output);
    assert!(output.exists());
    Ok(())
}
