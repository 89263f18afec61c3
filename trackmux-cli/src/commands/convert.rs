//! Implementation of the 'convert' subcommand.
//!
//! Handles file discovery, turns the parsed flags into a validated
//! [`CoreConfig`], checks for ffmpeg/ffprobe and hands the batch to
//! trackmux-core.

use crate::cli::ConvertArgs;
use crate::error::{CliErrorContext, CliResult};

use trackmux_core::config::DEFAULT_HARDWARE_ENCODER;
use trackmux_core::external::{
    FfprobeProber, SidecarSpawner, StdFsMetadataProvider, check_dependency, is_macos,
};
use trackmux_core::reporting::Reporter;
use trackmux_core::utils::has_supported_extension;
use trackmux_core::{
    BatchSummary, ConversionContext, CoreConfig, CoreError, LanguagePriority, QualityConfig,
    WarningPolicy, convert_files, convert_single_file,
};

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

/// Discovers .mkv/.avi files from the input path (file or directory).
///
/// Returns `(files, effective_input_dir)`. An input directory without
/// eligible files yields an empty list rather than an error.
pub fn discover_convert_files(args: &ConvertArgs) -> CliResult<(Vec<PathBuf>, PathBuf)> {
    let input_path = args.input_path.canonicalize().map_err(|e| {
        CoreError::PathError(format!(
            "Invalid input path '{}': {}",
            args.input_path.display(),
            e
        ))
    })?;

    let metadata = fs::metadata(&input_path).map_err(|e| {
        CoreError::PathError(format!(
            "Failed to access input path '{}': {}",
            input_path.display(),
            e
        ))
    })?;

    if metadata.is_dir() {
        match trackmux_core::find_processable_files(&input_path) {
            Ok(files) => Ok((files, input_path)),
            Err(CoreError::NoFilesFound) => Ok((Vec::new(), input_path)),
            Err(e) => Err(e),
        }
    } else if metadata.is_file() {
        if !has_supported_extension(&input_path) {
            return Err(CoreError::OperationFailed(format!(
                "Input file '{}' is not a .mkv or .avi file",
                input_path.display()
            )));
        }
        let parent_dir = input_path
            .parent()
            .cli_with_context(|| {
                format!(
                    "Could not determine parent directory for file '{}'",
                    input_path.display()
                )
            })?
            .to_path_buf();
        Ok((vec![input_path], parent_dir))
    } else {
        Err(CoreError::OperationFailed(format!(
            "Input path '{}' is neither a file nor a directory",
            input_path.display()
        )))
    }
}

/// Builds and validates the core configuration from CLI arguments.
pub fn create_core_config(
    args: &ConvertArgs,
    effective_input_dir: PathBuf,
    output_dir: PathBuf,
    log_dir: PathBuf,
) -> CliResult<CoreConfig> {
    let mut config = CoreConfig::new(effective_input_dir, output_dir, log_dir);

    config.quality = QualityConfig::resolve(args.quality, args.crf, args.preset);
    config.quality.include_subtitles = !args.no_subtitles;
    if args.gpu {
        config.quality.hardware_encoder = Some(DEFAULT_HARDWARE_ENCODER.to_string());
    }

    config.set_languages(LanguagePriority::new(
        &args.language,
        args.original_language.as_deref(),
        &args.secondary_languages,
    ));

    config.warning_policy = WarningPolicy {
        fail_on_missing_language: args.strict_language,
        fail_on_duration_mismatch: args.strict_duration,
    };
    config.skip_existing = !args.no_skip_existing;
    config.output_suffix = args.suffix.clone();

    config.validate()?;
    Ok(config)
}

/// Runs the conversion batch and returns its summary.
///
/// `args.output_dir` must already be the resolved output directory; when
/// `target_filename_override` is set the single discovered file is written
/// to exactly that name inside it.
pub fn run_convert(
    args: ConvertArgs,
    discovered_files: Vec<PathBuf>,
    effective_input_dir: PathBuf,
    target_filename_override: Option<OsString>,
    reporter: &dyn Reporter,
) -> CliResult<BatchSummary> {
    if discovered_files.is_empty() {
        warn!("No .mkv or .avi files found in {}", effective_input_dir.display());
        reporter.warning(&format!(
            "No .mkv or .avi files found in {}",
            effective_input_dir.display()
        ));
        return Ok(BatchSummary::default());
    }

    let output_dir = args.output_dir.clone();
    let log_dir = args
        .log_dir
        .clone()
        .unwrap_or_else(|| output_dir.join("logs"));

    let config = create_core_config(&args, effective_input_dir, output_dir, log_dir)?;

    if config.quality.hardware_encoder.is_some() && !is_macos() {
        let msg = format!(
            "--gpu selects {}, which is only available on macOS",
            DEFAULT_HARDWARE_ENCODER
        );
        warn!("{}", msg);
        reporter.warning(&msg);
    }

    check_dependency("ffmpeg")?;
    check_dependency("ffprobe")?;

    fs::create_dir_all(&config.output_dir).cli_with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            config.output_dir.display()
        )
    })?;

    info!(
        "Converting {} file(s) from {} to {}",
        discovered_files.len(),
        config.input_dir.display(),
        config.output_dir.display()
    );
    debug!("Configuration: {:?}", config);

    let prober = FfprobeProber::new();
    let ctx = ConversionContext::new(&SidecarSpawner, &prober, &StdFsMetadataProvider, reporter);

    let report = match (target_filename_override, discovered_files.as_slice()) {
        (Some(filename), [single]) => {
            let output = config.output_dir.join(filename);
            convert_single_file(&ctx, &config, single, &output)
        }
        (Some(_), _) => {
            warn!("Output filename ignored: more than one input file");
            convert_files(&ctx, &config, &discovered_files)
        }
        (None, _) => convert_files(&ctx, &config, &discovered_files),
    };

    info!(
        "Batch finished: {} succeeded, {} skipped, {} failed",
        report.summary.succeeded, report.summary.skipped, report.summary.failed
    );

    Ok(report.summary)
}
