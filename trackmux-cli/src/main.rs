//! Main entry point for the trackmux CLI application.
//!
//! Parses arguments, resolves the output path, sets up the run log and
//! dispatches to the convert command. Exits with status 1 when any file
//! failed or the batch could not start.

use trackmux::error::{CliErrorContext, CliResult};
use trackmux::logging::run_log_filename;
use trackmux::output_path::resolve_output_path;
use trackmux::{Commands, discover_convert_files, parse_cli, run_convert};
use trackmux_core::BatchSummary;
use trackmux_core::file_logging::setup_file_logging;
use trackmux_core::reporting::{JsonReporter, Reporter, TerminalReporter};

use console::style;
use log::LevelFilter;

fn main() {
    match run() {
        Ok(summary) if summary.all_succeeded() => {}
        Ok(summary) => {
            log::error!("{} file(s) failed", summary.failed);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> CliResult<BatchSummary> {
    let cli_args = parse_cli();

    let log_level = if cli_args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match cli_args.command {
        Commands::Convert(args) => {
            // Resolve before discovery so an output filename is never created as a directory.
            let output_info = resolve_output_path(&args.input_path, &args.output_dir)?;

            let mut corrected_args = args;
            corrected_args.output_dir = output_info.output_dir;

            let (discovered_files, effective_input_dir) =
                discover_convert_files(&corrected_args)?;

            let log_dir = corrected_args
                .log_dir
                .clone()
                .unwrap_or_else(|| corrected_args.output_dir.join("logs"));

            if !corrected_args.no_log {
                let main_log_path = log_dir.join(run_log_filename());

                std::fs::create_dir_all(&log_dir).cli_with_context(|| {
                    format!("Failed to create log directory: {}", log_dir.display())
                })?;

                setup_file_logging(&main_log_path, log_level).cli_with_context(|| {
                    format!("Failed to set up file logging to {}", main_log_path.display())
                })?;

                log::info!("trackmux {} starting", env!("CARGO_PKG_VERSION"));
                if log_level == LevelFilter::Debug {
                    log::debug!("Debug level logging enabled");
                }
            }

            let reporter: Box<dyn Reporter> = if corrected_args.progress_json {
                Box::new(JsonReporter::new())
            } else {
                Box::new(TerminalReporter::new())
            };

            run_convert(
                corrected_args,
                discovered_files,
                effective_input_dir,
                output_info.filename_override,
                reporter.as_ref(),
            )
        }
    }
}
