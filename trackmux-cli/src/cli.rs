// trackmux-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trackmux_core::config::languages::DEFAULT_TARGET_LANGUAGE;
use trackmux_core::config::quality::{EncoderPreset, MAX_CRF, QualityPreset};
use trackmux_core::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_SUFFIX};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "trackmux: MKV/AVI to MP4 converter with language-ordered tracks",
    long_about = "Converts MKV and AVI files to MP4 via ffmpeg, reordering audio and subtitle \
                  tracks so the preferred language becomes the default."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging in the run log
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts video files from an input directory (or a single file) to MP4
    Convert(ConvertArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// Input file or directory containing .mkv/.avi files
    #[arg(short = 'i', long = "input", value_name = "INPUT_PATH", default_value = DEFAULT_INPUT_DIR)]
    pub input_path: PathBuf,

    /// Output directory, or an .mp4 filename when the input is a single file
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_PATH", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory for log files (defaults to OUTPUT_DIR/logs)
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a run log
    #[arg(long)]
    pub no_log: bool,

    // --- Quality ---
    /// Named quality preset: high, balanced, compressed
    #[arg(long, value_name = "PRESET")]
    pub quality: Option<QualityPreset>,

    /// x264 CRF (0-51, lower is better quality). Overrides --quality
    #[arg(long, value_name = "CRF", value_parser = clap::value_parser!(u8).range(0..=MAX_CRF as i64))]
    pub crf: Option<u8>,

    /// x264 speed preset (ultrafast .. veryslow). Overrides --quality
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<EncoderPreset>,

    /// Use the VideoToolbox hardware encoder (macOS only)
    #[arg(long)]
    pub gpu: bool,

    // --- Track ordering ---
    /// Language that becomes the default audio and subtitle track
    #[arg(long, value_name = "LANG", env = "TRACKMUX_LANGUAGE", default_value = DEFAULT_TARGET_LANGUAGE)]
    pub language: String,

    /// Original language of the content, ranked right after the target
    #[arg(long, value_name = "LANG")]
    pub original_language: Option<String>,

    /// Further languages ranked after the original, in order
    #[arg(long, value_name = "LANGS", value_delimiter = ',')]
    pub secondary_languages: Vec<String>,

    /// Drop all subtitle tracks
    #[arg(long)]
    pub no_subtitles: bool,

    // --- Batch behaviour ---
    /// Re-convert files whose output already exists
    #[arg(long)]
    pub no_skip_existing: bool,

    /// Suffix inserted before .mp4 in output filenames
    #[arg(long, value_name = "SUFFIX", default_value = DEFAULT_OUTPUT_SUFFIX, allow_hyphen_values = true)]
    pub suffix: String,

    /// Fail a file when no audio track matches the target language
    #[arg(long)]
    pub strict_language: bool,

    /// Fail a file when the output duration drifts from the source
    #[arg(long)]
    pub strict_duration: bool,

    /// Emit machine-readable JSON progress events instead of the terminal UI
    #[arg(long)]
    pub progress_json: bool,
}

/// Parses process arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses an explicit argument list; used by tests.
pub fn parse_cli_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
