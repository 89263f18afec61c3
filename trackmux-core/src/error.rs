//! Error types for the trackmux core library.
//!
//! Every failure a single conversion can hit is a [`CoreError`]. The batch
//! orchestrator turns these into `Failed` results, so nothing here ever aborts
//! a whole batch on its own. Non-fatal findings are modelled separately as
//! [`ConversionWarning`].

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::media::StreamKind;

/// Errors produced by trackmux-core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input '{path}': {reason}")]
    InputValidation { path: PathBuf, reason: String },

    #[error("Failed to probe '{path}': {message}")]
    Probe { path: PathBuf, message: String },

    #[error("No {0} streams found")]
    NoStreams(StreamKind),

    #[error("Command '{0}' failed to start: {1}")]
    CommandStart(String, io::Error),

    #[error("Command '{0}' failed while waiting: {1}")]
    CommandWait(String, io::Error),

    #[error("Command '{tool}' exited with {status}: {stderr}")]
    Process {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("No convertible files found in the input directory")]
    NoFilesFound,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Warning treated as error: {0}")]
    WarningPromoted(ConversionWarning),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result alias used throughout the core library.
pub type CoreResult<T> = Result<T, CoreError>;

/// Non-fatal conditions recorded against a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionWarning {
    /// The target language is absent for this kind; the best remaining tier
    /// became the default.
    LanguageNotFound { kind: StreamKind, language: String },
    /// Output duration drifted from the source by more than the tolerance.
    DurationMismatch { expected: f64, actual: f64 },
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LanguageNotFound { kind, language } => write!(
                f,
                "no {kind} track matches target language '{language}'; using best available"
            ),
            Self::DurationMismatch { expected, actual } => write!(
                f,
                "output duration {actual:.2}s differs from source {expected:.2}s by {:.2}s",
                (expected - actual).abs()
            ),
        }
    }
}

// ---- Helper constructors ----

pub fn command_start_error(tool: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), err)
}

pub fn command_wait_error(tool: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(tool.into(), err)
}

pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::Process {
        tool: tool.into(),
        status,
        stderr: stderr.into(),
    }
}

pub fn input_validation_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> CoreError {
    CoreError::InputValidation {
        path: path.into(),
        reason: reason.into(),
    }
}

pub fn probe_error(path: impl Into<PathBuf>, message: impl Into<String>) -> CoreError {
    CoreError::Probe {
        path: path.into(),
        message: message.into(),
    }
}
