// ============================================================================
// trackmux-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and a context helper over CoreError
//
// The CLI has no error type of its own. Setup failures (log directory, log
// backend, output directory) become `CoreError::OperationFailed` with a
// prefix naming the step, so `main` prints one uniform message.

use trackmux_core::{CoreError, CoreResult};

use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Attaches a lazily built description of the failed step.
pub trait CliErrorContext<T> {
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

/// Any displayable error: `io::Error` from the filesystem and the
/// `anyhow::Error` returned by the log4rs setup.
impl<T, E: fmt::Display> CliErrorContext<T> for Result<T, E> {
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| CoreError::OperationFailed(format!("{}: {}", f(), e)))
    }
}

/// A missing value becomes the description alone.
impl<T> CliErrorContext<T> for Option<T> {
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| CoreError::OperationFailed(f().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn failed_step_is_prefixed() {
        let failed: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = failed
            .cli_with_context(|| "Failed to create log directory: /tmp/logs")
            .unwrap_err();
        match err {
            CoreError::OperationFailed(msg) => {
                assert_eq!(msg, "Failed to create log directory: /tmp/logs: gone")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_value_uses_the_description() {
        let missing: Option<u8> = None;
        let err = missing.cli_with_context(|| "no parent directory").unwrap_err();
        assert!(matches!(err, CoreError::OperationFailed(ref m) if m == "no parent directory"));
        assert_eq!(Some(3).cli_with_context(|| "unused").unwrap(), 3);
    }
}
