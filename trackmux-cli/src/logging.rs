// ============================================================================
// trackmux-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Helpers for the per-run log file
//
// The log backend itself (log4rs, file only) is configured by
// `trackmux_core::file_logging::setup_file_logging` from main.rs. Console
// output goes through the Reporter, never through `log`.

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("trackmux_convert_run_{}.log", trackmux::logging::get_timestamp());
/// assert!(log_filename.ends_with(".log"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Name of the run log written under the log directory.
pub fn run_log_filename() -> String {
    format!("trackmux_convert_run_{}.log", get_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_has_date_and_time_parts() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn run_log_name_is_prefixed() {
        let name = run_log_filename();
        assert!(name.starts_with("trackmux_convert_run_"));
        assert!(name.ends_with(".log"));
    }
}
