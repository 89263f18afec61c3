// trackmux-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

use super::{EncoderEvent, FfmpegProcess, FfmpegSpawner, FileMetadataProvider, StreamProber};
use crate::error::{CoreError, CoreResult, probe_error};
use crate::media::ProbeReport;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    // Raw wait status: the exit code sits in the second byte
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code as u32)
}

/// Mock implementation of FfmpegProcess.
#[derive(Clone)]
pub struct MockFfmpegProcess {
    /// Events to emit when handle_events is called.
    pub events_to_emit: Rc<RefCell<Vec<EncoderEvent>>>,
    /// Exit status to return when wait is called.
    pub exit_status: ExitStatus,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(EncoderEvent) -> CoreResult<()>,
    {
        let events = self.events_to_emit.borrow().clone();
        for event in events {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
pub struct MockFfmpegExpectation {
    pub arg_pattern: String,
    pub result: CoreResult<MockFfmpegProcess>,
    pub create_dummy_output: bool,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn consumes the first expectation whose pattern occurs inside any
/// argument. A spawn with no matching expectation panics.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Rc<RefCell<Vec<MockFfmpegExpectation>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_expectation(
        &self,
        arg_pattern: &str,
        result: CoreResult<MockFfmpegProcess>,
        create_dummy_output: bool,
    ) {
        self.expectations.borrow_mut().push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            result,
            create_dummy_output,
        });
    }

    pub fn add_success_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<EncoderEvent>,
        create_dummy_output: bool,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: exit_status(0),
        };
        self.add_expectation(arg_pattern, Ok(process), create_dummy_output);
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.add_expectation(arg_pattern, Err(error), false);
    }

    pub fn add_exit_error_expectation(
        &self,
        arg_pattern: &str,
        events: Vec<EncoderEvent>,
        exit_code: i32,
    ) {
        let process = MockFfmpegProcess {
            events_to_emit: Rc::new(RefCell::new(events)),
            exit_status: exit_status(exit_code),
        };
        self.add_expectation(arg_pattern, Ok(process), false);
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        self.received_calls.borrow_mut().push(args.to_vec());

        let mut expectations = self.expectations.borrow_mut();
        let found_index = expectations
            .iter()
            .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)));

        let Some(index) = found_index else {
            panic!("MockFfmpegSpawner: No expectation found for command args: {args:?}");
        };

        let expectation = expectations.remove(index);
        log::debug!(
            "MockFfmpegSpawner: Matched expectation with pattern '{}'",
            expectation.arg_pattern
        );

        let process = expectation.result?;
        if expectation.create_dummy_output {
            if let Some(output_path) = args.last().map(PathBuf::from) {
                if let Some(parent) = output_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&output_path, b"mock mp4 output")?;
                log::debug!("MockFfmpegSpawner created dummy output file: {output_path:?}");
            }
        }
        Ok(process)
    }
}

/// Mock implementation of StreamProber keyed by path.
///
/// Paths without a registered report fail like an unreadable file.
#[derive(Clone, Default)]
pub struct MockStreamProber {
    reports: Rc<RefCell<HashMap<PathBuf, Result<ProbeReport, String>>>>,
    probed_paths: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockStreamProber {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers the report returned for `path`.
    pub fn add_report(&self, path: &Path, report: ProbeReport) {
        self.reports
            .borrow_mut()
            .insert(path.to_path_buf(), Ok(report));
    }

    /// Makes probing `path` fail with `message`.
    pub fn add_failure(&self, path: &Path, message: &str) {
        self.reports
            .borrow_mut()
            .insert(path.to_path_buf(), Err(message.to_string()));
    }

    /// Every path probed so far, in call order.
    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed_paths.borrow().clone()
    }
}

impl StreamProber for MockStreamProber {
    fn probe(&self, input_path: &Path) -> CoreResult<ProbeReport> {
        self.probed_paths.borrow_mut().push(input_path.to_path_buf());
        match self.reports.borrow().get(input_path) {
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(message)) => Err(probe_error(input_path, message.clone())),
            None => Err(probe_error(input_path, "no mock report registered")),
        }
    }
}

/// Mock implementation of FileMetadataProvider returning fixed sizes.
///
/// Paths without a registered size fall back to the real file system.
#[derive(Clone, Default)]
pub struct MockMetadataProvider {
    sizes: Rc<RefCell<HashMap<PathBuf, u64>>>,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_size(&self, path: &Path, size: u64) {
        self.sizes.borrow_mut().insert(path.to_path_buf(), size);
    }
}

impl FileMetadataProvider for MockMetadataProvider {
    fn get_size(&self, path: &Path) -> CoreResult<u64> {
        match self.sizes.borrow().get(path) {
            Some(size) => Ok(*size),
            None => Ok(std::fs::metadata(path)?.len()),
        }
    }
}
