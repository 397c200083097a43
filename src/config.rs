use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::{DEFAULT_EXECUTABLE, DEFAULT_TIMEOUT_SECS};

/// Settings shared by every scenario of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    // Caller to test, looked up on PATH when not a path
    pub executable: PathBuf,
    // Time budget for each invocation
    pub timeout: Duration,
    // Scenarios run concurrently; 1 keeps the run sequential
    pub threads: usize,
    // Keep scratch directories instead of removing them after each scenario
    pub keep_output: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            threads: 1,
            keep_output: false,
        }
    }
}

impl RunConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_keep_output(mut self, keep_output: bool) -> Self {
        self.keep_output = keep_output;
        self
    }
}
