//! Mock engine for testing
//!
//! Never spawns a process. Each run is recorded and answered according to
//! the configured [`MockBehavior`], so session and mix logic can be checked
//! without ffmpeg installed.

use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{Engine, EngineRun, Invocation};
use crate::error::{ClipodError, ProcessError, Result};

/// What a [`MockEngine`] does when run.
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Write these bytes to the output.
    WriteOutput(Vec<u8>),
    /// Copy the n-th input to the output.
    CopyInput(usize),
    /// Write all inputs back to back.
    ConcatInputs,
    /// Exit non-zero without touching the output.
    Fail { code: i32, stderr: String },
    /// Behave as if the binary were not installed.
    Missing,
}

pub struct MockEngine {
    behavior: Mutex<MockBehavior>,
    calls: Mutex<Vec<Invocation>>,
    delay: Option<Duration>,
}

impl MockEngine {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn writing(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(MockBehavior::WriteOutput(bytes.into()))
    }

    pub fn failing(code: i32, stderr: impl Into<String>) -> Self {
        Self::new(MockBehavior::Fail {
            code,
            stderr: stderr.into(),
        })
    }

    pub fn missing() -> Self {
        Self::new(MockBehavior::Missing)
    }

    /// Sleep this long inside every run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *lock(&self.behavior) = behavior;
    }

    /// Every invocation seen so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        lock(&self.calls).last().cloned()
    }
}

impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock-engine"
    }

    fn run(&self, invocation: &Invocation) -> Result<EngineRun> {
        let start = Instant::now();
        lock(&self.calls).push(invocation.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let behavior = lock(&self.behavior).clone();
        let output = invocation.output();
        match behavior {
            MockBehavior::WriteOutput(bytes) => write_output(output, &bytes)?,
            MockBehavior::CopyInput(index) => {
                let input = invocation.inputs().get(index).ok_or_else(|| {
                    ProcessError::non_zero_exit(self.name(), Some(1), format!("no input #{index}"))
                })?;
                let bytes = read_input(&input.path)?;
                write_output(output, &bytes)?;
            }
            MockBehavior::ConcatInputs => {
                let mut bytes = Vec::new();
                for input in invocation.inputs() {
                    bytes.extend(read_input(&input.path)?);
                }
                write_output(output, &bytes)?;
            }
            MockBehavior::Fail { code, stderr } => {
                return Err(ProcessError::non_zero_exit(self.name(), Some(code), stderr).into());
            }
            MockBehavior::Missing => {
                return Err(ProcessError::NotFound {
                    program: self.name().to_string(),
                }
                .into());
            }
        }

        Ok(EngineRun {
            elapsed: start.elapsed(),
            ..EngineRun::default()
        })
    }
}

fn read_input(path: &std::path::Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ClipodError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_output(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ClipodError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
