//! ffmpeg subprocess engine.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{Engine, EngineConfig, EngineRun, Invocation};
use crate::error::{ProcessError, Result};

/// Polling interval while waiting on a child with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for the output readers after a timeout kill.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Runs invocations through an ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    config: EngineConfig,
    name: String,
}

impl FfmpegEngine {
    pub fn new(config: EngineConfig) -> Self {
        let name = config.display_name();
        Self { config, name }
    }

    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the binary: explicit path first, then `PATH`.
    pub fn locate(&self) -> std::result::Result<PathBuf, ProcessError> {
        if let Some(path) = &self.config.binary_path {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(ProcessError::NotFound {
                program: path.display().to_string(),
            });
        }

        which::which(&self.config.program).map_err(|_| ProcessError::NotFound {
            program: self.config.program.clone(),
        })
    }

    /// True when the binary can be located. Does not run it.
    pub fn is_available(&self) -> bool {
        self.locate().is_ok()
    }

    fn spawn(&self, binary: &Path, invocation: &Invocation) -> Result<Child> {
        let mut command = Command::new(binary);
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout also reaches wrapper children.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ProcessError::NotFound {
                    program: self.name.clone(),
                }
                .into()
            } else {
                e.into()
            }
        })
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, invocation: &Invocation) -> Result<EngineRun> {
        let binary = self.locate()?;
        debug!("Running {}", invocation.command_line(&binary.display().to_string()));

        let start = Instant::now();
        let mut child = self.spawn(&binary, invocation)?;
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let waited = match self.config.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout)?,
            None => Some(child.wait()?),
        };

        let Some(status) = waited else {
            let stderr = collect(stderr_reader, Some(KILL_GRACE));
            let timeout = self.config.timeout.unwrap_or_default();
            warn!("{} timed out after {:?}", self.name, timeout);
            return Err(ProcessError::non_zero_exit(
                &self.name,
                None,
                format!("timed out after {timeout:?}\n{stderr}"),
            )
            .into());
        };

        let stdout = collect(stdout_reader, None);
        let stderr = collect(stderr_reader, None);
        let elapsed = start.elapsed();

        if !status.success() {
            warn!("{} exited with {:?}: {}", self.name, status.code(), last_line(&stderr));
            return Err(ProcessError::non_zero_exit(&self.name, status.code(), stderr).into());
        }

        if !stdout.trim().is_empty() {
            debug!("{} stdout:\n{}", self.name, stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr:\n{}", self.name, stderr.trim_end());
        }
        debug!("{} finished in {:.2?}", self.name, elapsed);
        Ok(EngineRun {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// Read a pipe on a separate thread so a chatty child cannot fill it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

/// Join a reader. With `grace`, give up after that long and leave the
/// thread detached; a process outside the killed group may still hold the pipe.
fn collect(handle: Option<JoinHandle<String>>, grace: Option<Duration>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    if let Some(grace) = grace {
        let start = Instant::now();
        while !handle.is_finished() {
            if start.elapsed() > grace {
                return String::new();
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
    handle.join().unwrap_or_default()
}

/// Wait for the child, killing it once `timeout` has passed.
///
/// Returns `None` when the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(e) => {
                terminate(child);
                return Err(e);
            }
        }
        if start.elapsed() > timeout {
            terminate(child);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child's process group (the child alone off unix) and reap it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall; the group was created at spawn.
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn last_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
}
