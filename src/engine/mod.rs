//! External signal-processing engine
//!
//! clipod never touches samples itself. Every audio change is an
//! [`Invocation`] handed to an [`Engine`]: a list of input files, an
//! optional compiled [`FilterGraph`] and one output file. [`FfmpegEngine`]
//! runs ffmpeg as a subprocess; [`MockEngine`] stands in for it in tests.

mod config;
mod ffmpeg;
mod mock;

pub use config::{EngineConfig, DEFAULT_PROGRAM, ENV_ENGINE_PATH, ENV_ENGINE_TIMEOUT};
pub use ffmpeg::FfmpegEngine;
pub use mock::{MockBehavior, MockEngine};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::graph::FilterGraph;

/// Flags placed before every input: overwrite output, never read stdin.
const GLOBAL_ARGS: [&str; 3] = ["-y", "-nostdin", "-hide_banner"];

/// Something that can execute an [`Invocation`].
///
/// Implementations must write exactly the invocation's output file on
/// success and must never write to an input.
pub trait Engine: Send + Sync {
    /// Program name used in logs and errors.
    fn name(&self) -> &str;

    /// Run to completion. Blocks the calling thread.
    fn run(&self, invocation: &Invocation) -> Result<EngineRun>;
}

/// Successful engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineRun {
    pub stdout: String,
    /// Captured diagnostic output.
    pub stderr: String,
    pub elapsed: Duration,
}

/// One engine input file, optionally windowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub path: PathBuf,
    /// Seconds to skip before reading.
    pub seek: Option<f64>,
    /// Seconds to read.
    pub duration: Option<f64>,
}

/// Everything needed to run the engine once.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    inputs: Vec<Input>,
    graph: Option<FilterGraph>,
    output_args: Vec<String>,
    output: PathBuf,
}

impl Invocation {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            graph: None,
            output_args: Vec::new(),
            output: output.into(),
        }
    }

    /// Append an input. Order matters: the n-th call is input `n` in the graph.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(Input {
            path: path.into(),
            seek: None,
            duration: None,
        });
        self
    }

    /// Append an input read from `seek` for `duration` seconds.
    pub fn input_window(mut self, path: impl Into<PathBuf>, seek: f64, duration: f64) -> Self {
        self.inputs.push(Input {
            path: path.into(),
            seek: Some(seek),
            duration: Some(duration),
        });
        self
    }

    pub fn filter_graph(mut self, graph: FilterGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Extra arguments placed right before the output path.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn graph(&self) -> Option<&FilterGraph> {
        self.graph.as_ref()
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Argument vector, without the program itself.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = GLOBAL_ARGS.iter().map(OsString::from).collect();

        for input in &self.inputs {
            if let Some(seek) = input.seek {
                args.push("-ss".into());
                args.push(seek.to_string().into());
            }
            if let Some(duration) = input.duration {
                args.push("-t".into());
                args.push(duration.to_string().into());
            }
            args.push("-i".into());
            args.push(input.path.clone().into());
        }

        if let Some(graph) = &self.graph {
            args.push("-filter_complex".into());
            args.push(graph.to_filter_complex().into());
            args.push("-map".into());
            args.push(graph.output().to_string().into());
        }

        args.extend(self.output_args.iter().map(OsString::from));
        args.push(self.output.clone().into());
        args
    }

    /// Shell-ish rendering for logs. Not meant to be re-parsed.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in self.args() {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}
