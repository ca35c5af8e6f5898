//! Error handling for clipod
//!
//! Three kinds of failure reach callers: layout problems (fix the input),
//! engine problems (ffmpeg missing or rejecting the request) and filesystem
//! problems. None of them leaves the working file partially written.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for clipod operations
pub type Result<T> = std::result::Result<T, ClipodError>;

/// Malformed or semantically invalid layout data.
///
/// Segment indices in messages are 1-based, matching what a user sees in
/// the layout editor.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Layout file not found: {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layout JSON: {path}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Layout must be a JSON object")]
    NotAnObject,

    #[error("Layout must include a 'segments' array")]
    MissingSegments,

    #[error("Layout 'segments' must be a list")]
    SegmentsNotList,

    #[error("Segment {index} must be an object")]
    SegmentNotObject { index: usize },

    #[error("Segment {index} missing '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Segment {index} 'file' must be a string")]
    FileNotString { index: usize },

    #[error("Segment {index} has invalid numeric value for '{field}'")]
    InvalidNumber { index: usize, field: &'static str },

    #[error("BGM file not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Segment {index} has invalid start/end: start={start}, end={end}")]
    InvalidTiming { index: usize, start: f64, end: f64 },

    #[error("Segment {index} has invalid offset: {offset}")]
    InvalidOffset { index: usize, offset: f64 },

    #[error("Segment {index} has invalid volume: {volume}")]
    InvalidVolume { index: usize, volume: f64 },

    #[error("Segment {index} has invalid fade durations: in={fade_in}, out={fade_out}")]
    InvalidFade {
        index: usize,
        fade_in: f64,
        fade_out: f64,
    },

    #[error("Segment duration must be positive (segment {index}, duration {duration})")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("Cannot compile a filter graph without segments")]
    NoSegments,

    #[error("Main audio not found: {path}")]
    MainNotFound { path: PathBuf },

    #[error("Output must differ from every input: {path}")]
    OutputIsInput { path: PathBuf },
}

/// Outcome of an external engine run that did not succeed.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{program} not found. Ensure it is installed and on PATH, or set CLIPOD_FFMPEG")]
    NotFound { program: String },

    /// `code` is `None` when the process was killed (signal or timeout).
    #[error("{program} failed with exit code {}: {stderr}", exit_label(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl ProcessError {
    /// Creates a non-zero exit error.
    pub fn non_zero_exit(
        program: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::NonZeroExit {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Exit code reported by the engine, if it exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NotFound { .. } => None,
            ProcessError::NonZeroExit { code, .. } => *code,
        }
    }
}

/// Main error type for clipod operations
#[derive(Error, Debug)]
pub enum ClipodError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    // Caller input errors
    #[error("Invalid range: start={start}, end={end}")]
    InvalidRange { start: f64, end: f64 },

    #[error("Replacement audio is empty")]
    EmptyReplacement,

    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: String },

    #[error("Invalid output name: {name:?}")]
    InvalidOutputName { name: String },

    #[error("Input audio not found: {path}")]
    InputNotFound { path: PathBuf },

    // File errors
    #[error("Working audio not found: {path}")]
    WorkingFileMissing { path: PathBuf },

    #[error("Backup not found: {path}")]
    BackupNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session lock poisoned by a panicked edit")]
    SessionPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClipodError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ClipodError::Layout(_) => "LAYOUT_ERROR",
            ClipodError::Process(ProcessError::NotFound { .. }) => "ENGINE_NOT_FOUND",
            ClipodError::Process(ProcessError::NonZeroExit { .. }) => "ENGINE_FAILED",
            ClipodError::InvalidRange { .. } => "INVALID_RANGE",
            ClipodError::EmptyReplacement => "EMPTY_REPLACEMENT",
            ClipodError::InvalidSelection { .. } => "INVALID_SELECTION",
            ClipodError::InvalidOutputName { .. } => "INVALID_OUTPUT_NAME",
            ClipodError::InputNotFound { .. } => "INPUT_NOT_FOUND",
            ClipodError::WorkingFileMissing { .. } => "WORKING_FILE_MISSING",
            ClipodError::BackupNotFound { .. } => "BACKUP_NOT_FOUND",
            ClipodError::FileReadError { .. } => "FILE_READ_ERROR",
            ClipodError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            ClipodError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            ClipodError::SessionPoisoned => "SESSION_POISONED",
            ClipodError::Io(_) => "IO_ERROR",
            ClipodError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// HTTP status a request handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ClipodError::Layout(_)
            | ClipodError::InvalidRange { .. }
            | ClipodError::EmptyReplacement
            | ClipodError::InvalidSelection { .. }
            | ClipodError::InvalidOutputName { .. }
            | ClipodError::Serialization(_) => 400,
            ClipodError::WorkingFileMissing { .. }
            | ClipodError::BackupNotFound { .. }
            | ClipodError::InputNotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Check if the caller can fix this by correcting its input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClipodError::Layout(_)
                | ClipodError::InvalidRange { .. }
                | ClipodError::EmptyReplacement
                | ClipodError::InvalidSelection { .. }
                | ClipodError::InvalidOutputName { .. }
                | ClipodError::InputNotFound { .. }
                | ClipodError::BackupNotFound { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ClipodError::Layout(LayoutError::SourceNotFound { .. }) => {
                Some("Check that BGM paths are relative to the layout file's directory.")
            }
            ClipodError::Layout(LayoutError::OutputIsInput { .. }) => {
                Some("Choose an output path different from the main audio and BGM files.")
            }
            ClipodError::Layout(_) => Some("Fix the layout document and try again."),
            ClipodError::Process(ProcessError::NotFound { .. }) => {
                Some("Install ffmpeg, or point CLIPOD_FFMPEG at the binary.")
            }
            ClipodError::Process(ProcessError::NonZeroExit { .. }) => {
                Some("Inspect the ffmpeg output above; the working file was not changed.")
            }
            ClipodError::BackupNotFound { .. } => Some("Nothing to undo yet."),
            ClipodError::WorkingFileMissing { .. } => Some("Upload or import audio first."),
            ClipodError::InvalidRange { .. } | ClipodError::InvalidSelection { .. } => {
                Some("Select a range with start >= 0 and end after start.")
            }
            _ => None,
        }
    }
}
