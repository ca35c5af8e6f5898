//! clipod - podcast editing on top of ffmpeg
//!
//! clipod never decodes audio itself. It validates user intent, compiles it
//! into an ffmpeg filter graph and manages the files around each run:
//!
//! - [`layout`]: BGM layout documents and validated segments
//! - [`graph`]: typed filter graphs and their `-filter_complex` text
//! - [`engine`]: running ffmpeg (or a mock) on one invocation
//! - [`session`]: destructive delete / punch-in / undo on a working file
//! - [`mix`]: BGM mixing, export, trim and concatenation to new files
//!
//! # Working file model
//!
//! A [`Session`] edits one working file in place and keeps exactly one
//! backup: the audio as it was before the most recent successful edit.
//! Undo restores that backup and may be repeated.

pub mod cli;
pub mod engine;
pub mod error;
pub mod graph;
pub mod layout;
pub mod mix;
pub mod session;

pub use engine::{Engine, EngineConfig, FfmpegEngine, Invocation, MockEngine};
pub use error::{ClipodError, LayoutError, ProcessError, Result};
pub use graph::{compile_bgm, FilterGraph};
pub use layout::{BgmSegment, Layout};
pub use mix::MixOutcome;
pub use session::{Selection, Session, SessionStatus};
