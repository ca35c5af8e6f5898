//! Destructive editing of one working file
//!
//! A [`Session`] owns the working audio path, a readiness flag and a
//! single-level backup. Edits run the engine into a temp sibling and then
//! rename it over the working file, so the working file is either the old
//! audio or the new audio, never half of each.
//!
//! ## Backup discipline
//!
//! 1. Copy the working file to the snapshot sibling.
//! 2. Run the engine into the temp sibling.
//! 3. Rename temp over the working file.
//! 4. Rename the snapshot over the backup.
//!
//! A failure before step 3 removes temp and snapshot and leaves both the
//! working file and the previous backup as they were. A failure at step 4
//! keeps the edit and removes the snapshot.
//!
//! Every edit holds the write lock for the whole sequence; reads and mixes
//! share the read lock.

mod scratch;
mod selection;

pub use scratch::ScratchPaths;
pub use selection::Selection;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::{Engine, Invocation};
use crate::error::{ClipodError, Result};
use crate::graph;
use crate::layout::Layout;
use crate::mix::{self, MixOutcome};

#[derive(Debug, Default)]
struct SessionState {
    ready: bool,
    has_backup: bool,
    last_edit: Option<DateTime<Utc>>,
}

/// Point-in-time view of a session, suitable for a status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub working_path: PathBuf,
    pub ready: bool,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    /// Hex SHA-256 of the working file.
    pub sha256: Option<String>,
    pub has_backup: bool,
    pub backup_size_bytes: Option<u64>,
    pub last_edit: Option<DateTime<Utc>>,
}

/// Editing session over one working file. Share it with `Arc<Session>`.
pub struct Session {
    working: PathBuf,
    scratch: ScratchPaths,
    engine: Arc<dyn Engine>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Start a fresh session.
    ///
    /// A backup left on disk by an earlier session is not adopted: undo
    /// reports `BackupNotFound` until this session has made an edit.
    pub fn open(working: impl Into<PathBuf>, engine: Arc<dyn Engine>) -> Self {
        Self::build(working.into(), engine, false)
    }

    /// Continue a previous session, adopting its backup if present.
    pub fn resume(working: impl Into<PathBuf>, engine: Arc<dyn Engine>) -> Self {
        Self::build(working.into(), engine, true)
    }

    fn build(working: PathBuf, engine: Arc<dyn Engine>, adopt_backup: bool) -> Self {
        let scratch = ScratchPaths::for_working(&working);
        let state = SessionState {
            ready: working.is_file(),
            has_backup: adopt_backup && scratch.backup.is_file(),
            last_edit: None,
        };
        debug!(
            "Session on {} (ready: {}, backup: {})",
            working.display(),
            state.ready,
            state.has_backup
        );
        Self {
            working,
            scratch,
            engine,
            state: RwLock::new(state),
        }
    }

    pub fn working_path(&self) -> &Path {
        &self.working
    }

    pub fn backup_path(&self) -> &Path {
        &self.scratch.backup
    }

    pub fn scratch_paths(&self) -> &ScratchPaths {
        &self.scratch
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    pub fn is_ready(&self) -> Result<bool> {
        Ok(self.read()?.ready)
    }

    pub fn has_backup(&self) -> Result<bool> {
        Ok(self.read()?.has_backup)
    }

    /// Replace the working file with uploaded audio.
    ///
    /// Does not touch the backup.
    pub fn import(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.write()?;

        if let Some(parent) = self.working.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ClipodError::DirectoryCreateError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        write_file(&self.scratch.temp, bytes)?;
        if let Err(e) = replace(&self.scratch.temp, &self.working) {
            remove_scratch(&self.scratch.temp);
            return Err(e);
        }

        state.ready = true;
        info!("Imported {} bytes into {}", bytes.len(), self.working.display());
        Ok(())
    }

    /// Current working file contents.
    pub fn read_working(&self) -> Result<Vec<u8>> {
        let _state = self.read()?;
        self.require_working()?;
        fs::read(&self.working).map_err(|e| ClipodError::FileReadError {
            path: self.working.clone(),
            source: e,
        })
    }

    pub fn status(&self) -> Result<SessionStatus> {
        let state = self.read()?;

        let size_bytes = fs::metadata(&self.working).ok().map(|m| m.len());
        let sha256 = match size_bytes {
            Some(_) => {
                let content = fs::read(&self.working).map_err(|e| ClipodError::FileReadError {
                    path: self.working.clone(),
                    source: e,
                })?;
                Some(format!("{:x}", Sha256::digest(&content)))
            }
            None => None,
        };
        let backup_size_bytes = if state.has_backup {
            fs::metadata(&self.scratch.backup).ok().map(|m| m.len())
        } else {
            None
        };

        Ok(SessionStatus {
            working_path: self.working.clone(),
            ready: state.ready,
            exists: size_bytes.is_some(),
            size_bytes,
            sha256,
            has_backup: state.has_backup,
            backup_size_bytes,
            last_edit: state.last_edit,
        })
    }

    /// Remove `[start, end)` seconds and close the gap.
    pub fn delete(&self, start: f64, end: f64) -> Result<()> {
        Selection::new(start, end).validate_for_delete()?;

        let mut state = self.write()?;
        self.require_working()?;

        let invocation = Invocation::new(&self.scratch.temp)
            .input(&self.working)
            .filter_graph(graph::delete_range(start, end));
        self.commit(&mut state, &invocation)?;

        info!("Deleted {:.3}s..{:.3}s from {}", start, end, self.working.display());
        Ok(())
    }

    /// Replace `[start, end)` seconds with `replacement`, used in full.
    ///
    /// `end` is not clamped to the file length; a range past the end just
    /// leaves an empty tail.
    pub fn punch_in(&self, start: f64, end: f64, replacement: &[u8]) -> Result<()> {
        Selection::new(start, end).validate_for_punch()?;
        if replacement.is_empty() {
            return Err(ClipodError::EmptyReplacement);
        }

        let mut state = self.write()?;
        self.require_working()?;

        write_file(&self.scratch.punch, replacement)?;
        let invocation = Invocation::new(&self.scratch.temp)
            .input(&self.working)
            .input(&self.scratch.punch)
            .filter_graph(graph::punch_in(start, end));
        let result = self.commit(&mut state, &invocation);
        remove_scratch(&self.scratch.punch);
        result?;

        info!(
            "Punched {} bytes into {:.3}s..{:.3}s of {}",
            replacement.len(),
            start,
            end,
            self.working.display()
        );
        Ok(())
    }

    /// Restore the working file from the backup.
    ///
    /// The backup is kept, so undoing twice gives the same audio.
    pub fn undo(&self) -> Result<()> {
        let mut state = self.write()?;

        if !state.has_backup || !self.scratch.backup.is_file() {
            return Err(ClipodError::BackupNotFound {
                path: self.scratch.backup.clone(),
            });
        }
        self.require_working()?;

        fs::copy(&self.scratch.backup, &self.scratch.temp).map_err(|e| {
            remove_scratch(&self.scratch.temp);
            ClipodError::FileWriteError {
                path: self.scratch.temp.clone(),
                source: e,
            }
        })?;
        if let Err(e) = replace(&self.scratch.temp, &self.working) {
            remove_scratch(&self.scratch.temp);
            return Err(e);
        }

        state.ready = true;
        state.last_edit = Some(Utc::now());
        info!("Restored {} from backup", self.working.display());
        Ok(())
    }

    /// Mix BGM under the working file into a sibling named `output_name`.
    ///
    /// Only the file name part of `output_name` is used. Names that land on
    /// the backup or a scratch file are rejected.
    pub fn mix_bgm(&self, layout: &Layout, output_name: &str) -> Result<(PathBuf, MixOutcome)> {
        let _state = self.read()?;
        self.require_working()?;

        let invalid = || ClipodError::InvalidOutputName {
            name: output_name.to_string(),
        };
        let name = Path::new(output_name).file_name().ok_or_else(invalid)?;
        let output = self.working.with_file_name(name);
        if self.scratch.contains(&output) {
            return Err(invalid());
        }

        let outcome = mix::mix_bgm(self.engine.as_ref(), &self.working, layout, &output)?;
        Ok((output, outcome))
    }

    /// Snapshot, run, replace, promote. Caller holds the write lock.
    fn commit(&self, state: &mut SessionState, invocation: &Invocation) -> Result<()> {
        fs::copy(&self.working, &self.scratch.snapshot).map_err(|e| {
            remove_scratch(&self.scratch.snapshot);
            ClipodError::FileWriteError {
                path: self.scratch.snapshot.clone(),
                source: e,
            }
        })?;

        let outcome = self
            .engine
            .run(invocation)
            .and_then(|_| replace(&self.scratch.temp, &self.working));
        if let Err(e) = outcome {
            remove_scratch(&self.scratch.temp);
            remove_scratch(&self.scratch.snapshot);
            return Err(e);
        }

        // The edit has landed; state follows it even if promotion fails.
        state.ready = true;
        state.last_edit = Some(Utc::now());

        if let Err(e) = fs::rename(&self.scratch.snapshot, &self.scratch.backup) {
            warn!(
                "Edit applied but {} was not promoted to backup: {}",
                self.scratch.snapshot.display(),
                e
            );
            remove_scratch(&self.scratch.snapshot);
            state.has_backup = state.has_backup && self.scratch.backup.is_file();
            return Err(ClipodError::FileWriteError {
                path: self.scratch.backup.clone(),
                source: e,
            });
        }

        state.has_backup = true;
        Ok(())
    }

    fn require_working(&self) -> Result<()> {
        if self.working.is_file() {
            Ok(())
        } else {
            Err(ClipodError::WorkingFileMissing {
                path: self.working.clone(),
            })
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SessionState>> {
        self.state.read().map_err(|_| ClipodError::SessionPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SessionState>> {
        self.state.write().map_err(|_| ClipodError::SessionPoisoned)
    }
}

/// Rename `from` over `to`, then flush `to`.
fn replace(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| ClipodError::FileWriteError {
        path: to.to_path_buf(),
        source: e,
    })?;
    // Durability only; the rename already happened.
    if let Err(e) = File::open(to).and_then(|f| f.sync_all()) {
        warn!("Could not sync {}: {}", to.display(), e);
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ClipodError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn remove_scratch(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}
