//! CLI Command Implementations
//!
//! Each command maps its arguments onto one library call.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::engine::Engine;
use crate::error::{ClipodError, Result};
use crate::layout::Layout;
use crate::mix::{self, MixOutcome};
use crate::session::{Selection, Session};

/// Mix BGM under `main` as described by a layout file.
pub fn bgm(engine: &dyn Engine, main: &Path, layout: &Path, output: &Path) -> Result<()> {
    info!("Mixing BGM from {} under {}", layout.display(), main.display());

    let layout = Layout::load(layout)?;
    match mix::mix_bgm(engine, main, &layout, output)? {
        MixOutcome::Copied => println!("No BGM segments; copied main audio to {}", output.display()),
        MixOutcome::Mixed => println!("Mixed audio saved to {}", output.display()),
    }

    Ok(())
}

/// Export final audio, mixing BGM first when a layout is given.
pub fn export(engine: &dyn Engine, main: &Path, output: &Path, layout: Option<&Path>) -> Result<()> {
    info!("Exporting {}", main.display());

    let layout = layout.map(Layout::load).transpose()?;
    mix::export(engine, main, layout.as_ref(), output)?;

    println!("Exported audio saved to {}", output.display());
    Ok(())
}

/// Trim `input` to a selection given inline or as a JSON file.
pub fn trim(
    engine: &dyn Engine,
    input: &Path,
    output: &Path,
    selection_file: &Path,
    range: Option<(f64, f64)>,
) -> Result<()> {
    let selection = match range {
        Some((start, end)) => Selection::new(start, end),
        None => Selection::load(selection_file)?,
    };

    mix::trim(engine, input, &selection, output)?;

    println!(
        "Trimmed audio saved to {} (start={:.2}s, end={:.2}s)",
        output.display(),
        selection.start,
        selection.end
    );
    Ok(())
}

/// Concatenate optional intro, main and optional outro.
pub fn concat(
    engine: &dyn Engine,
    main: &Path,
    output: &Path,
    intro: Option<&Path>,
    outro: Option<&Path>,
) -> Result<()> {
    mix::concat(engine, intro, main, outro, output)?;
    println!("Concatenated audio saved to {}", output.display());
    Ok(())
}

/// Delete `[start, end)` from the working file.
pub fn delete(engine: Arc<dyn Engine>, working: &Path, start: f64, end: f64) -> Result<()> {
    let session = Session::resume(working, engine);
    session.delete(start, end)?;

    println!("Deleted {start:.2}s..{end:.2}s from {}", working.display());
    println!("Backup: {}", session.backup_path().display());
    Ok(())
}

/// Replace `[start, end)` of the working file with `clip`.
pub fn punch(engine: Arc<dyn Engine>, working: &Path, start: f64, end: f64, clip: &Path) -> Result<()> {
    let replacement = fs::read(clip).map_err(|e| ClipodError::FileReadError {
        path: clip.to_path_buf(),
        source: e,
    })?;

    let session = Session::resume(working, engine);
    session.punch_in(start, end, &replacement)?;

    println!(
        "Punched {} into {start:.2}s..{end:.2}s of {}",
        clip.display(),
        working.display()
    );
    Ok(())
}

/// Restore the working file from its backup.
pub fn undo(engine: Arc<dyn Engine>, working: &Path) -> Result<()> {
    let session = Session::resume(working, engine);
    session.undo()?;

    println!("Restored {} from {}", working.display(), session.backup_path().display());
    Ok(())
}

/// Print the working file status as JSON.
pub fn status(engine: Arc<dyn Engine>, working: &Path) -> Result<()> {
    let session = Session::resume(working, engine);
    let status = session.status()?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
