//! Non-destructive mixing and export
//!
//! These operations read their inputs and write a separate output file.
//! None of them touches a session's working file.

mod format;

pub use format::{encoder_args, is_native_wav};

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::engine::{Engine, Invocation};
use crate::error::{ClipodError, LayoutError, Result};
use crate::graph::{self, StreamLabel};
use crate::layout::Layout;
use crate::session::Selection;

/// Result of [`mix_bgm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixOutcome {
    /// No segments: the main audio was copied unchanged.
    Copied,
    /// The engine mixed the segments under the main audio.
    Mixed,
}

/// Mix the layout's segments under `main`, writing `output`.
///
/// The main track sets the output length.
pub fn mix_bgm(engine: &dyn Engine, main: &Path, layout: &Layout, output: &Path) -> Result<MixOutcome> {
    if !main.is_file() {
        return Err(LayoutError::MainNotFound {
            path: main.to_path_buf(),
        }
        .into());
    }
    reject_overwrite(std::iter::once(main).chain(layout.sources()), output)?;
    ensure_parent(output)?;

    if layout.is_empty() {
        fs::copy(main, output).map_err(|e| ClipodError::FileWriteError {
            path: output.to_path_buf(),
            source: e,
        })?;
        info!("No BGM segments; copied {} to {}", main.display(), output.display());
        return Ok(MixOutcome::Copied);
    }

    let graph = graph::compile_bgm(&StreamLabel::input(0), layout.segments())?;

    // Held until the mix finishes; dropping it removes the file.
    let converted = if is_native_wav(main) {
        None
    } else {
        Some(convert_to_wav(engine, main)?)
    };
    let main_input = converted.as_ref().map_or(main, |tmp| tmp.path());

    let mut invocation = Invocation::new(output).input(main_input);
    for source in layout.sources() {
        invocation = invocation.input(source);
    }
    engine.run(&invocation.filter_graph(graph))?;

    info!(
        "Mixed {} BGM segment(s) under {} into {}",
        layout.len(),
        main.display(),
        output.display()
    );
    Ok(MixOutcome::Mixed)
}

/// Optionally mix BGM, then encode `output` in the format its extension names.
pub fn export(engine: &dyn Engine, main: &Path, layout: Option<&Layout>, output: &Path) -> Result<()> {
    if !main.is_file() {
        return Err(LayoutError::MainNotFound {
            path: main.to_path_buf(),
        }
        .into());
    }
    let sources = layout.into_iter().flat_map(Layout::sources);
    reject_overwrite(std::iter::once(main).chain(sources), output)?;
    ensure_parent(output)?;

    let staging = tempfile::Builder::new().prefix("clipod-export-").tempdir()?;
    let source: PathBuf = match layout {
        Some(layout) if !layout.is_empty() => {
            let mixed = staging.path().join("mixed.wav");
            mix_bgm(engine, main, layout, &mixed)?;
            mixed
        }
        _ => main.to_path_buf(),
    };

    let invocation = Invocation::new(output)
        .input(&source)
        .output_args(encoder_args(output));
    engine.run(&invocation)?;

    info!("Exported {} to {}", main.display(), output.display());
    Ok(())
}

/// Copy `[start, end)` of `input` into `output` without re-encoding.
pub fn trim(engine: &dyn Engine, input: &Path, selection: &Selection, output: &Path) -> Result<()> {
    selection.validate_for_trim()?;
    require_input(input)?;
    ensure_parent(output)?;

    let invocation = Invocation::new(output)
        .input_window(input, selection.start, selection.duration())
        .output_args(["-c", "copy"]);
    engine.run(&invocation)?;

    info!(
        "Trimmed {} to {} (start={:.2}s, end={:.2}s)",
        input.display(),
        output.display(),
        selection.start,
        selection.end
    );
    Ok(())
}

/// Join optional intro, main and optional outro back to back.
pub fn concat(
    engine: &dyn Engine,
    intro: Option<&Path>,
    main: &Path,
    outro: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let parts: Vec<&Path> = [intro, Some(main), outro].into_iter().flatten().collect();
    for part in &parts {
        require_input(part)?;
    }
    reject_overwrite(parts.iter().copied(), output)?;
    ensure_parent(output)?;

    let mut invocation = Invocation::new(output);
    for part in &parts {
        invocation = invocation.input(*part);
    }
    engine.run(&invocation.filter_graph(graph::concat_inputs(parts.len())))?;

    let names: Vec<String> = parts
        .iter()
        .map(|p| p.file_name().unwrap_or(p.as_os_str()).to_string_lossy().into_owned())
        .collect();
    info!("Mixed {} -> {}", names.join(" + "), output.display());
    Ok(())
}

/// Transcode `main` into a temporary `.wav`, removed when the handle drops.
fn convert_to_wav(engine: &dyn Engine, main: &Path) -> Result<tempfile::NamedTempFile> {
    let converted = tempfile::Builder::new()
        .prefix("clipod-main-")
        .suffix(".wav")
        .tempfile()?;
    debug!("Converting {} to {}", main.display(), converted.path().display());
    engine.run(&Invocation::new(converted.path()).input(main))?;
    Ok(converted)
}

fn require_input(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ClipodError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

fn ensure_parent(output: &Path) -> Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ClipodError::DirectoryCreateError {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

/// Fail when `output` resolves to any of `inputs`.
fn reject_overwrite<'a>(inputs: impl IntoIterator<Item = &'a Path>, output: &Path) -> Result<()> {
    match inputs.into_iter().find(|input| same_file(input, output)) {
        Some(input) => {
            debug!("Output {} is the input {}", output.display(), input.display());
            Err(LayoutError::OutputIsInput {
                path: output.to_path_buf(),
            }
            .into())
        }
        None => Ok(()),
    }
}

/// Compare resolved paths; `b` need not exist yet.
fn same_file(a: &Path, b: &Path) -> bool {
    match (resolve(a), resolve(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|p| p.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockBehavior, MockEngine};
    use crate::layout::BgmSegment;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn layout_with(dir: &Path, count: usize) -> Layout {
        let segments = (0..count)
            .map(|i| {
                let source = dir.join(format!("bed{i}.mp3"));
                fs::write(&source, b"bed").unwrap();
                BgmSegment::new(source, i as f64 * 10.0, i as f64 * 10.0 + 8.0)
            })
            .collect();
        Layout::new(segments)
    }

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn test_zero_segments_copies() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.mp3");
        fs::write(&main, b"main audio").unwrap();
        let output = dir.path().join("out").join("final.mp3");
        let engine = MockEngine::writing(Vec::new());

        let outcome = mix_bgm(&engine, &main, &Layout::default(), &output).unwrap();

        assert_eq!(outcome, MixOutcome::Copied);
        assert_eq!(fs::read(&output).unwrap(), b"main audio");
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_same_path_rejected() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        fs::write(&main, b"x").unwrap();
        let engine = MockEngine::writing(Vec::new());

        let err = mix_bgm(&engine, &main, &Layout::default(), &dir.path().join("./main.wav"))
            .unwrap_err();

        assert!(matches!(
            err,
            ClipodError::Layout(LayoutError::OutputIsInput { .. })
        ));
    }

    #[test]
    fn test_output_over_bgm_source_rejected() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        write_wav(&main);
        let bed = dir.path().join("bed.mp3");
        fs::write(&bed, b"precious music").unwrap();
        let layout = Layout::new(vec![BgmSegment::new(&bed, 0.0, 5.0)]);
        let engine = MockEngine::writing(b"MIXED".to_vec());

        let err = mix_bgm(&engine, &main, &layout, &bed).unwrap_err();
        assert!(matches!(
            err,
            ClipodError::Layout(LayoutError::OutputIsInput { .. })
        ));

        let err = export(&engine, &main, Some(&layout), &dir.path().join("./bed.mp3")).unwrap_err();
        assert!(matches!(
            err,
            ClipodError::Layout(LayoutError::OutputIsInput { .. })
        ));

        assert_eq!(fs::read(&bed).unwrap(), b"precious music");
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_missing_main() {
        let dir = tempdir().unwrap();
        let engine = MockEngine::writing(Vec::new());
        let err = mix_bgm(
            &engine,
            &dir.path().join("nope.wav"),
            &Layout::default(),
            &dir.path().join("out.wav"),
        )
        .unwrap_err();

        assert!(matches!(err, ClipodError::Layout(LayoutError::MainNotFound { .. })));
    }

    #[test]
    fn test_native_wav_mixed_directly() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        write_wav(&main);
        let layout = layout_with(dir.path(), 2);
        let output = dir.path().join("mixed.wav");
        let engine = MockEngine::writing(b"mixed".to_vec());

        let outcome = mix_bgm(&engine, &main, &layout, &output).unwrap();

        assert_eq!(outcome, MixOutcome::Mixed);
        assert_eq!(engine.call_count(), 1);
        let invocation = engine.last_invocation().unwrap();
        let inputs: Vec<&Path> = invocation.inputs().iter().map(|i| i.path.as_path()).collect();
        assert_eq!(inputs[0], main.as_path());
        assert_eq!(inputs[1..].to_vec(), layout.sources().collect::<Vec<_>>());
        assert_eq!(invocation.graph().unwrap().final_stage().unwrap().inputs.len(), 3);
    }

    #[test]
    fn test_compressed_main_is_converted_first() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.webm");
        fs::write(&main, b"webm").unwrap();
        let layout = layout_with(dir.path(), 1);
        let engine = MockEngine::writing(b"pcm".to_vec());

        mix_bgm(&engine, &main, &layout, &dir.path().join("mixed.wav")).unwrap();

        let calls = engine.invocations();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].graph().is_none());
        assert_eq!(calls[0].inputs()[0].path, main);
        let converted = calls[0].output().to_path_buf();
        assert_eq!(calls[1].inputs()[0].path, converted);
        assert!(!converted.exists());
    }

    #[test]
    fn test_conversion_failure_propagates() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.m4a");
        fs::write(&main, b"m4a").unwrap();
        let layout = layout_with(dir.path(), 1);
        let output = dir.path().join("mixed.wav");
        let engine = MockEngine::failing(1, "moov atom not found");

        let err = mix_bgm(&engine, &main, &layout, &output).unwrap_err();

        assert_eq!(err.error_code(), "ENGINE_FAILED");
        assert_eq!(engine.call_count(), 1);
        assert!(!output.exists());
    }

    #[test]
    fn test_export_with_layout_mixes_then_encodes() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        write_wav(&main);
        let layout = layout_with(dir.path(), 1);
        let output = dir.path().join("final.mp3");
        let engine = MockEngine::writing(b"encoded".to_vec());

        export(&engine, &main, Some(&layout), &output).unwrap();

        let calls = engine.invocations();
        assert_eq!(calls.len(), 2);
        let mixed = calls[0].output().to_path_buf();
        assert_eq!(mixed.file_name().unwrap(), "mixed.wav");
        assert_eq!(calls[1].inputs()[0].path, mixed);
        assert_eq!(calls[1].output(), output.as_path());
        assert!(!mixed.exists());
        assert_eq!(fs::read(&output).unwrap(), b"encoded");
    }

    #[test]
    fn test_export_without_layout_encodes_main() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        write_wav(&main);
        let engine = MockEngine::writing(b"encoded".to_vec());

        export(&engine, &main, None, &dir.path().join("final.mp3")).unwrap();

        let calls = engine.invocations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].inputs()[0].path, main);
        let args: Vec<String> = calls[0]
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.windows(2).any(|w| w == ["-codec:a", "libmp3lame"]));
    }

    #[test]
    fn test_trim_window() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("take.wav");
        fs::write(&input, b"take").unwrap();
        let engine = MockEngine::writing(b"cut".to_vec());

        trim(&engine, &input, &Selection::new(1.5, 4.0), &dir.path().join("cut.wav")).unwrap();

        let invocation = engine.last_invocation().unwrap();
        assert_eq!(invocation.inputs()[0].seek, Some(1.5));
        assert_eq!(invocation.inputs()[0].duration, Some(2.5));
    }

    #[test]
    fn test_trim_rejects_bad_selection() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("take.wav");
        fs::write(&input, b"take").unwrap();
        let engine = MockEngine::writing(Vec::new());

        let err = trim(&engine, &input, &Selection::new(4.0, 1.0), &dir.path().join("cut.wav"))
            .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_SELECTION");
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_concat_optional_parts() {
        let dir = tempdir().unwrap();
        let intro = dir.path().join("intro.wav");
        let main = dir.path().join("main.wav");
        fs::write(&intro, b"I").unwrap();
        fs::write(&main, b"M").unwrap();
        let engine = MockEngine::new(MockBehavior::ConcatInputs);
        let output = dir.path().join("episode.wav");

        concat(&engine, Some(intro.as_path()), &main, None, &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"IM");
        let invocation = engine.last_invocation().unwrap();
        assert_eq!(
            invocation.graph().unwrap().to_filter_complex(),
            "[0:a][1:a]concat=n=2:v=0:a=1[out]"
        );
    }

    #[test]
    fn test_concat_missing_outro() {
        let dir = tempdir().unwrap();
        let main = dir.path().join("main.wav");
        fs::write(&main, b"M").unwrap();
        let engine = MockEngine::writing(Vec::new());

        let err = concat(
            &engine,
            None,
            &main,
            Some(dir.path().join("outro.wav").as_path()),
            &dir.path().join("episode.wav"),
        )
        .unwrap_err();

        assert!(matches!(err, ClipodError::InputNotFound { .. }));
    }
}
