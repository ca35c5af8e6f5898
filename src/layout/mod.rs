//! Background-music layout
//!
//! A layout is the user-authored list of music cues placed on the main
//! timeline. Documents come from the layout editor as JSON:
//!
//! ```json
//! { "segments": [ { "file": "bgm/intro.mp3", "start": 0, "end": 12.5,
//!                   "offset": 4, "volume": 0.2, "fade_in": 2, "fade_out": 3 } ] }
//! ```
//!
//! Validation turns a document into a typed [`Layout`]; every segment in a
//! `Layout` already satisfies its timing, gain and fade invariants and points
//! at a file that existed when the layout was built.

mod document;
mod segment;

pub use document::{load_document, save_document};
pub use segment::{
    BgmSegment, DEFAULT_FADE_IN, DEFAULT_FADE_OUT, DEFAULT_OFFSET, DEFAULT_VOLUME,
};

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::LayoutError;

/// Validated, ordered list of BGM segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    segments: Vec<BgmSegment>,
}

impl Layout {
    /// Build a layout from already-validated segments.
    pub fn new(segments: Vec<BgmSegment>) -> Self {
        Self { segments }
    }

    /// Validate a layout document.
    ///
    /// Relative `file` entries resolve against `base_dir`, which should be
    /// the directory containing the layout document, so layouts stay portable.
    pub fn from_document(document: &Value, base_dir: &Path) -> Result<Self, LayoutError> {
        let object = document.as_object().ok_or(LayoutError::NotAnObject)?;
        let entries = object
            .get("segments")
            .ok_or(LayoutError::MissingSegments)?
            .as_array()
            .ok_or(LayoutError::SegmentsNotList)?;

        let segments = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| parse_segment(i + 1, entry, base_dir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Load and validate a layout file; relative paths resolve next to it.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let document = load_document(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_document(&document, base_dir)
    }

    pub fn segments(&self) -> &[BgmSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Source files in compiler input order.
    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().map(|s| s.source.as_path())
    }
}

fn parse_segment(index: usize, entry: &Value, base_dir: &Path) -> Result<BgmSegment, LayoutError> {
    let entry = entry
        .as_object()
        .ok_or(LayoutError::SegmentNotObject { index })?;

    let file = entry
        .get("file")
        .ok_or(LayoutError::MissingField {
            index,
            field: "file",
        })?
        .as_str()
        .ok_or(LayoutError::FileNotString { index })?;
    let source = resolve_source(file, base_dir);
    if !source.exists() {
        return Err(LayoutError::SourceNotFound { path: source });
    }

    let segment = BgmSegment {
        source,
        timeline_start: required_number(entry, index, "start")?,
        timeline_end: required_number(entry, index, "end")?,
        source_offset: optional_number(entry, index, "offset", DEFAULT_OFFSET)?,
        gain: optional_number(entry, index, "volume", DEFAULT_VOLUME)?,
        fade_in: optional_number(entry, index, "fade_in", DEFAULT_FADE_IN)?,
        fade_out: optional_number(entry, index, "fade_out", DEFAULT_FADE_OUT)?,
    };
    segment.check(index)?;
    Ok(segment)
}

fn resolve_source(file: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(file);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    // Keep the joined path when canonicalize fails; the existence check reports it.
    joined.canonicalize().unwrap_or(joined)
}

fn required_number(
    entry: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<f64, LayoutError> {
    let value = entry
        .get(field)
        .ok_or(LayoutError::MissingField { index, field })?;
    to_number(value).ok_or(LayoutError::InvalidNumber { index, field })
}

fn optional_number(
    entry: &Map<String, Value>,
    index: usize,
    field: &'static str,
    default: f64,
) -> Result<f64, LayoutError> {
    match entry.get(field) {
        None => Ok(default),
        Some(value) => to_number(value).ok_or(LayoutError::InvalidNumber { index, field }),
    }
}

/// Numbers and numeric strings are accepted; booleans, null and non-finite
/// values are not.
fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
