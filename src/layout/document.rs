//! Reading and writing layout documents.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{ClipodError, LayoutError, Result};

/// Read a layout file and check its top-level shape.
///
/// Segment contents are not validated here; see [`super::Layout::from_document`].
pub fn load_document(path: &Path) -> std::result::Result<Value, LayoutError> {
    let raw = fs::read_to_string(path).map_err(|e| LayoutError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|e| LayoutError::InvalidJson {
        path: path.to_path_buf(),
        source: e,
    })?;

    match document.as_object() {
        None => Err(LayoutError::MissingSegments),
        Some(object) => match object.get("segments") {
            None => Err(LayoutError::MissingSegments),
            Some(Value::Array(_)) => Ok(document),
            Some(_) => Err(LayoutError::SegmentsNotList),
        },
    }
}

/// Persist a layout document as-is (pretty-printed).
pub fn save_document(path: &Path, document: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ClipodError::DirectoryCreateError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(document)?;
    fs::write(path, content).map_err(|e| ClipodError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
