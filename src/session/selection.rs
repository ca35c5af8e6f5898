//! Time ranges chosen by the user.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClipodError, Result};

/// `{ "start": seconds, "end": seconds }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub start: f64,
    pub end: f64,
}

impl Selection {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ClipodError::InvalidSelection {
            reason: e.to_string(),
        })
    }

    /// Load a selection document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ClipodError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Delete needs a non-empty range starting at or after zero.
    pub fn validate_for_delete(&self) -> Result<()> {
        if self.is_finite() && self.start >= 0.0 && self.end > self.start {
            Ok(())
        } else {
            Err(self.invalid_range())
        }
    }

    /// Punch-in also accepts an empty range, which inserts at `start`.
    pub fn validate_for_punch(&self) -> Result<()> {
        if self.is_finite() && self.start >= 0.0 && self.end >= self.start {
            Ok(())
        } else {
            Err(self.invalid_range())
        }
    }

    pub fn validate_for_trim(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(self.invalid_selection("start and end must be finite numbers"));
        }
        if self.start < 0.0 {
            return Err(self.invalid_selection("start must be >= 0"));
        }
        if self.end <= self.start {
            return Err(self.invalid_selection("end must be greater than start"));
        }
        Ok(())
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    fn invalid_range(&self) -> ClipodError {
        ClipodError::InvalidRange {
            start: self.start,
            end: self.end,
        }
    }

    fn invalid_selection(&self, reason: &str) -> ClipodError {
        ClipodError::InvalidSelection {
            reason: format!("{reason} (start={}, end={})", self.start, self.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0.0, 2.0, true ; "from zero")]
    #[test_case(1.5, 1.6, true ; "short")]
    #[test_case(2.0, 2.0, false ; "empty")]
    #[test_case(3.0, 2.0, false ; "reversed")]
    #[test_case(-1.0, 2.0, false ; "negative start")]
    #[test_case(0.0, f64::NAN, false ; "nan end")]
    fn test_delete_validation(start: f64, end: f64, ok: bool) {
        assert_eq!(Selection::new(start, end).validate_for_delete().is_ok(), ok);
    }

    #[test]
    fn test_punch_allows_empty_range() {
        assert!(Selection::new(4.0, 4.0).validate_for_punch().is_ok());
        assert!(matches!(
            Selection::new(4.0, 3.0).validate_for_punch(),
            Err(ClipodError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_trim_reasons() {
        let err = Selection::new(-0.5, 1.0).validate_for_trim().unwrap_err();
        assert!(err.to_string().contains("start must be >= 0"));

        let err = Selection::new(2.0, 1.0).validate_for_trim().unwrap_err();
        assert!(err.to_string().contains("end must be greater than start"));
    }

    #[test]
    fn test_from_json() {
        let sel = Selection::from_json(r#"{"start": 1.25, "end": 3}"#).unwrap();
        assert_eq!(sel, Selection::new(1.25, 3.0));
        assert_eq!(sel.duration(), 1.75);

        let err = Selection::from_json(r#"{"start": 1}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SELECTION");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Selection::load(Path::new("/nonexistent/selection.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }
}
