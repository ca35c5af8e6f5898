//! Sibling file names used around the working file.

use std::path::{Path, PathBuf};

/// Scratch and backup paths derived from one working file.
///
/// All of them live next to the working file so the final rename never
/// crosses a filesystem boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPaths {
    /// `<stem>_backup.<ext>`: state before the last successful edit.
    pub backup: PathBuf,
    /// `<stem>_tmp.<ext>`: engine output, renamed over the working file.
    pub temp: PathBuf,
    /// `<stem>_snapshot.<ext>`: copy taken before an edit, promoted to backup.
    pub snapshot: PathBuf,
    /// `<stem>_punch.<ext>`: replacement audio for a punch-in.
    pub punch: PathBuf,
}

impl ScratchPaths {
    pub fn for_working(working: &Path) -> Self {
        Self {
            backup: sibling(working, "backup"),
            temp: sibling(working, "tmp"),
            snapshot: sibling(working, "snapshot"),
            punch: sibling(working, "punch"),
        }
    }

    /// Every path that may be left behind after an interrupted edit.
    pub fn transient(&self) -> [&Path; 3] {
        [&self.temp, &self.snapshot, &self.punch]
    }

    /// True when `path` is the backup or one of the transient files.
    pub fn contains(&self, path: &Path) -> bool {
        path == self.backup || self.transient().contains(&path)
    }
}

fn sibling(working: &Path, tag: &str) -> PathBuf {
    let stem = working
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match working.extension() {
        Some(ext) => format!("{stem}_{tag}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{tag}"),
    };
    working.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names() {
        let paths = ScratchPaths::for_working(Path::new("/data/auto_edit.wav"));

        assert_eq!(paths.backup, PathBuf::from("/data/auto_edit_backup.wav"));
        assert_eq!(paths.temp, PathBuf::from("/data/auto_edit_tmp.wav"));
        assert_eq!(paths.snapshot, PathBuf::from("/data/auto_edit_snapshot.wav"));
        assert_eq!(paths.punch, PathBuf::from("/data/auto_edit_punch.wav"));
    }

    #[test]
    fn test_no_extension() {
        let paths = ScratchPaths::for_working(Path::new("take"));
        assert_eq!(paths.backup, PathBuf::from("take_backup"));
        assert_eq!(paths.temp, PathBuf::from("take_tmp"));
    }

    #[test]
    fn test_multiple_dots() {
        let paths = ScratchPaths::for_working(Path::new("ep.01.final.mp3"));
        assert_eq!(paths.backup, PathBuf::from("ep.01.final_backup.mp3"));
    }

    #[test]
    fn test_contains() {
        let paths = ScratchPaths::for_working(Path::new("/data/auto_edit.wav"));

        assert!(paths.contains(Path::new("/data/auto_edit_backup.wav")));
        assert!(paths.contains(Path::new("/data/auto_edit_punch.wav")));
        assert!(!paths.contains(Path::new("/data/auto_edit.wav")));
        assert!(!paths.contains(Path::new("/data/bgm_mix.wav")));
    }
}
