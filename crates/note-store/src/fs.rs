//! Filesystem helpers used by the repository.

use crate::error::{NoteError, NoteResult};
use crate::identity::NOTE_EXTENSION;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All note files below `dir`, sorted. A missing directory yields no files.
pub fn note_files(dir: &Path) -> NoteResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            NoteError::Io {
                path,
                source: e.into(),
            }
        })?;
        let path = entry.path();
        let is_note = path.extension().is_some_and(|ext| ext == NOTE_EXTENSION);
        if entry.file_type().is_file() && is_note {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> NoteResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(NoteError::io_at(parent))?;
    }
    fs::write(path, contents).map_err(NoteError::io_at(path))
}

pub fn read_file(path: &Path) -> NoteResult<String> {
    fs::read_to_string(path).map_err(NoteError::io_at(path))
}

/// Remove a file; a missing file is not an error.
pub fn remove_file(path: &Path) -> NoteResult<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(NoteError::io_at(path)(e)),
        _ => Ok(()),
    }
}

/// Remove a directory tree; a missing directory is not an error.
pub fn remove_dir_all(path: &Path) -> NoteResult<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(NoteError::io_at(path)(e)),
        _ => Ok(()),
    }
}

pub fn create_dir_all(path: &Path) -> NoteResult<()> {
    fs::create_dir_all(path).map_err(NoteError::io_at(path))
}

/// Create a symlink at `link` pointing to `target`.
pub fn symlink(target: &Path, link: &Path) -> NoteResult<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_file(target, link);

    result.map_err(NoteError::io_at(link))
}
