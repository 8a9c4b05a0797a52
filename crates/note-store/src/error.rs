//! Note store error types.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading, planning or applying.
#[derive(Debug, Error)]
pub enum NoteError {
    /// Repository has no notes.
    #[error("empty repository")]
    EmptyRepository,

    /// No note under that name.
    #[error("note with name \"{0}\" not found")]
    NotFound(String),

    /// Two files on disk resolve to the same note name.
    #[error(
        "duplicate note with name {name} (path: {}, duplicate: {})",
        existing.display(),
        duplicate.display()
    )]
    Duplicate {
        name: String,
        existing: PathBuf,
        duplicate: PathBuf,
    },

    /// Note name already taken.
    #[error("note with name \"{0}\" already exists")]
    Exists(String),

    /// Note path already taken.
    #[error("note on path \"{}\" already exists", .0.display())]
    PathExists(PathBuf),

    /// The path and note maps disagree about a name.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Tag would link outside the tags directory.
    #[error("tag \"{tag}\" of note \"{name}\" leaves the tags directory")]
    TagOutsideTree { name: String, tag: String },

    /// Note header tags are neither a scalar nor a list of scalars.
    #[error("tags must be a string or a list of strings")]
    InvalidTags,

    /// Note header has no date.
    #[error("no date value")]
    MissingDate,

    /// Note header date could not be parsed.
    #[error("could not parse date \"{value}\": {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error tied to a path.
    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Conflict report could not be written.
    #[error("could not write to log: {0}")]
    Log(#[source] io::Error),

    /// Note file could not be loaded.
    #[error("could not load note from path \"{}\": {source}", path.display())]
    LoadNote {
        path: PathBuf,
        source: Box<NoteError>,
    },

    /// One or more load workers failed.
    #[error("load encountered {}", .0)]
    Load(ErrorList),

    /// One or more tag symlink workers failed.
    #[error("build tag fs encountered {}", .0)]
    BuildTagsFs(ErrorList),
}

impl NoteError {
    /// Build a closure that wraps an [`io::Error`] with the path it happened on.
    pub fn io_at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors gathered from independent workers.
#[derive(Debug, Default)]
pub struct ErrorList(pub Vec<NoteError>);

impl ErrorList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteError> {
        self.0.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors:", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n[{}] {}", i + 1, err)?;
        }
        Ok(())
    }
}

/// Result type for note store operations.
pub type NoteResult<T> = Result<T, NoteError>;
