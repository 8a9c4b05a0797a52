//! Repository state: loaded notes and where they live on disk.

use crate::batch::run_batches;
use crate::error::{ErrorList, NoteError, NoteResult};
use crate::fs;
use crate::identity::{canonical_name, name_from_path, ref_to_name, Layout};
use crate::note::Note;
use crate::tags::Tree;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Notes keyed by the name they were last known under.
///
/// `paths` and `notes` share keys: every entry in `notes` has one in `paths`.
/// `paths` may run ahead of `notes` between [`Repository::load_paths`] and
/// [`Repository::load_notes`].
#[derive(Debug)]
pub struct Repository {
    layout: Layout,
    pub(crate) paths: BTreeMap<String, PathBuf>,
    pub(crate) notes: BTreeMap<String, Note>,
}

impl Repository {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            paths: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn note_paths(&self) -> &BTreeMap<String, PathBuf> {
        &self.paths
    }

    pub fn notes(&self) -> &BTreeMap<String, Note> {
        &self.notes
    }

    /// Mutable access to a loaded note, for edits before planning.
    pub fn note_mut(&mut self, name: &str) -> Option<&mut Note> {
        self.notes.get_mut(name)
    }

    /// Discover note files under the notes directory.
    pub fn load_paths(&mut self) -> NoteResult<()> {
        let files = fs::note_files(&self.layout.notes_dir())?;
        for path in files {
            let name = name_from_path(&path);
            if let Some(existing) = self.paths.get(&name) {
                return Err(NoteError::Duplicate {
                    name,
                    existing: existing.clone(),
                    duplicate: path,
                });
            }
            self.paths.insert(name, path);
        }
        tracing::debug!(count = self.paths.len(), "loaded note paths");
        Ok(())
    }

    /// Read and parse every note whose path is known, in parallel batches.
    ///
    /// Notes that parse are kept even when others fail; all failures are
    /// returned together.
    pub fn load_notes(&mut self) -> NoteResult<()> {
        let entries: Vec<(&String, &PathBuf)> = self.paths.iter().collect();
        let (loaded, errors) = run_batches(&entries, |(name, path)| {
            load_note(path).map(|note| ((*name).clone(), note))
        });

        for (name, note) in loaded {
            self.notes.insert(name, note);
        }

        tracing::info!(loaded = self.notes.len(), failed = errors.len(), "loaded notes");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(NoteError::Load(ErrorList(errors)))
        }
    }

    /// Add a new note and write it to its canonical path. Returns that path.
    pub fn add_note(&mut self, note: Note) -> NoteResult<PathBuf> {
        let name = canonical_name(&note);
        if self.notes.contains_key(&name) || self.paths.contains_key(&name) {
            return Err(NoteError::Exists(name));
        }

        let path = self.layout.note_path(&note);
        if self.paths.values().any(|p| *p == path) || path.exists() {
            return Err(NoteError::PathExists(path));
        }

        fs::write_file(&path, &note.to_markdown()?)?;
        tracing::info!(name = %name, path = %path.display(), "added note");

        self.paths.insert(name.clone(), path.clone());
        self.notes.insert(name, note);
        Ok(path)
    }

    /// Find a note by name, path or `notes://` reference.
    pub fn find_note(&self, reference: &str) -> Option<&Note> {
        self.notes.get(&ref_to_name(reference))
    }

    /// Name of the note with the latest date.
    pub fn last_note(&self) -> NoteResult<&str> {
        self.notes
            .iter()
            .max_by(|(a_name, a), (b_name, b)| {
                a.meta.date.cmp(&b.meta.date).then_with(|| b_name.cmp(a_name))
            })
            .map(|(name, _)| name.as_str())
            .ok_or(NoteError::EmptyRepository)
    }

    /// Build the tag tree over all loaded notes.
    pub fn tree(&self) -> NoteResult<Tree<'_>> {
        Tree::build(&self.notes)
    }

    /// Rename tags across all notes. Returns how many notes changed.
    pub fn rename_tag(&mut self, from: &str, to: &str) -> usize {
        let count = self
            .notes
            .values_mut()
            .map(|note| note.rename_tag(from, to))
            .filter(|changed| *changed)
            .count();
        tracing::info!(from, to, count, "renamed tags");
        count
    }

    /// Note and path for `name`; missing either side is a data integrity error.
    pub(crate) fn note_by_name(&self, name: &str) -> NoteResult<(&Note, &Path)> {
        let path = self
            .paths
            .get(name)
            .ok_or_else(|| NoteError::DataIntegrity(format!("no path found for {name}")))?;
        let note = self
            .notes
            .get(name)
            .ok_or_else(|| NoteError::DataIntegrity(format!("no note found for {name}")))?;
        Ok((note, path))
    }
}

fn load_note(path: &Path) -> NoteResult<Note> {
    fs::read_file(path)
        .and_then(|contents| Note::parse(&contents))
        .map_err(|source| NoteError::LoadNote {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}
