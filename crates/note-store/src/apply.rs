//! Executing a sync plan against the repository and the disk.

use crate::batch::run_batches;
use crate::error::{ErrorList, NoteError, NoteResult};
use crate::fs;
use crate::plan::{Operation, Plan};
use crate::repository::Repository;
use crate::tags::split_tag;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

impl Repository {
    /// Execute `plan`.
    ///
    /// A plan with conflicts is not executed at all: each conflict is written to
    /// `log` and `Ok(false)` is returned. Otherwise operations run in order and the
    /// first failure is returned as an error.
    pub fn apply<W: Write>(&mut self, plan: Plan, log: &mut W) -> NoteResult<bool> {
        if plan.has_errors() {
            for message in plan.errors() {
                tracing::warn!("{message}");
                writeln!(log, "ERROR: {message}").map_err(NoteError::Log)?;
            }
            return Ok(false);
        }

        for op in plan {
            tracing::debug!("{op}");
            match op {
                Operation::RenameNote {
                    from,
                    to,
                    delete_from,
                    ..
                } => self.rename_note(&from, &to, delete_from)?,
                Operation::UpdateNote { name, .. } => self.write_note_contents(&name)?,
                Operation::RebuildTagsFs => self.rebuild_tags_fs()?,
            }
        }

        Ok(true)
    }

    fn rename_note(&mut self, from: &str, to: &str, delete_from: bool) -> NoteResult<()> {
        let (_, old_path) = self.note_by_name(from)?;
        let old_path = old_path.to_path_buf();
        let (Some(note), Some(_)) = (self.notes.remove(from), self.paths.remove(from)) else {
            return Err(NoteError::DataIntegrity(format!("no note found for {from}")));
        };

        if delete_from {
            fs::remove_file(&old_path)?;
        }

        let path = self.layout().note_path(&note);
        self.notes.insert(to.to_string(), note);
        self.paths.insert(to.to_string(), path);
        self.write_note_contents(to)
    }

    /// Serialize the note under `name` to its path and mark it as synced.
    fn write_note_contents(&mut self, name: &str) -> NoteResult<()> {
        let (note, path) = self.note_by_name(name)?;
        let markdown = note.to_markdown()?;
        fs::write_file(path, &markdown)?;
        if let Some(note) = self.notes.get_mut(name) {
            note.raw = markdown;
        }
        Ok(())
    }

    /// Wipe the tags directory and link every note under each of its tags.
    fn rebuild_tags_fs(&self) -> NoteResult<()> {
        let tags_dir = self.layout().tags_dir();
        fs::remove_dir_all(&tags_dir)?;

        let names: Vec<&str> = self.notes.keys().map(String::as_str).collect();
        let (_, errors) = run_batches(&names, |name| self.write_note_tags_fs(&tags_dir, name));

        if errors.is_empty() {
            tracing::info!(notes = names.len(), "rebuilt tags filesystem");
            Ok(())
        } else {
            Err(NoteError::BuildTagsFs(ErrorList(errors)))
        }
    }

    fn write_note_tags_fs(&self, tags_dir: &Path, name: &str) -> NoteResult<()> {
        let (note, note_path) = self.note_by_name(name)?;
        let Some(file_name) = note_path.file_name() else {
            return Err(NoteError::DataIntegrity(format!(
                "note path {} has no file name",
                note_path.display()
            )));
        };

        let tags: BTreeSet<&str> = note.meta.tags.iter().map(String::as_str).collect();
        for tag in tags {
            let tag_dir = tag_dir(tags_dir, name, tag)?;
            fs::create_dir_all(&tag_dir)?;
            fs::symlink(note_path, &tag_dir.join(file_name))?;
        }
        Ok(())
    }
}

/// Directory for `tag` under `tags_dir`, built one segment at a time so the
/// result never leaves `tags_dir`.
fn tag_dir(tags_dir: &Path, name: &str, tag: &str) -> NoteResult<PathBuf> {
    let mut dir = tags_dir.to_path_buf();
    for segment in split_tag(tag) {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(NoteError::TagOutsideTree {
                    name: name.to_string(),
                    tag: tag.to_string(),
                })
            }
            segment => dir.push(segment),
        }
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Layout;
    use crate::meta::Meta;
    use crate::note::Note;
    use chrono::NaiveDate;
    use std::fs as stdfs;
    use tempfile::tempdir;

    fn note(second: u32, title: &str, tags: &[&str]) -> Note {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, second)
            .unwrap();
        let mut meta = Meta::new(date);
        meta.title = title.to_string();
        meta.tags = tags.iter().map(|t| t.to_string()).collect();
        Note::new(meta, "body")
    }

    fn write_note(root: &Path, name: &str, note: &Note) -> PathBuf {
        let path = root.join("notes/2024-01").join(format!("{name}.md"));
        stdfs::create_dir_all(path.parent().unwrap()).unwrap();
        stdfs::write(&path, note.to_markdown().unwrap()).unwrap();
        path
    }

    fn load(root: &Path) -> Repository {
        let mut repo = Repository::new(Layout::new(root));
        repo.load_paths().unwrap();
        repo.load_notes().unwrap();
        repo
    }

    #[test]
    fn test_rename_moves_file() {
        let dir = tempdir().unwrap();
        let old = write_note(dir.path(), "2024-01-01-1200-00", &note(0, "", &[]));

        let mut repo = load(dir.path());
        repo.note_mut("2024-01-01-1200-00").unwrap().meta.title = "Hello Mars".to_string();

        let plan = repo.plan().unwrap();
        let mut log = Vec::new();
        assert!(repo.apply(plan, &mut log).unwrap());
        assert!(log.is_empty());

        let new = dir.path().join("notes/2024-01/2024-01-01-1200-00-hello-mars.md");
        assert!(!old.exists());
        assert!(new.exists());
        assert_eq!(repo.note_paths()["2024-01-01-1200-00-hello-mars"], new);
        assert!(!repo.notes().contains_key("2024-01-01-1200-00"));

        let reloaded = load(dir.path());
        assert_eq!(reloaded.notes()["2024-01-01-1200-00-hello-mars"].meta.title, "Hello Mars");
    }

    #[test]
    fn test_replan_after_apply_is_noop() {
        let dir = tempdir().unwrap();
        write_note(dir.path(), "2024-01-01-1200-00", &note(0, "", &[]));
        write_note(dir.path(), "2024-01-01-1200-01-b", &note(1, "b", &[]));

        let mut repo = load(dir.path());
        repo.note_mut("2024-01-01-1200-00").unwrap().meta.title = "a".to_string();
        repo.note_mut("2024-01-01-1200-01-b").unwrap().content = "edited".to_string();

        let plan = repo.plan().unwrap();
        assert_eq!(plan.len(), 3);
        assert!(repo.apply(plan, &mut Vec::new()).unwrap());

        assert_eq!(repo.plan().unwrap().operations(), &[Operation::RebuildTagsFs]);
        assert_eq!(load(dir.path()).plan().unwrap().operations(), &[Operation::RebuildTagsFs]);
    }

    #[test]
    fn test_update_rewrites_in_place() {
        let dir = tempdir().unwrap();
        let path = write_note(dir.path(), "2024-01-01-1200-00-a", &note(0, "a", &[]));

        let mut repo = load(dir.path());
        repo.note_mut("2024-01-01-1200-00-a").unwrap().content = "new body".to_string();
        let plan = repo.plan().unwrap();
        assert!(repo.apply(plan, &mut Vec::new()).unwrap());

        assert!(stdfs::read_to_string(&path).unwrap().ends_with("---\nnew body"));
    }

    #[test]
    fn test_conflicts_abort_without_touching_disk() {
        let dir = tempdir().unwrap();
        let x = write_note(dir.path(), "x", &note(0, "same", &["t"]));
        let y = write_note(dir.path(), "y", &note(0, "same", &["t"]));

        let mut repo = load(dir.path());
        let plan = repo.plan().unwrap();
        let mut log = Vec::new();
        assert!(!repo.apply(plan, &mut log).unwrap());

        let log = String::from_utf8(log).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.lines().all(|l| l.starts_with("ERROR: can not rename note")));
        assert!(x.exists() && y.exists());
        assert!(!dir.path().join("tags").exists());
        assert!(!dir.path().join("notes/2024-01/2024-01-01-1200-00-same.md").exists());
    }

    #[test]
    fn test_chain_keeps_both_notes() {
        let dir = tempdir().unwrap();
        // "2024-01-01-1200-00" becomes "-b"; the current "-b" note moves to its own name.
        write_note(dir.path(), "2024-01-01-1200-00", &note(0, "b", &[]));
        write_note(dir.path(), "2024-01-01-1200-00-b", &note(1, "bee", &[]));

        let mut repo = load(dir.path());
        let plan = repo.plan().unwrap();
        assert!(repo.apply(plan, &mut Vec::new()).unwrap());

        let reloaded = load(dir.path());
        let names: Vec<&String> = reloaded.notes().keys().collect();
        assert_eq!(names, vec!["2024-01-01-1200-00-b", "2024-01-01-1200-01-bee"]);
        assert_eq!(reloaded.notes()["2024-01-01-1200-00-b"].meta.title, "b");
    }

    #[cfg(unix)]
    #[test]
    fn test_rebuild_tags_fs() {
        let dir = tempdir().unwrap();
        let a = write_note(dir.path(), "2024-01-01-1200-00-a", &note(0, "a", &["proj/a", "work"]));
        let b = write_note(dir.path(), "2024-01-01-1200-01-b", &note(1, "b", &["proj/a", "work"]));
        let stale = dir.path().join("tags/old/stale.md");
        stdfs::create_dir_all(stale.parent().unwrap()).unwrap();
        stdfs::write(&stale, "x").unwrap();

        let mut repo = load(dir.path());
        let plan = repo.plan().unwrap();
        assert!(repo.apply(plan, &mut Vec::new()).unwrap());

        let tags = dir.path().join("tags");
        assert!(!tags.join("old").exists());
        assert_eq!(
            stdfs::read_link(tags.join("proj/a/2024-01-01-1200-00-a.md")).unwrap(),
            a
        );
        assert_eq!(
            stdfs::read_link(tags.join("work/2024-01-01-1200-01-b.md")).unwrap(),
            b
        );
        assert_eq!(
            stdfs::read_to_string(tags.join("work/2024-01-01-1200-00-a.md")).unwrap(),
            stdfs::read_to_string(&a).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_rebuild_many_notes() {
        let dir = tempdir().unwrap();
        for second in 0..17 {
            let n = note(second, &format!("n{second}"), &["all"]);
            write_note(dir.path(), &crate::identity::canonical_name(&n), &n);
        }

        let mut repo = load(dir.path());
        let plan = repo.plan().unwrap();
        assert!(repo.apply(plan, &mut Vec::new()).unwrap());

        let links = stdfs::read_dir(dir.path().join("tags/all")).unwrap().count();
        assert_eq!(links, 17);
    }

    #[test]
    fn test_tag_dir_stays_inside_tags() {
        let tags = Path::new("/data/tags");
        assert_eq!(
            tag_dir(tags, "n", "/srv/outside").unwrap(),
            PathBuf::from("/data/tags/srv/outside")
        );
        assert_eq!(
            tag_dir(tags, "n", "./proj//a/").unwrap(),
            PathBuf::from("/data/tags/proj/a")
        );
        assert!(matches!(
            tag_dir(tags, "n", "proj/../../etc"),
            Err(NoteError::TagOutsideTree { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_rebuild_keeps_links_under_tags() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        write_note(dir.path(), "2024-01-01-1200-00-a", &note(0, "a", &[]));
        write_note(dir.path(), "2024-01-01-1200-01-b", &note(1, "b", &[]));

        let absolute = outside.path().join("abs").to_string_lossy().into_owned();
        let mut repo = load(dir.path());
        repo.note_mut("2024-01-01-1200-00-a").unwrap().meta.tags = vec![absolute.clone()];
        repo.note_mut("2024-01-01-1200-01-b").unwrap().meta.tags = vec!["../escaped".to_string()];

        let plan = repo.plan().unwrap();
        let err = repo.apply(plan, &mut Vec::new()).unwrap_err();
        match err {
            NoteError::BuildTagsFs(list) => {
                assert_eq!(list.len(), 1);
                assert!(matches!(
                    list.iter().next(),
                    Some(NoteError::TagOutsideTree { tag, .. }) if tag == "../escaped"
                ));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(!outside.path().join("abs").exists());
        assert!(!dir.path().join("escaped").exists());
        let link = dir
            .path()
            .join("tags")
            .join(absolute.trim_start_matches('/'))
            .join("2024-01-01-1200-00-a.md");
        assert!(stdfs::read_link(link).is_ok());
    }

    #[test]
    fn test_rebuild_collects_errors() {
        let dir = tempdir().unwrap();
        write_note(dir.path(), "2024-01-01-1200-00-a", &note(0, "a", &["t"]));
        write_note(dir.path(), "2024-01-01-1200-01-b", &note(1, "b", &["t"]));

        let mut repo = load(dir.path());
        // Paths may not contain NUL, so this tag cannot become a directory.
        repo.note_mut("2024-01-01-1200-00-a").unwrap().meta.tags = vec!["bad\0tag".to_string()];

        let err = repo.rebuild_tags_fs().unwrap_err();
        match err {
            NoteError::BuildTagsFs(list) => assert_eq!(list.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
