//! Canonical note names, file layout and note references.

use crate::note::Note;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension of note files.
pub const NOTE_EXTENSION: &str = "md";

const NAME_DATE_FORMAT: &str = "%Y-%m-%d-%H%M-%S";
const FOLDER_DATE_FORMAT: &str = "%Y-%m";

static URI_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^notes(?:\+notes)?://(?P<name>.*?)(?:\..*)?$").unwrap());

/// Lower-case `value` and reduce it to `[a-z0-9-]`, with single dashes and no dash at either end.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// Name a note should have, derived from its date and title.
pub fn canonical_name(note: &Note) -> String {
    let mut name = note.meta.date.format(NAME_DATE_FORMAT).to_string();
    if !note.meta.title.is_empty() {
        name.push('-');
        name.push_str(&slugify(&note.meta.title));
    }
    name
}

/// Note name of a file path: its stem.
pub fn name_from_path(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Name from a `notes://<name>` or `notes+notes://<name>` URI; empty if not a URI.
pub fn name_from_uri(uri: &str) -> String {
    URI_REF_RE
        .captures(uri)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn is_uri_ref(reference: &str) -> bool {
    URI_REF_RE.is_match(reference)
}

pub fn is_path_ref(reference: &str) -> bool {
    !is_uri_ref(reference) && reference.contains(['/', '.'])
}

pub fn is_name_ref(reference: &str) -> bool {
    !is_uri_ref(reference) && !is_path_ref(reference)
}

/// Resolve a name, path or URI reference to a note name.
pub fn ref_to_name(reference: &str) -> String {
    if is_uri_ref(reference) {
        name_from_uri(reference)
    } else if is_path_ref(reference) {
        name_from_path(reference)
    } else {
        reference.to_string()
    }
}

/// Where notes and tag links live under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// `root` should be absolute; symlinks in the tag tree point at paths built from it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.root.join("tags")
    }

    /// `<root>/notes/<YYYY-MM>/<canonical name>.md`
    pub fn note_path(&self, note: &Note) -> PathBuf {
        self.notes_dir()
            .join(note.meta.date.format(FOLDER_DATE_FORMAT).to_string())
            .join(format!("{}.{}", canonical_name(note), NOTE_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Meta;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn titled(title: &str) -> Note {
        let mut meta = Meta::new(date());
        meta.title = title.to_string();
        Note::new(meta, "")
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
        assert_eq!(slugify("x402 Payment-Protocol"), "x402-payment-protocol");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name(&titled("Hello World")), "2024-01-01-1200-00-hello-world");
        assert_eq!(canonical_name(&titled("")), "2024-01-01-1200-00");
    }

    #[test]
    fn test_note_path() {
        let layout = Layout::new("/data");
        assert_eq!(
            layout.note_path(&titled("Hello")),
            PathBuf::from("/data/notes/2024-01/2024-01-01-1200-00-hello.md")
        );
        assert_eq!(layout.tags_dir(), PathBuf::from("/data/tags"));
    }

    #[test]
    fn test_name_from_uri() {
        assert_eq!(name_from_uri("notes://example"), "example");
        assert_eq!(name_from_uri("notes://example.md"), "example");
        assert_eq!(name_from_uri("notes://example.foo.bar.md"), "example");
        assert_eq!(name_from_uri("notes//example"), "");
    }

    #[test]
    fn test_ref_kinds() {
        assert!(is_uri_ref("notes://example"));
        assert!(is_uri_ref("notes+notes://example"));
        assert!(!is_uri_ref("notes:/example"));
        assert!(!is_uri_ref("notes++notes://example"));
        assert!(!is_uri_ref("notesnotes://example"));

        assert!(is_name_ref("example"));
        assert!(!is_name_ref("notes://example"));
        assert!(!is_name_ref("notes:/example"));

        assert!(is_path_ref("/file/path/example.md"));
        assert!(is_path_ref("example.md"));
        assert!(is_path_ref("notes:/example"));
        assert!(!is_path_ref("notes://example"));
    }

    #[test]
    fn test_ref_to_name() {
        assert_eq!(ref_to_name("/file/path/example.md"), "example");
        assert_eq!(ref_to_name("/file/path/example"), "example");
        assert_eq!(ref_to_name("example.md"), "example");
        assert_eq!(ref_to_name("notes://example"), "example");
        assert_eq!(ref_to_name("example"), "example");
    }

    proptest! {
        #[test]
        fn test_slug_shape(title in ".{0,60}") {
            let slug = slugify(&title);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert_eq!(slugify(&slug), slug.clone());
        }

        #[test]
        fn test_canonical_name_is_stable(title in "[ -~]{0,40}") {
            let note = titled(&title);
            prop_assert_eq!(canonical_name(&note), canonical_name(&note.clone()));
            if title.is_empty() {
                prop_assert_eq!(canonical_name(&note), "2024-01-01-1200-00");
            }
        }
    }
}
