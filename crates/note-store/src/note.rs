//! Notes and their on-disk markdown form.

use crate::error::NoteResult;
use crate::meta::Meta;
use crate::tags::split_tag;

/// Line that opens and closes the header block.
pub const META_SEPARATOR: &str = "---";

/// A note: header metadata plus free-form content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub meta: Meta,
    pub content: String,
    /// Serialized form as last read from disk; empty for new notes.
    pub raw: String,
}

impl Note {
    pub fn new(meta: Meta, content: impl Into<String>) -> Self {
        Self {
            meta,
            content: content.into(),
            raw: String::new(),
        }
    }

    /// Parse a note from its markdown form.
    pub fn parse(input: &str) -> NoteResult<Self> {
        let mut raw_lines = Vec::new();
        let mut meta_lines = Vec::new();
        let mut content_lines = Vec::new();
        let mut separators = 0;

        for line in input.lines() {
            raw_lines.push(line);
            if separators < 2 && line == META_SEPARATOR {
                separators += 1;
                continue;
            }
            if separators == 1 {
                meta_lines.push(line);
            } else {
                content_lines.push(line);
            }
        }

        let meta = Meta::from_yaml(&meta_lines.join("\n"))?;
        Ok(Self {
            meta,
            content: content_lines.join("\n"),
            raw: raw_lines.join("\n"),
        })
    }

    /// Serialize to markdown: fenced header, then content.
    pub fn to_markdown(&self) -> NoteResult<String> {
        let mut out = String::with_capacity(self.content.len() + 128);
        out.push_str(META_SEPARATOR);
        out.push('\n');
        out.push_str(&self.meta.to_yaml()?);
        out.push_str(META_SEPARATOR);
        if !self.content.is_empty() {
            out.push('\n');
            out.push_str(&self.content);
        }
        Ok(out)
    }

    /// Whether the serialized form differs from what was loaded.
    pub fn is_changed(&self) -> NoteResult<bool> {
        Ok(self.raw.is_empty() || self.raw != self.to_markdown()?)
    }

    /// Replace the leading `from` segments of every matching tag with `to`.
    ///
    /// Matching is per segment, so `work` renames `work/x` but not `workshop`.
    /// Returns whether any tag changed.
    pub fn rename_tag(&mut self, from: &str, to: &str) -> bool {
        let from_parts = split_tag(from);
        let to_parts = split_tag(to);
        let mut changed = false;
        let mut tags: Vec<String> = Vec::with_capacity(self.meta.tags.len());

        for tag in &self.meta.tags {
            let parts = split_tag(tag);
            let renamed = if parts.starts_with(&from_parts) {
                let new_tag = to_parts
                    .iter()
                    .chain(&parts[from_parts.len()..])
                    .copied()
                    .collect::<Vec<_>>()
                    .join("/");
                if new_tag != *tag {
                    changed = true;
                }
                new_tag
            } else {
                tag.clone()
            };
            if !tags.contains(&renamed) {
                tags.push(renamed);
            }
        }

        if changed {
            self.meta.tags = tags;
        }
        changed
    }
}
