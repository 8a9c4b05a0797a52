//! Tag parsing and the hierarchical tag tree.

use crate::error::{NoteError, NoteResult};
use crate::note::Note;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Split a tag header value on commas and whitespace.
pub fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn serialize_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Split a tag into its path segments (`proj/a` -> `["proj", "a"]`).
pub fn split_tag(tag: &str) -> Vec<&str> {
    tag.split('/').collect()
}

/// A node in the tag tree.
#[derive(Debug, Default)]
pub struct Node<'a> {
    /// Notes whose tag path ends at this node.
    pub notes: BTreeMap<String, &'a Note>,
    pub children: BTreeMap<String, Node<'a>>,
    /// Number of note/tag-path associations at or below this node.
    pub count_desc: usize,
}

/// Tag tree built over a set of notes.
#[derive(Debug, Default)]
pub struct Tree<'a> {
    pub all_notes: BTreeMap<String, &'a Note>,
    pub nodes: BTreeMap<String, Node<'a>>,
}

impl<'a> Tree<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(name, note)` pairs.
    pub fn build<I>(notes: I) -> NoteResult<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a Note)>,
    {
        let mut tree = Self::new();
        for (name, note) in notes {
            tree.add_note(name, note)?;
        }
        Ok(tree)
    }

    /// Insert a note under every one of its tag paths.
    pub fn add_note(&mut self, name: &str, note: &'a Note) -> NoteResult<()> {
        if self.all_notes.contains_key(name) {
            return Err(NoteError::Exists(name.to_string()));
        }
        self.all_notes.insert(name.to_string(), note);

        for tag in &note.meta.tags {
            let segments = split_tag(tag);
            if !insert_path(&mut self.nodes, &segments, name, note) {
                continue;
            }
            // Count only first insertions, on every node along the path.
            let mut nodes = &mut self.nodes;
            for segment in &segments {
                let Some(node) = nodes.get_mut(*segment) else {
                    break;
                };
                node.count_desc += 1;
                nodes = &mut node.children;
            }
        }

        Ok(())
    }

    /// Look up a node by tag path.
    pub fn node(&self, tag: &str) -> Option<&Node<'a>> {
        let mut segments = split_tag(tag).into_iter();
        let mut node = self.nodes.get(segments.next()?)?;
        for segment in segments {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Draw the tree with box-drawing prefixes, one `<segment> [<count>]` per line.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, ".")?;
        render_nodes(&self.nodes, out, &mut Vec::new())
    }
}

/// Walk/create nodes along `segments`; returns whether `name` was newly inserted at the end.
fn insert_path<'a>(
    nodes: &mut BTreeMap<String, Node<'a>>,
    segments: &[&str],
    name: &str,
    note: &'a Note,
) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let node = nodes.entry((*first).to_string()).or_default();
    if rest.is_empty() {
        if node.notes.contains_key(name) {
            return false;
        }
        node.notes.insert(name.to_string(), note);
        true
    } else {
        insert_path(&mut node.children, rest, name, note)
    }
}

fn render_nodes<W: Write>(
    nodes: &BTreeMap<String, Node<'_>>,
    out: &mut W,
    chain: &mut Vec<bool>,
) -> io::Result<()> {
    let count = nodes.len();
    for (i, (key, node)) in nodes.iter().enumerate() {
        let is_last = i + 1 == count;

        let mut line = String::new();
        for &last in chain.iter() {
            line.push_str(if last { "    " } else { "│   " });
        }
        line.push_str(if is_last { "└── " } else { "├── " });
        writeln!(out, "{}{} [{}]", line, key, node.count_desc)?;

        chain.push(is_last);
        render_nodes(&node.children, out, chain)?;
        chain.pop();
    }
    Ok(())
}
