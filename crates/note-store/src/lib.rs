//! # note-store
//!
//! File-backed note repository for the note-sync tool.
//!
//! ## Features
//!
//! - Markdown notes with a YAML header (title, date, tags, link)
//! - Canonical note names derived from date and title
//! - Sync planning that detects renames, rewrites and name collisions up front
//! - Plan execution with a rebuilt tag index of symlinks
//! - Hierarchical tag tree with descendant counts

mod apply;
mod batch;
mod error;
pub mod fs;
mod identity;
mod meta;
mod note;
mod plan;
mod repository;
mod tags;

pub use batch::{run_batches, BatchOutcome, BATCH_COUNT};
pub use error::{ErrorList, NoteError, NoteResult};
pub use identity::{
    canonical_name, is_name_ref, is_path_ref, is_uri_ref, name_from_path, name_from_uri,
    ref_to_name, slugify, Layout, NOTE_EXTENSION,
};
pub use meta::{format_time, parse_time, Meta, DATE_FORMAT};
pub use note::{Note, META_SEPARATOR};
pub use plan::{Operation, Plan};
pub use repository::Repository;
pub use tags::{parse_tags, serialize_tags, split_tag, Node, Tree};
