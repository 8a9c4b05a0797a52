//! Command handlers.
//!
//! Each handler writes its normal output to `out` and conflict reports to `log`, and
//! returns whether the command completed.

use crate::cli::Command;
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use note_store::{ref_to_name, Layout, Meta, Note, NoteError, Repository};
use std::io::Write;
use std::path::Path;

pub fn run<O: Write, L: Write>(
    command: Command,
    config: &Config,
    root: &Path,
    out: &mut O,
    log: &mut L,
) -> Result<bool> {
    match command {
        Command::New { title, href, tags } => new_note(root, title, href, tags, out),
        Command::Sync { dry } => sync(root, dry, config.sync.verbose, out, log),
        Command::Tree => tree(root, out),
        Command::List => list(root, out),
        Command::Show { reference } => show(root, &reference, out),
        Command::Last => last(root, out),
        Command::RenameTag { from, to } => rename_tag(root, &from, &to, out, log),
        Command::Help => {
            writeln!(out, "{}", crate::cli::USAGE)?;
            Ok(true)
        }
    }
}

/// Discover note paths only.
fn open_paths(root: &Path) -> Result<Repository> {
    let mut repo = Repository::new(Layout::new(root));
    repo.load_paths()
        .with_context(|| format!("could not list notes under {}", root.display()))?;
    Ok(repo)
}

/// Discover and parse every note.
fn open(root: &Path) -> Result<Repository> {
    let mut repo = open_paths(root)?;
    repo.load_notes().context("could not load notes")?;
    Ok(repo)
}

fn new_note<O: Write>(
    root: &Path,
    title: String,
    href: String,
    tags: Vec<String>,
    out: &mut O,
) -> Result<bool> {
    let now = Local::now().naive_local();
    let mut meta = Meta::new(now.with_nanosecond(0).unwrap_or(now));
    meta.title = title;
    meta.href = href;
    meta.tags = tags;

    let mut repo = open_paths(root)?;
    let path = repo
        .add_note(Note::new(meta, ""))
        .context("could not add note")?;
    writeln!(out, "{}", path.display())?;
    Ok(true)
}

fn sync<O: Write, L: Write>(
    root: &Path,
    dry: bool,
    verbose: bool,
    out: &mut O,
    log: &mut L,
) -> Result<bool> {
    let mut repo = open(root)?;
    let plan = repo.plan().context("could not plan sync")?;

    if dry || verbose {
        writeln!(out, "{plan}")?;
    }
    if dry {
        return Ok(true);
    }

    let applied = repo.apply(plan, log).context("could not apply sync")?;
    Ok(applied)
}

fn tree<O: Write>(root: &Path, out: &mut O) -> Result<bool> {
    let repo = open(root)?;
    let tree = repo.tree().context("could not build tag tree")?;
    tree.render(out)?;
    Ok(true)
}

fn list<O: Write>(root: &Path, out: &mut O) -> Result<bool> {
    let repo = open_paths(root)?;
    for path in repo.note_paths().values() {
        writeln!(out, "{}", path.display())?;
    }
    Ok(true)
}

fn show<O: Write>(root: &Path, reference: &str, out: &mut O) -> Result<bool> {
    let repo = open(root)?;
    let note = repo
        .find_note(reference)
        .ok_or_else(|| NoteError::NotFound(ref_to_name(reference)))?;
    writeln!(out, "{}", note.to_markdown()?)?;
    Ok(true)
}

fn last<O: Write>(root: &Path, out: &mut O) -> Result<bool> {
    let repo = open(root)?;
    let name = repo.last_note()?;
    let path = repo
        .note_paths()
        .get(name)
        .ok_or_else(|| NoteError::DataIntegrity(format!("no path found for {name}")))?;
    writeln!(out, "{}", path.display())?;
    Ok(true)
}

fn rename_tag<O: Write, L: Write>(
    root: &Path,
    from: &str,
    to: &str,
    out: &mut O,
    log: &mut L,
) -> Result<bool> {
    let mut repo = open(root)?;
    let count = repo.rename_tag(from, to);
    let plan = repo.plan().context("could not plan sync")?;
    let applied = repo.apply(plan, log).context("could not apply sync")?;
    writeln!(out, "renamed tags in {count} notes")?;
    Ok(applied)
}
