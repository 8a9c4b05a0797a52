//! note-sync - Keep a directory of markdown notes in canonical shape.
//!
//! Features:
//! - Notes named after their date and title, filed by month
//! - Sync renames and rewrites notes whose header changed
//! - Tag index rebuilt as a tree of symlinks
//! - Tag tree, listing and lookup by name, path or `notes://` link

mod cli;
mod commands;
mod config;

use anyhow::Result;
use config::Config;
use std::{env, io, process::ExitCode};
use tracing::Level;

fn main() -> Result<ExitCode> {
    let cli = cli::parse(env::args().skip(1))?;
    let mut config = Config::load();
    config.sync.verbose |= cli.verbose;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.log.level.parse().unwrap_or(Level::WARN)
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    if cli.command == cli::Command::Help {
        println!("{}", cli::USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let root = config.resolve_root()?;
    tracing::debug!(root = %root.display(), "using notes root");

    let completed = commands::run(
        cli.command,
        &config,
        &root,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;

    Ok(if completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
