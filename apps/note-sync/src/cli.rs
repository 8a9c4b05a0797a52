//! Command-line argument parsing.

use anyhow::{anyhow, bail, Result};

pub const USAGE: &str = "\
usage: note-sync [-v|--verbose] <command>

commands:
  new [--title T] [--href U] [--tag X]...   add a note dated now
  sync [--dry]                              plan and apply pending changes
  tree                                      print the tag tree
  list                                      print every note path
  show <ref>                                print a note by name, path or notes:// link
  last                                      print the path of the latest note
  rename-tag --from A --to B                rename a tag and sync";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New {
        title: String,
        href: String,
        tags: Vec<String>,
    },
    Sync {
        dry: bool,
    },
    Tree,
    List,
    Show {
        reference: String,
    },
    Last,
    RenameTag {
        from: String,
        to: String,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub verbose: bool,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let mut verbose = false;
    while let Some(flag) = args.next_if(|a| a.starts_with('-')) {
        match flag.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => {
                return Ok(Cli {
                    verbose,
                    command: Command::Help,
                })
            }
            other => bail!("unknown option {other}"),
        }
    }

    let Some(name) = args.next() else {
        return Ok(Cli {
            verbose,
            command: Command::Help,
        });
    };
    let rest: Vec<String> = args.collect();

    let command = match name.as_str() {
        "new" => parse_new(&rest)?,
        "sync" => match rest.as_slice() {
            [] => Command::Sync { dry: false },
            [flag] if flag == "--dry" => Command::Sync { dry: true },
            _ => bail!("sync takes only --dry"),
        },
        "tree" => no_args(&name, &rest, Command::Tree)?,
        "list" => no_args(&name, &rest, Command::List)?,
        "last" => no_args(&name, &rest, Command::Last)?,
        "show" => match rest.as_slice() {
            [reference] => Command::Show {
                reference: reference.clone(),
            },
            _ => bail!("show takes exactly one reference"),
        },
        "rename-tag" => parse_rename_tag(&rest)?,
        "help" => Command::Help,
        other => bail!("unknown command {other}"),
    };

    Ok(Cli { verbose, command })
}

fn no_args(name: &str, rest: &[String], command: Command) -> Result<Command> {
    if !rest.is_empty() {
        bail!("{name} takes no arguments");
    }
    Ok(command)
}

fn parse_new(rest: &[String]) -> Result<Command> {
    let mut title = String::new();
    let mut href = String::new();
    let mut tags = Vec::new();

    let mut args = rest.iter();
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| anyhow!("{flag} needs a value"))?
            .clone();
        match flag.as_str() {
            "--title" => title = value,
            "--href" => href = value,
            "--tag" => tags.extend(note_store::parse_tags(&value)),
            other => bail!("unknown option for new: {other}"),
        }
    }

    Ok(Command::New { title, href, tags })
}

fn parse_rename_tag(rest: &[String]) -> Result<Command> {
    let mut from = None;
    let mut to = None;

    let mut args = rest.iter();
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| anyhow!("{flag} needs a value"))?
            .clone();
        match flag.as_str() {
            "--from" => from = Some(value),
            "--to" => to = Some(value),
            other => bail!("unknown option for rename-tag: {other}"),
        }
    }

    match (from, to) {
        (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => {
            Ok(Command::RenameTag { from, to })
        }
        _ => bail!("rename-tag needs --from and --to"),
    }
}
