//! Sync planning: diff the repository against canonical note names.

use crate::error::NoteResult;
use crate::identity::canonical_name;
use crate::repository::Repository;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// A planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Move a note from one name (and file) to another.
    RenameNote {
        from: String,
        to: String,
        /// Remove the old file: nothing else will claim `from`.
        delete_from: bool,
        error: Option<String>,
    },
    /// Rewrite a note's file in place.
    UpdateNote { name: String, error: Option<String> },
    /// Recreate the tag symlink tree from scratch.
    RebuildTagsFs,
}

impl Operation {
    /// Conflict message if this operation must not be executed.
    pub fn error(&self) -> Option<String> {
        match self {
            Operation::RenameNote {
                from,
                to,
                error: Some(reason),
                ..
            } => Some(format!(
                "can not rename note \"{from}\" to \"{to}\": {reason}"
            )),
            Operation::UpdateNote {
                name,
                error: Some(reason),
            } => Some(format!("can not update note \"{name}\": {reason}")),
            _ => None,
        }
    }

    pub fn is_executable(&self) -> bool {
        self.error().is_none()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::RenameNote {
                from,
                to,
                delete_from,
                ..
            } => write!(
                f,
                "rename note \"{from}\" to \"{to}\" (leaves orphan: {delete_from})"
            ),
            Operation::UpdateNote { name, .. } => write!(f, "update note \"{name}\""),
            Operation::RebuildTagsFs => write!(f, "rebuild tags filesystem"),
        }
    }
}

/// Ordered list of operations produced by [`Repository::plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    operations: Vec<Operation>,
}

impl Plan {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Conflict messages of all unexecutable operations.
    pub fn errors(&self) -> Vec<String> {
        self.operations.iter().filter_map(Operation::error).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.operations.iter().any(|op| !op.is_executable())
    }
}

impl From<Vec<Operation>> for Plan {
    fn from(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}

impl IntoIterator for Plan {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} operation(s) planned:", self.operations.len())?;
        for op in &self.operations {
            write!(f, "\n- {op}")?;
        }
        Ok(())
    }
}

impl Repository {
    /// Work out which notes must be renamed or rewritten. Does not touch the
    /// repository or the disk.
    pub fn plan(&self) -> NoteResult<Plan> {
        let mut keep: HashSet<&str> = HashSet::new();
        let mut move_to: HashMap<String, Vec<&str>> = HashMap::new();
        let mut move_from: BTreeMap<&str, String> = BTreeMap::new();
        let mut changed: BTreeSet<&str> = BTreeSet::new();

        for (old_name, note) in &self.notes {
            let new_name = canonical_name(note);
            if note.is_changed()? {
                changed.insert(old_name);
            }

            if *old_name == new_name {
                keep.insert(old_name);
            } else {
                move_to.entry(new_name.clone()).or_default().push(old_name);
                move_from.insert(old_name, new_name);
            }
        }

        let names: BTreeSet<&str> = move_from
            .keys()
            .copied()
            .chain(changed.iter().copied())
            .collect();

        let mut candidates: Vec<Operation> = Vec::with_capacity(names.len() + 1);
        for name in names {
            if let Some(target) = move_from.get(name) {
                let sources = move_to.get(target).map_or(0, Vec::len);
                let error = if sources > 1 {
                    Some(format!("{sources} other notes want to rename to this name"))
                } else if keep.contains(target.as_str()) {
                    Some("another note already has this name".to_string())
                } else {
                    None
                };
                candidates.push(Operation::RenameNote {
                    from: name.to_string(),
                    to: target.clone(),
                    // Orphaned: no note keeps or moves into the old name.
                    delete_from: !move_to.contains_key(name) && !keep.contains(name),
                    error,
                });
            } else {
                candidates.push(Operation::UpdateNote {
                    name: name.to_string(),
                    error: None,
                });
            }
        }

        let mut operations = order_rename_chains(candidates);
        operations.push(Operation::RebuildTagsFs);

        let plan = Plan::from(operations);
        tracing::debug!(operations = plan.len(), conflicts = plan.errors().len(), "planned sync");
        Ok(plan)
    }
}

/// Keep the given order, except that a rename into a name that is itself being
/// renamed away runs after that rename. Renames that form a cycle get an error.
fn order_rename_chains(candidates: Vec<Operation>) -> Vec<Operation> {
    let index_by_source: HashMap<String, usize> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, op)| match op {
            Operation::RenameNote { from, .. } => Some((from.clone(), i)),
            _ => None,
        })
        .collect();

    let mut slots: Vec<Option<Operation>> = candidates.into_iter().map(Some).collect();
    let mut cyclic: HashSet<usize> = HashSet::new();
    let mut order: Vec<usize> = Vec::with_capacity(slots.len());
    let mut emitted = vec![false; slots.len()];

    for start in 0..slots.len() {
        // Follow the chain start -> target's rename -> ... until an emitted or
        // non-rename link, then emit it back to front.
        let mut chain: Vec<usize> = Vec::new();
        let mut current = Some(start);
        while let Some(i) = current {
            if emitted[i] {
                break;
            }
            if let Some(pos) = chain.iter().position(|&c| c == i) {
                cyclic.extend(chain[pos..].iter().copied());
                break;
            }
            chain.push(i);
            current = match &slots[i] {
                Some(Operation::RenameNote { to, .. }) => index_by_source.get(to).copied(),
                _ => None,
            };
        }
        for &i in chain.iter().rev() {
            emitted[i] = true;
            order.push(i);
        }
    }

    order
        .into_iter()
        .filter_map(|i| {
            let mut op = slots[i].take()?;
            if cyclic.contains(&i) {
                if let Operation::RenameNote { error, to, .. } = &mut op {
                    error.get_or_insert_with(|| format!("rename cycle through \"{to}\""));
                }
            }
            Some(op)
        })
        .collect()
}
