//! Acting on a retention decision.
//!
//! Exactly one action runs per invocation. Listing actions only write to the
//! supplied output. Mutating actions ask for confirmation once per batch, then
//! attempt every entry and report all failures together.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::{
    Outcome, PruneError, RunSummary,
    confirm::{ConfirmMode, ConfirmPrompt, Confirmation, confirm_batch},
    ops::{EntryError, EntryOps},
    policy::Partition,
    scanner::DirEntryRecord,
};

/// What to do with the entries selected for removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Action {
    /// Print every entry prefixed with `REMOVE` or `KEEP`.
    Classify,
    /// Print the entries selected for removal.
    PrintOnly,
    /// Move the entries selected for removal into an existing directory.
    Move { destination: PathBuf },
    /// Delete the entries selected for removal.
    #[default]
    Delete,
}

impl Action {
    /// Pick the action from independent flags.
    ///
    /// Precedence is classify, then print-only, then move, then delete.
    pub fn select(classify: bool, print_only: bool, move_to: Option<PathBuf>) -> Self {
        if classify {
            Self::Classify
        } else if print_only {
            Self::PrintOnly
        } else if let Some(destination) = move_to {
            Self::Move { destination }
        } else {
            Self::Delete
        }
    }
}

/// The mutating batch an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Delete,
    Move,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "deleting"),
            Self::Move => write!(f, "moving"),
        }
    }
}

/// One entry that could not be deleted or moved.
#[derive(Debug)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub error: EntryError,
}

/// Aggregate of every per-entry failure in a batch.
#[derive(Debug, Error)]
#[error("Encountered errors when {kind}:{}", render_failures(.failures))]
pub struct BatchError {
    pub kind: BatchKind,
    pub failures: Vec<EntryFailure>,
}

fn render_failures(failures: &[EntryFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("\n  {}: {}", failure.path.display(), failure.error))
        .collect()
}

/// Run `action` against `partition`.
#[instrument(skip_all, fields(action = ?action, remove = partition.remove().len()))]
pub fn dispatch(
    partition: &Partition<'_>,
    action: &Action,
    confirm: ConfirmMode,
    prompt: &dyn ConfirmPrompt,
    ops: &dyn EntryOps,
    out: &mut dyn Write,
) -> Result<Outcome, PruneError> {
    let mut summary = RunSummary {
        scanned: partition.entries().len(),
        selected: partition.remove().len(),
        ..Default::default()
    };

    match action {
        Action::Classify => classify(partition, out)?,
        Action::PrintOnly => print_paths(partition.remove(), out)?,
        Action::Move { destination } => {
            let to_move = partition.remove();
            if to_move.is_empty() {
                return Ok(Outcome::Completed(summary));
            }
            let description = move_description(to_move, destination);
            if confirm_batch(confirm, prompt, &description).map_err(PruneError::Prompt)?
                == Confirmation::Declined
            {
                return Ok(Outcome::Declined);
            }
            summary.moved = move_entries(to_move, destination, ops)?;
        }
        Action::Delete => {
            let to_delete = partition.remove();
            if to_delete.is_empty() {
                return Ok(Outcome::Completed(summary));
            }
            let description = delete_description(to_delete);
            if confirm_batch(confirm, prompt, &description).map_err(PruneError::Prompt)?
                == Confirmation::Declined
            {
                return Ok(Outcome::Declined);
            }
            summary.deleted = delete_entries(to_delete, ops)?;
        }
    }

    Ok(Outcome::Completed(summary))
}

fn classify(partition: &Partition<'_>, out: &mut dyn Write) -> Result<(), PruneError> {
    let cut = partition.cut_index();
    for (index, entry) in partition.entries().iter().enumerate() {
        let label = if index < cut { "REMOVE" } else { "KEEP" };
        writeln!(out, "{label} {}", entry.relative_path.display()).map_err(PruneError::Output)?;
    }
    Ok(())
}

fn print_paths(entries: &[DirEntryRecord], out: &mut dyn Write) -> Result<(), PruneError> {
    for entry in entries {
        writeln!(out, "{}", entry.relative_path.display()).map_err(PruneError::Output)?;
    }
    Ok(())
}

fn delete_description(entries: &[DirEntryRecord]) -> String {
    let mut description = String::from("The following files will be deleted:");
    append_paths(&mut description, entries);
    description
}

fn move_description(entries: &[DirEntryRecord], destination: &Path) -> String {
    let mut description = format!(
        "The following files will be moved to \"{}\":",
        destination.display()
    );
    append_paths(&mut description, entries);
    description
}

fn append_paths(description: &mut String, entries: &[DirEntryRecord]) {
    for entry in entries {
        description.push_str("\n  ");
        description.push_str(&entry.relative_path.to_string_lossy());
    }
}

fn delete_entries(entries: &[DirEntryRecord], ops: &dyn EntryOps) -> Result<usize, BatchError> {
    let mut failures = Vec::new();
    let mut deleted = 0;
    for entry in entries {
        match ops.remove_all(&entry.full_path) {
            Ok(()) => {
                info!(path = %entry.relative_path.display(), "Deleted");
                deleted += 1;
            }
            Err(error) => {
                warn!(path = %entry.relative_path.display(), error = %error, "Failed to delete");
                failures.push(EntryFailure {
                    path: entry.relative_path.clone(),
                    error,
                });
            }
        }
    }
    finish_batch(BatchKind::Delete, deleted, failures)
}

fn move_entries(
    entries: &[DirEntryRecord],
    destination: &Path,
    ops: &dyn EntryOps,
) -> Result<usize, BatchError> {
    let mut failures = Vec::new();
    let mut moved = 0;
    for entry in entries {
        let result = match entry.full_path.file_name() {
            Some(name) => ops.relocate(&entry.full_path, &destination.join(name)),
            None => Err(EntryError::NoFileName),
        };
        match result {
            Ok(()) => {
                info!(
                    path = %entry.relative_path.display(),
                    destination = %destination.display(),
                    "Moved"
                );
                moved += 1;
            }
            Err(error) => {
                warn!(path = %entry.relative_path.display(), error = %error, "Failed to move");
                failures.push(EntryFailure {
                    path: entry.relative_path.clone(),
                    error,
                });
            }
        }
    }
    finish_batch(BatchKind::Move, moved, failures)
}

fn finish_batch(
    kind: BatchKind,
    succeeded: usize,
    failures: Vec<EntryFailure>,
) -> Result<usize, BatchError> {
    if failures.is_empty() {
        Ok(succeeded)
    } else {
        Err(BatchError { kind, failures })
    }
}
