//! One retention pass over a target directory.
//!
//! Scan, order, decide and act, in that order. Configuration problems are
//! caught before a [`PruneRequest`] exists, so a run never starts with bad
//! input and never touches the filesystem before the scan succeeds.

use std::{io, io::Write, path::PathBuf};

use thiserror::Error;

use super::{
    confirm::{ConfirmMode, ConfirmPrompt},
    dispatch::{Action, BatchError, dispatch},
    ops::EntryOps,
    policy::{Partition, PolicySet, sort_oldest_first},
    scanner::{ScanError, ScanOptions, scan_directory},
};
use crate::config::ConfigError;

/// A fully validated retention run.
#[derive(Debug)]
pub struct PruneRequest {
    /// Directory whose direct children are considered.
    pub target: PathBuf,
    pub scan: ScanOptions,
    /// Minimum number of newest entries that always survive.
    pub keep: usize,
    pub policies: PolicySet,
    pub confirm: ConfirmMode,
    pub action: Action,
}

/// Counts from a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries that passed the scan filter.
    pub scanned: usize,
    /// Entries before the cut.
    pub selected: usize,
    pub deleted: usize,
    pub moved: usize,
}

impl RunSummary {
    /// Entries actually deleted or moved.
    pub fn total(&self) -> usize {
        self.deleted + self.moved
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(RunSummary),
    /// The operator answered "no" at the confirmation prompt. Nothing was changed.
    Declined,
}

#[derive(Debug, Error)]
pub enum PruneError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Could not read confirmation: {0}")]
    Prompt(#[source] io::Error),

    #[error("Could not write output: {0}")]
    Output(#[source] io::Error),
}

/// Run one retention pass described by `request`.
///
/// Listings go to `out`; confirmation goes through `prompt`; deletes and moves
/// go through `ops`.
pub fn run(
    request: &PruneRequest,
    prompt: &dyn ConfirmPrompt,
    ops: &dyn EntryOps,
    out: &mut dyn Write,
) -> Result<Outcome, PruneError> {
    let mut entries = scan_directory(&request.target, request.scan)?;
    sort_oldest_first(&mut entries);

    let partition = Partition::decide(&entries, &request.policies, request.keep);
    tracing::info!(
        target_dir = %request.target.display(),
        scanned = entries.len(),
        remove = partition.remove().len(),
        keep = partition.keep().len(),
        policies = ?request.policies,
        "Retention decision"
    );

    let outcome = dispatch(
        &partition,
        &request.action,
        request.confirm,
        prompt,
        ops,
        out,
    )?;

    match &outcome {
        Outcome::Completed(summary) if summary.has_changes() => {
            tracing::info!(
                deleted = summary.deleted,
                moved = summary.moved,
                "Retention run complete"
            );
        }
        Outcome::Completed(_) => tracing::debug!("Retention run complete, nothing changed"),
        Outcome::Declined => tracing::info!("Retention run declined, nothing changed"),
    }

    Ok(outcome)
}
