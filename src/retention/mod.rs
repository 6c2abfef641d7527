//! Retention engine for pruning old entries from a directory.
//!
//! A run proceeds in three phases:
//! 1. Scan the direct children of the target directory
//! 2. Sort them oldest first and pick a cut index from the keep policies and
//!    the minimum-keep backstop
//! 3. Classify, list, move or delete everything before the cut
//!
//! Destructive actions are gated by a single confirmation per batch, and a
//! batch keeps going past individual failures so one stubborn file does not
//! block the rest.

mod confirm;
mod dispatch;
mod ops;
mod policy;
mod relocate;
mod runner;
mod scanner;

#[cfg(feature = "cli")]
pub use confirm::TerminalPrompt;
pub use confirm::{ConfirmMode, ConfirmPrompt, Confirmation, confirm_batch};
pub use dispatch::{Action, BatchError, BatchKind, EntryFailure, dispatch};
pub use ops::{EntryError, EntryOps, LocalFs};
pub use policy::{
    KeepAtOrAfter, KeepPolicy, Partition, PolicySet, apply_backstop, cut_index, sort_oldest_first,
};
pub use relocate::{RelocateError, is_cross_device, relocate};
pub use runner::{Outcome, PruneError, PruneRequest, RunSummary, run};
pub use scanner::{DirEntryRecord, EntryKind, ScanError, ScanOptions, scan_directory};
