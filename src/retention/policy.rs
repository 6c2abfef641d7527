//! Retention decisions: ordering, keep policies and the minimum-keep backstop.
//!
//! The decision phase reduces a scanned directory to a single cut index into
//! the oldest-first ordering. Everything before the cut is removed, everything
//! from the cut onward is kept, so the outcome is always a contiguous
//! prefix/suffix split.

use std::fmt;

use chrono::{DateTime, Utc};

use super::scanner::DirEntryRecord;

/// Stable sort of scanned entries by modification time, oldest first.
///
/// Entries sharing a timestamp keep their directory-listing order.
pub fn sort_oldest_first(entries: &mut [DirEntryRecord]) {
    // `sort_by` is a stable sort.
    entries.sort_by(|left, right| left.modified.cmp(&right.modified));
}

/// A predicate protecting entries from removal.
///
/// Each policy is independently sufficient: an entry is kept if any policy in
/// the set keeps it.
pub trait KeepPolicy {
    /// Whether `entry` is new enough to keep under this policy.
    fn keeps(&self, entry: &DirEntryRecord) -> bool;

    /// Short human-readable description, used in logs.
    fn describe(&self) -> String;
}

impl<F> KeepPolicy for F
where
    F: Fn(&DirEntryRecord) -> bool,
{
    fn keeps(&self, entry: &DirEntryRecord) -> bool {
        self(entry)
    }

    fn describe(&self) -> String {
        "custom predicate".to_string()
    }
}

/// Keep entries modified at or after a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAtOrAfter {
    threshold: DateTime<Utc>,
}

impl KeepAtOrAfter {
    pub fn new(threshold: DateTime<Utc>) -> Self {
        Self { threshold }
    }
}

impl KeepPolicy for KeepAtOrAfter {
    fn keeps(&self, entry: &DirEntryRecord) -> bool {
        entry.modified >= self.threshold
    }

    fn describe(&self) -> String {
        format!("modified at or after {}", self.threshold.to_rfc3339())
    }
}

/// Ordered, OR-combined collection of keep policies.
///
/// An empty set protects nothing; the cut is then decided by the backstop
/// alone.
#[derive(Default)]
pub struct PolicySet {
    policies: Vec<Box<dyn KeepPolicy>>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`PolicySet::push`].
    pub fn with(mut self, policy: impl KeepPolicy + 'static) -> Self {
        self.push(policy);
        self
    }

    pub fn push(&mut self, policy: impl KeepPolicy + 'static) {
        self.policies.push(Box::new(policy));
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether any policy keeps `entry`.
    pub fn keeps(&self, entry: &DirEntryRecord) -> bool {
        self.policies.iter().any(|policy| policy.keeps(entry))
    }

    /// Index of the first entry (in the given order) that any policy keeps,
    /// or `entries.len()` if none is kept.
    pub fn first_kept_index(&self, entries: &[DirEntryRecord]) -> usize {
        entries
            .iter()
            .position(|entry| self.keeps(entry))
            .unwrap_or(entries.len())
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.policies.iter().map(|policy| policy.describe()).collect()
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptions()).finish()
    }
}

/// Lower the cut so that at least `keep` of the newest entries survive.
///
/// The backstop can only shrink the removal set.
pub fn apply_backstop(candidate_cut: usize, total: usize, keep: usize) -> usize {
    candidate_cut.min(total.saturating_sub(keep))
}

/// Final cut index for entries already sorted oldest first.
pub fn cut_index(sorted: &[DirEntryRecord], policies: &PolicySet, keep: usize) -> usize {
    let candidate = policies.first_kept_index(sorted);
    let cut = apply_backstop(candidate, sorted.len(), keep);
    tracing::debug!(
        total = sorted.len(),
        policies = policies.len(),
        policy_cut = candidate,
        keep,
        cut,
        "Computed retention cut"
    );
    cut
}

/// The remove/keep split of an oldest-first entry sequence.
#[derive(Debug, Clone, Copy)]
pub struct Partition<'a> {
    entries: &'a [DirEntryRecord],
    cut: usize,
}

impl<'a> Partition<'a> {
    /// Split `entries` at `cut`, clamped to the sequence length.
    pub fn new(entries: &'a [DirEntryRecord], cut: usize) -> Self {
        Self {
            entries,
            cut: cut.min(entries.len()),
        }
    }

    /// Compute the cut for entries sorted oldest first and split them.
    pub fn decide(sorted: &'a [DirEntryRecord], policies: &PolicySet, keep: usize) -> Self {
        Self::new(sorted, cut_index(sorted, policies, keep))
    }

    pub fn cut_index(&self) -> usize {
        self.cut
    }

    /// Every entry, oldest first.
    pub fn entries(&self) -> &'a [DirEntryRecord] {
        self.entries
    }

    /// Older entries selected for removal.
    pub fn remove(&self) -> &'a [DirEntryRecord] {
        &self.entries[..self.cut]
    }

    /// Newer entries that are retained.
    pub fn keep(&self) -> &'a [DirEntryRecord] {
        &self.entries[self.cut..]
    }
}
