//! Prune the oldest entries of a directory while keeping the newest ones.
//!
//! The [`retention`] module holds the engine: scanning, ordering, keep
//! policies, the minimum-keep backstop and the action dispatcher. The
//! [`config`] module turns a TOML file plus command-line flags into a
//! validated [`retention::PruneRequest`].

pub mod config;
#[cfg(feature = "cli")]
pub mod observability;
pub mod retention;

#[cfg(test)]
mod tests;
