//! Structured logging to stderr.
//!
//! Format, level and filter come from `[observability.logging]`; `RUST_LOG`
//! overrides the configured filter when set.

mod tracing_init;

pub use tracing_init::*;
