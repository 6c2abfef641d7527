//! End-to-end runs against real temporary directories.
//!
//! These drive the whole pipeline (config resolution, scan, decision,
//! dispatch) the same way the binary does, with a scripted prompt in place
//! of the terminal.
