//! runlab: browse, compare and launch Experimentation Lab runs.
//!
//! This crate re-exports [`runlab_core`] so applications depend on a single
//! name; the `lab` binary lives in `runlab-cli`.

pub use runlab_core::*;
