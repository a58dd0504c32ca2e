//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-gated diagnostics on stderr
//!
//! # Design
//!
//! All output goes through this module so `--quiet` and `--verbose` are
//! honored consistently.

pub mod output;
