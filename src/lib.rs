//! refpages - Publish built documentation under a directory named for its git ref
//!
//! Given a directory of built files, refpages works out which git ref it was
//! built from, turns the ref into a directory name, and publishes the files
//! to `<target>/<name>/`. The target is a local directory or a branch of a
//! git repository (`gh-pages` by default), updated with a commit and a push.
//! Every ref gets its own directory, so one site can host the docs of many
//! branches and releases side by side.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, layers config, delegates to engine)
//! - [`engine`] - Publish orchestration, tree replacement, versions manifest
//! - [`core`] - Domain types, ref naming, configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Verbosity-gated output
//!
//! # Correctness Invariants
//!
//! 1. Publishing one ref never modifies another ref's directory
//! 2. A republished ref's directory is fully replaced, never merged
//! 3. History-preserving publishes never rewrite the target branch
//! 4. The temporary working tree of a remote publish never outlives the run

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
