//! cli
//!
//! Command-line interface layer for refpages.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Layer config files under CLI options
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and hands a fully
//! resolved [`crate::engine::PublishSettings`] to the [`crate::engine`].
//! Errors are wrapped with `anyhow` context and reported by `main.rs`.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use crate::ui::output::Verbosity;
use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context::new(Verbosity::from_flags(cli.quiet, cli.verbose));

    commands::dispatch(cli.command, &ctx)
}
