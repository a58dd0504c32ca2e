//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration where the command needs it
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output

mod completion;
mod config_cmd;
mod publish;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::list as config_list;
pub use publish::{publish, resolve_settings};

use crate::cli::args::{Command, ConfigAction};
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Publish(args) => publish::publish(ctx, &args),
        Command::Config { action } => match action {
            ConfigAction::List { config, source } => {
                config_cmd::list(ctx, config.as_deref(), source.as_deref())
            }
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
