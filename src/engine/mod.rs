//! engine
//!
//! Publishes a built directory under a ref-derived name.
//!
//! # Architecture
//!
//! ```text
//! resolve ref -> resolve sha -> prepare target -> replace tree -> commit -> push
//! ```
//!
//! - [`publish`] sequences a run against a [`crate::git::GitClient`]
//! - [`tree`] replaces `<target>/<name>/` with a copy of the source
//! - [`manifest`] maintains the optional `versions.json` index
//!
//! The engine never reads config files or parses arguments. It receives a
//! fully resolved [`PublishSettings`] from the CLI layer.

pub mod manifest;
pub mod publish;
pub mod tree;

pub use manifest::{
    record_publish, AliasRule, Manifest, ManifestEntry, ManifestError, MANIFEST_FILE_NAME,
};
pub use publish::{
    commit_message, PublishError, PublishReport, PublishSettings, PublishStage, PublishTarget,
    Publisher,
};
pub use tree::{publish_tree, TreeError, TreeReport};

use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// Output verbosity from `--quiet` / `--verbose`.
    pub verbosity: Verbosity,
}

impl Context {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}
