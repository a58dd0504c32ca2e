//! core::config::schema
//!
//! Configuration schema types.
//!
//! # File Format
//!
//! Global and project files share one schema. Keys are kebab-case and
//! mirror the `publish` command's long options:
//!
//! ```toml
//! repo = "git@github.com:org/project.git"
//! branch = "gh-pages"
//! force = false
//! name = "docs-bot"
//! email = "docs-bot@example.com"
//! git-path = "/usr/bin/git"
//! manifest = true
//!
//! # Manifest aliases: alias name = ref pattern (replaces the defaults)
//! [aliases]
//! latest = "refs/heads/main"
//! stable = "refs/tags/v[0-9.]+"
//! ```
//!
//! # Validation
//!
//! Unknown keys are rejected, and values are validated after parsing
//! (e.g., `repo` and `target` cannot both be set in one file).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings file contents (global or project scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    /// Override the detected git ref
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,

    /// Override the detected git SHA
    pub sha: Option<String>,

    /// Local target directory
    pub target: Option<PathBuf>,

    /// Remote target repository
    pub repo: Option<String>,

    /// Remote branch name
    pub branch: Option<String>,

    /// Force push instead of preserving history
    pub force: Option<bool>,

    /// Commit author name
    pub name: Option<String>,

    /// Commit author email
    pub email: Option<String>,

    /// Path to the git executable
    pub git_path: Option<PathBuf>,

    /// Diagnostic output on stderr
    pub verbose: Option<bool>,

    /// Maintain a versions.json index at the target root
    pub manifest: Option<bool>,

    /// Manifest alias rules (alias name to ref pattern)
    pub aliases: Option<BTreeMap<String, String>>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repo.is_some() && self.target.is_some() {
            return Err(ConfigError::InvalidValue(
                "only one of 'repo' and 'target' can be set".to_string(),
            ));
        }

        for (key, value) in [
            ("repo", self.repo.as_deref()),
            ("branch", self.branch.as_deref()),
            ("name", self.name.as_deref()),
            ("email", self.email.as_deref()),
        ] {
            if value.is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{key} cannot be empty")));
            }
        }

        for (alias, pattern) in self.aliases.iter().flatten() {
            if alias.trim().is_empty() {
                return Err(ConfigError::InvalidValue("alias names cannot be empty".to_string()));
            }
            regex::Regex::new(pattern).map_err(|e| {
                ConfigError::InvalidValue(format!("pattern for alias '{alias}' is invalid: {e}"))
            })?;
        }

        Ok(())
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merged(&self, other: &FileConfig) -> FileConfig {
        FileConfig {
            git_ref: other.git_ref.clone().or_else(|| self.git_ref.clone()),
            sha: other.sha.clone().or_else(|| self.sha.clone()),
            // A destination selector in the higher-precedence file replaces
            // both selectors from the lower one.
            target: if other.repo.is_some() || other.target.is_some() {
                other.target.clone()
            } else {
                self.target.clone()
            },
            repo: if other.repo.is_some() || other.target.is_some() {
                other.repo.clone()
            } else {
                self.repo.clone()
            },
            branch: other.branch.clone().or_else(|| self.branch.clone()),
            force: other.force.or(self.force),
            name: other.name.clone().or_else(|| self.name.clone()),
            email: other.email.clone().or_else(|| self.email.clone()),
            git_path: other.git_path.clone().or_else(|| self.git_path.clone()),
            verbose: other.verbose.or(self.verbose),
            manifest: other.manifest.or(self.manifest),
            // The alias table is replaced whole, never merged key by key.
            aliases: other.aliases.clone().or_else(|| self.aliases.clone()),
        }
    }
}
