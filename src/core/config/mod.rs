//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! refpages has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: A `refpages.toml` next to the documentation sources
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REFPAGES_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/refpages/config.toml`
//! 3. `~/.refpages/config.toml`
//!
//! # Project Config Location
//!
//! An explicit `--config FILE`, otherwise the first `refpages.toml` found
//! walking up from the source directory. The walk stops after the first
//! directory that contains `.git`.
//!
//! # Example
//!
//! ```no_run
//! use refpages::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(None, Some(Path::new("docs/_build/html"))).unwrap();
//! println!("Branch: {}", config.branch());
//! println!("Git: {}", config.git_path().display());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project config file name.
pub const PROJECT_FILE_NAME: &str = "refpages.toml";

/// Default remote branch.
pub const DEFAULT_BRANCH: &str = "gh-pages";

/// Default git executable.
pub const DEFAULT_GIT: &str = "git";

/// Default manifest alias rules, alias name to ref pattern.
pub const DEFAULT_ALIASES: [(&str, &str); 2] = [
    ("latest", "refs/heads/main"),
    ("stable", r"refs/tags/v[0-9.]+"),
];

/// [`DEFAULT_ALIASES`] as an owned table.
pub fn default_aliases() -> BTreeMap<String, String> {
    DEFAULT_ALIASES
        .iter()
        .map(|(alias, pattern)| (alias.to_string(), pattern.to_string()))
        .collect()
}

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("invalid config value in '{path}': {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Project config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if found)
    pub project: Option<FileConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
    /// Global and project values layered
    merged: FileConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// `explicit` is a project file named on the command line; it must
    /// exist. Otherwise the project file is searched for upward from
    /// `search_start`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(explicit: Option<&Path>, search_start: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = Self::find_global();
        let project_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => search_start.and_then(Self::find_project),
        };

        Self::load_from(global_path.as_deref(), project_path.as_deref())
    }

    /// Load configuration from exactly the given files.
    ///
    /// # Errors
    ///
    /// Returns an error if a given file cannot be read, parsed or validated.
    pub fn load_from(global_path: Option<&Path>, project_path: Option<&Path>) -> Result<Self, ConfigError> {
        let global = match global_path {
            Some(path) => Self::read_config(path)?,
            None => FileConfig::default(),
        };
        let project = project_path.map(Self::read_config).transpose()?;

        let merged = match &project {
            Some(p) => global.merged(p),
            None => global.clone(),
        };

        Ok(Config {
            global,
            project,
            global_path: global_path.map(Path::to_path_buf),
            project_path: project_path.map(Path::to_path_buf),
            merged,
        })
    }

    /// Locate the global config file.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $REFPAGES_CONFIG
        if let Ok(path) = std::env::var("REFPAGES_CONFIG") {
            let path = PathBuf::from(path);
            if path.is_file() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/refpages/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("refpages/config.toml");
            if path.is_file() {
                return Some(path);
            }
        }

        // 3. Check ~/.refpages/config.toml
        let path = dirs::home_dir()?.join(".refpages/config.toml");
        path.is_file().then_some(path)
    }

    /// Locate the project config file, searching upward from `start`.
    pub fn find_project(start: &Path) -> Option<PathBuf> {
        let start = start.canonicalize().ok()?;
        for dir in start.ancestors() {
            let candidate = dir.join(PROJECT_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if dir.join(".git").exists() {
                break;
            }
        }
        None
    }

    /// Read, parse, and validate a config file.
    ///
    /// A relative `target` is resolved against the file's directory.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate().map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        if let (Some(target), Some(base)) = (config.target.as_ref(), path.parent()) {
            if target.is_relative() {
                config.target = Some(base.join(target));
            }
        }

        Ok(config)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Ref override, if configured.
    pub fn git_ref(&self) -> Option<&str> {
        self.merged.git_ref.as_deref()
    }

    /// SHA override, if configured.
    pub fn sha(&self) -> Option<&str> {
        self.merged.sha.as_deref()
    }

    /// Local target directory, if configured.
    pub fn target(&self) -> Option<&Path> {
        self.merged.target.as_deref()
    }

    /// Remote target repository, if configured.
    pub fn repo(&self) -> Option<&str> {
        self.merged.repo.as_deref()
    }

    /// Get the remote branch name.
    ///
    /// Defaults to "gh-pages" if not configured.
    pub fn branch(&self) -> &str {
        self.merged.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Check if pushes should force.
    ///
    /// Defaults to `false` if not configured.
    pub fn force(&self) -> bool {
        self.merged.force.unwrap_or(false)
    }

    /// Commit author name, if configured.
    pub fn name(&self) -> Option<&str> {
        self.merged.name.as_deref()
    }

    /// Commit author email, if configured.
    pub fn email(&self) -> Option<&str> {
        self.merged.email.as_deref()
    }

    /// Get the git executable.
    ///
    /// Defaults to "git" (looked up on `PATH`).
    pub fn git_path(&self) -> &Path {
        self.merged
            .git_path
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_GIT))
    }

    /// Check if verbose diagnostics are enabled.
    ///
    /// Defaults to `false` if not configured.
    pub fn verbose(&self) -> bool {
        self.merged.verbose.unwrap_or(false)
    }

    /// Check if the versions manifest is maintained.
    ///
    /// Defaults to `false` if not configured.
    pub fn manifest(&self) -> bool {
        self.merged.manifest.unwrap_or(false)
    }

    /// Get the manifest alias rules.
    ///
    /// Defaults to [`DEFAULT_ALIASES`] if not configured. An empty table
    /// disables aliases.
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.merged.aliases.clone().unwrap_or_else(default_aliases)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}
