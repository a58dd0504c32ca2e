//! engine::manifest
//!
//! The `versions.json` index kept at the root of a publish target.
//!
//! # Format
//!
//! ```json
//! {
//!   "versions": [
//!     {
//!       "name": "main",
//!       "ref": "refs/heads/main",
//!       "kind": "branch",
//!       "sha": "4f1c...",
//!       "published_at": "2024-05-01T12:00:00Z",
//!       "digest": "9b2e..."
//!     }
//!   ],
//!   "aliases": {
//!     "latest": "main",
//!     "stable": "v1.2.0"
//!   }
//! }
//! ```
//!
//! Entries are keyed by directory name and kept sorted by it. Publishing a
//! ref replaces its entry and leaves every other entry as it was, mirroring
//! what happens to the directories themselves.
//!
//! # Aliases
//!
//! Each alias rule pairs an alias name with a regular expression matched
//! against the start of an entry's raw ref. The alias points at the newest
//! matching entry, comparing the numbers embedded in directory names
//! (`v1.10` is newer than `v1.9`). Aliases are recomputed from scratch on
//! every publish; an alias whose rule matches nothing is dropped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{RefIdentity, RefKind, TreeDigest};

pub use crate::core::naming::MANIFEST_FILE_NAME;

/// Errors from manifest operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize manifest '{path}': {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid pattern for alias '{alias}': {source}")]
    AliasPattern {
        alias: String,
        source: regex::Error,
    },

    #[error("failed to write manifest '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to digest published tree '{path}': {source}")]
    Digest {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One published ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Directory name under the target root
    pub name: String,
    /// Raw ref it was resolved from
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Ref classification
    pub kind: RefKind,
    /// Source commit, when known
    pub sha: Option<String>,
    /// When the directory was last published
    pub published_at: DateTime<Utc>,
    /// Content hash of the published directory
    pub digest: String,
}

/// Maps an alias name to the newest entry whose ref matches a pattern.
#[derive(Debug, Clone)]
pub struct AliasRule {
    alias: String,
    pattern: Regex,
}

impl AliasRule {
    /// Compile a rule. `pattern` must match at the start of the raw ref.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::AliasPattern` if `pattern` is not a valid
    /// regular expression.
    ///
    /// # Example
    ///
    /// ```
    /// use refpages::engine::manifest::AliasRule;
    ///
    /// let rule = AliasRule::new("stable", r"refs/tags/v[0-9.]+").unwrap();
    /// assert!(rule.matches("refs/tags/v1.2"));
    /// assert!(!rule.matches("refs/heads/refs/tags/v1.2"));
    /// ```
    pub fn new(alias: &str, pattern: &str) -> Result<Self, ManifestError> {
        let pattern = Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
            ManifestError::AliasPattern {
                alias: alias.to_string(),
                source,
            }
        })?;
        Ok(Self {
            alias: alias.to_string(),
            pattern,
        })
    }

    /// Compile every `alias -> pattern` pair.
    pub fn compile(rules: &BTreeMap<String, String>) -> Result<Vec<Self>, ManifestError> {
        rules
            .iter()
            .map(|(alias, pattern)| Self::new(alias, pattern))
            .collect()
    }

    /// The alias name.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Whether a raw ref falls under this rule.
    pub fn matches(&self, git_ref: &str) -> bool {
        self.pattern.is_match(git_ref)
    }
}

/// Numbers embedded in a directory name, in order (`v1.10-rc2` is
/// `[1, 10, 2]`).
fn version_key(name: &str) -> Vec<u64> {
    name.split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap_or(u64::MAX))
        .collect()
}

/// The whole manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub versions: Vec<ManifestEntry>,
    /// Alias name to entry name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Manifest {
    /// Path of the manifest under `root`.
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE_NAME)
    }

    /// Load the manifest under `root`. A missing file is an empty manifest.
    pub fn load(root: &Path) -> Result<Self, ManifestError> {
        let path = Self::path(root);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ManifestError::Read { path, source }),
        };

        serde_json::from_str(&contents).map_err(|source| ManifestError::Parse { path, source })
    }

    /// Write the manifest under `root` as pretty JSON.
    pub fn save(&self, root: &Path) -> Result<(), ManifestError> {
        let path = Self::path(root);
        let mut contents = serde_json::to_string_pretty(self).map_err(|source| {
            ManifestError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        contents.push('\n');

        fs::write(&path, contents).map_err(|source| ManifestError::Write { path, source })
    }

    /// Insert or replace the entry for `entry.name`, keeping name order.
    pub fn upsert(&mut self, entry: ManifestEntry) {
        match self
            .versions
            .binary_search_by(|probe| probe.name.as_str().cmp(&entry.name))
        {
            Ok(idx) => self.versions[idx] = entry,
            Err(idx) => self.versions.insert(idx, entry),
        }
    }

    /// Look up an entry by directory name.
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.versions.iter().find(|e| e.name == name)
    }

    /// Recompute every alias from `rules`.
    pub fn update_aliases(&mut self, rules: &[AliasRule]) {
        self.aliases.clear();
        for rule in rules {
            let newest = self
                .versions
                .iter()
                .filter(|e| rule.matches(&e.git_ref))
                .max_by(|a, b| {
                    version_key(&a.name)
                        .cmp(&version_key(&b.name))
                        .then_with(|| a.name.cmp(&b.name))
                });
            if let Some(entry) = newest {
                self.aliases
                    .insert(rule.alias().to_string(), entry.name.clone());
            }
        }
    }
}

/// Record a freshly published ref in the manifest under `root`.
///
/// The digest is computed from what landed in `root / identity.name()`.
/// Aliases are recomputed from `aliases` (alias name to ref pattern).
pub fn record_publish(
    root: &Path,
    identity: &RefIdentity,
    sha: Option<&str>,
    aliases: &BTreeMap<String, String>,
) -> Result<ManifestEntry, ManifestError> {
    let rules = AliasRule::compile(aliases)?;
    let published = root.join(identity.name());
    let digest = TreeDigest::of_dir(&published).map_err(|source| ManifestError::Digest {
        path: published.clone(),
        source,
    })?;

    let entry = ManifestEntry {
        name: identity.name().to_string(),
        git_ref: identity.raw().to_string(),
        kind: identity.kind(),
        sha: sha.map(str::to_string),
        published_at: Utc::now(),
        digest: digest.as_str().to_string(),
    };

    let mut manifest = Manifest::load(root)?;
    manifest.upsert(entry.clone());
    manifest.update_aliases(&rules);
    manifest.save(root)?;

    Ok(entry)
}
