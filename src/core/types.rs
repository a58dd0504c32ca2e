//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RefKind`] - Classification of a git ref (tag, branch, unknown)
//! - [`RefIdentity`] - A ref mapped to a single safe path component
//! - [`CommitIdentity`] - Author name/email used for publish commits
//! - [`TreeDigest`] - Content hash of a published directory tree
//!
//! # Validation
//!
//! These types enforce validity at construction time. A [`RefIdentity`]
//! whose name could escape its parent directory cannot be represented.
//!
//! # Examples
//!
//! ```
//! use refpages::core::types::{RefIdentity, RefKind};
//!
//! let id = RefIdentity::new("v1.0", RefKind::Tag, "refs/tags/v1.0").unwrap();
//! assert_eq!(id.name(), "v1.0");
//!
//! // Names that are not a single path component fail at creation time
//! assert!(RefIdentity::new("..", RefKind::Unknown, "..").is_err());
//! assert!(RefIdentity::new("", RefKind::Tag, "refs/tags/").is_err());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::naming::RESERVED_NAMES;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid ref '{raw}': {reason}")]
    InvalidRef { raw: String, reason: String },
}

/// What kind of ref a raw ref string named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// `refs/tags/...`
    Tag,
    /// `refs/heads/...`
    Branch,
    /// Anything without a recognized prefix.
    Unknown,
}

impl RefKind {
    /// Get a human-readable description of the kind.
    ///
    /// # Example
    ///
    /// ```
    /// use refpages::core::types::RefKind;
    ///
    /// assert_eq!(RefKind::Tag.description(), "tag");
    /// assert_eq!(RefKind::Unknown.description(), "unknown");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            RefKind::Tag => "tag",
            RefKind::Branch => "branch",
            RefKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A ref resolved to the directory name it publishes under.
///
/// The name is always non-empty, never `.` or `..`, and never contains a
/// path separator, so `target.join(identity.name())` stays a direct child
/// of `target`. It never names the target's `.git` directory or its
/// manifest either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RefIdentity {
    name: String,
    kind: RefKind,
    raw: String,
}

impl RefIdentity {
    /// Create a validated identity.
    ///
    /// `raw` is the ref string the name was derived from and is kept only
    /// for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRef` if `name` is not a single safe path
    /// component.
    pub fn new(
        name: impl Into<String>,
        kind: RefKind,
        raw: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let raw = raw.into();
        if let Err(reason) = Self::validate(&name) {
            return Err(TypeError::InvalidRef { raw, reason });
        }
        Ok(Self { name, kind, raw })
    }

    /// Resolve a raw ref string. See [`crate::core::naming::resolve_ref`].
    pub fn resolve(raw: &str) -> Result<Self, TypeError> {
        crate::core::naming::resolve_ref(raw)
    }

    fn validate(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("resolves to an empty name".into());
        }
        if name == "." || name == ".." {
            return Err(format!("resolves to reserved path segment '{name}'"));
        }
        if name.contains(['/', '\\']) {
            return Err("name contains a path separator".into());
        }
        if name.contains('\0') {
            return Err("name contains a NUL byte".into());
        }
        if let Some(reserved) = RESERVED_NAMES
            .iter()
            .find(|r| name.eq_ignore_ascii_case(r))
        {
            return Err(format!("'{name}' collides with the reserved name '{reserved}'"));
        }
        Ok(())
    }

    /// The directory name for this ref.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ref classification.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// The raw ref string this identity was resolved from.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for RefIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Author identity attached to publish commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    /// Author and committer name
    pub name: String,
    /// Author and committer email
    pub email: String,
}

impl CommitIdentity {
    /// Default commit author name.
    pub const DEFAULT_NAME: &'static str = "refpages";

    /// Default commit author email.
    pub const DEFAULT_EMAIL: &'static str = "refpages@users.noreply.github.com";

    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Self::DEFAULT_EMAIL)
    }
}

/// Content hash of a directory tree.
///
/// Computed over every regular file's path (relative, `/`-separated) and
/// bytes, in sorted path order, so two trees with identical contents hash
/// identically regardless of where they live or the order they were written.
///
/// # Example
///
/// ```
/// use refpages::core::types::TreeDigest;
///
/// let a = TreeDigest::compute(&[("index.html".to_string(), b"<html/>".to_vec())]);
/// let b = TreeDigest::compute(&[("index.html".to_string(), b"<html/>".to_vec())]);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeDigest(String);

impl TreeDigest {
    /// Compute a digest from (relative path, contents) pairs.
    pub fn compute(files: &[(String, Vec<u8>)]) -> Self {
        let mut sorted: Vec<_> = files.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (path, contents) in sorted {
            hasher.update(path.as_bytes());
            hasher.update(b"\0");
            hasher.update((contents.len() as u64).to_be_bytes());
            hasher.update(contents);
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Compute the digest of every regular file below `root`.
    pub fn of_dir(root: &Path) -> std::io::Result<Self> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(std::io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(std::io::Error::other)?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((rel, std::fs::read(entry.path())?));
        }
        Ok(Self::compute(&files))
    }

    /// Get the digest as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TreeDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
