//! engine::tree
//!
//! Replace one ref's directory under a target root with a fresh copy of the
//! source tree.
//!
//! # Semantics
//!
//! - `destination = target / ref_name`, parents created as needed
//! - an existing destination (file, symlink or directory) is removed first:
//!   full replacement, never a merge
//! - the copy follows symlinks and preserves relative layout
//! - sibling directories of other refs are never touched
//!
//! The replacement is not atomic. A failed copy leaves the destination
//! partially written; the next successful publish of the same ref replaces
//! it wholesale.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Errors from tree publishing.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Filesystem failure at `path`.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination would be written inside the tree being copied.
    #[error("destination {destination} is inside source {source_dir}")]
    DestinationInsideSource {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    /// Replacing the destination would delete the source.
    #[error("source {source_dir} is inside destination {destination}")]
    SourceInsideDestination {
        source_dir: PathBuf,
        destination: PathBuf,
    },
}

impl TreeError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> TreeError + '_ {
        move |source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReport {
    /// `target / ref_name`
    pub destination: PathBuf,
    /// Whether something already existed at the destination
    pub replaced: bool,
    /// Number of regular files copied
    pub files: usize,
}

/// Replace `target/ref_name` with a copy of `source`.
///
/// `ref_name` must be a single path component; [`crate::core::types::RefIdentity`]
/// guarantees that.
///
/// # Errors
///
/// Returns [`TreeError`] on any I/O failure, or when source and destination
/// overlap.
pub fn publish_tree(source: &Path, target: &Path, ref_name: &str) -> Result<TreeReport, TreeError> {
    fs::create_dir_all(target).map_err(TreeError::io(target))?;
    let destination = target.join(ref_name);

    check_overlap(source, target, &destination)?;

    let replaced = remove_existing(&destination)?;
    let files = copy_tree(source, &destination)?;

    Ok(TreeReport {
        destination,
        replaced,
        files,
    })
}

/// Refuse layouts where the copy would feed on itself or delete its input.
fn check_overlap(source: &Path, target: &Path, destination: &Path) -> Result<(), TreeError> {
    let source_dir = source.canonicalize().map_err(TreeError::io(source))?;
    let resolved = target
        .canonicalize()
        .map_err(TreeError::io(target))?
        .join(destination.file_name().unwrap_or_default());

    if resolved.starts_with(&source_dir) {
        return Err(TreeError::DestinationInsideSource {
            source_dir,
            destination: resolved,
        });
    }
    if source_dir.starts_with(&resolved) {
        return Err(TreeError::SourceInsideDestination {
            source_dir,
            destination: resolved,
        });
    }
    Ok(())
}

/// Remove whatever exists at `path`. Returns whether anything was there.
fn remove_existing(path: &Path) -> Result<bool, TreeError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(TreeError::io(path)(e)),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(TreeError::io(path))?;
    } else {
        fs::remove_file(path).map_err(TreeError::io(path))?;
    }
    Ok(true)
}

/// Recursively copy `source` to `destination`, returning the file count.
fn copy_tree(source: &Path, destination: &Path) -> Result<usize, TreeError> {
    let mut files = 0;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            TreeError::Io {
                path,
                source: io::Error::from(e),
            }
        })?;

        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| TreeError::Io {
                path: entry.path().to_path_buf(),
                source: io::Error::other(e),
            })?;
        let out = destination.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&out).map_err(TreeError::io(&out))?;
        } else {
            fs::copy(entry.path(), &out).map_err(TreeError::io(entry.path()))?;
            files += 1;
        }
    }

    Ok(files)
}
