//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module spawns the
//! git executable. The orchestrator depends on the [`GitClient`] trait, so
//! it can run against [`mock::MockGit`] in tests.
//!
//! # Responsibilities
//!
//! - Ref and SHA detection for the source checkout
//! - Preparing the target branch in a working tree (fetch+checkout, or init)
//! - Committing with an explicit identity
//! - Force and fast-forward-only pushes
//!
//! # Invariants
//!
//! - Every nonzero exit is a typed failure unless documented as tolerated
//! - Commit identity is configured per repository, never globally
//! - A non-force push never silently becomes a forced one
//!
//! # Example
//!
//! ```ignore
//! use refpages::git::{Git, GitClient};
//! use refpages::core::types::CommitIdentity;
//! use std::path::Path;
//!
//! let git = Git::new("git");
//! let tree = Path::new("/tmp/pages");
//! git.prepare_branch("https://example.com/docs.git", "gh-pages", tree, &CommitIdentity::default())?;
//! if let Some(sha) = git.commit_all(tree, "Deploy main", &CommitIdentity::default(), false)? {
//!     git.push(tree, "https://example.com/docs.git", "gh-pages", false)?;
//! }
//! ```

mod interface;
pub mod mock;

pub use interface::{Git, GitClient, GitError, INITIAL_COMMIT_MESSAGE, REMOTE_NAME};
