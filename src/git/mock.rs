//! git::mock
//!
//! Mock git client for deterministic testing.
//!
//! # Design
//!
//! The mock provides a deterministic implementation of the [`GitClient`]
//! trait. It never spawns a process: `prepare_branch` only creates the
//! working tree (optionally seeded with files standing in for the existing
//! branch contents), commits are numbered, and every call is recorded so
//! tests can assert on the exact sequence the orchestrator issued.
//!
//! # Example
//!
//! ```
//! use refpages::git::mock::{MockGit, MockOperation};
//! use refpages::git::GitClient;
//! use std::path::Path;
//!
//! let git = MockGit::new().with_ref("refs/heads/main");
//! assert_eq!(git.current_ref(Path::new(".")).unwrap(), "refs/heads/main");
//! assert!(matches!(git.operations()[0], MockOperation::CurrentRef { .. }));
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::interface::{GitClient, GitError};
use crate::core::types::CommitIdentity;

/// Mock git client for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockGit {
    inner: Arc<Mutex<MockGitInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockGitInner {
    /// Ref reported by `current_ref` (`None` fails detection).
    current_ref: Option<String>,
    /// SHA reported by `current_sha`.
    current_sha: Option<String>,
    /// Files present on the target branch after `prepare_branch`.
    branch_files: Vec<(PathBuf, String)>,
    /// Whether `commit_all` finds staged changes.
    has_changes: bool,
    /// Number of commits made so far.
    commits: u64,
    /// Operation to fail on.
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Which operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    /// `prepare_branch` fails with `BranchPrepareFailed`.
    PrepareBranch,
    /// `commit_all` fails with `CommitFailed`.
    Commit,
    /// `push` fails with `NonFastForward` unless forced.
    NonFastForward,
    /// `push` fails with `PushFailed`.
    Push,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    CurrentRef {
        source: PathBuf,
    },
    CurrentSha {
        source: PathBuf,
    },
    PrepareBranch {
        repo_url: String,
        branch: String,
        work_tree: PathBuf,
        identity: CommitIdentity,
    },
    CommitAll {
        work_tree: PathBuf,
        message: String,
        amend: bool,
    },
    Push {
        repo_url: String,
        branch: String,
        force: bool,
    },
}

impl MockGit {
    /// Create a mock with no ref, no SHA, and changes to commit.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockGitInner {
                current_ref: None,
                current_sha: None,
                branch_files: Vec::new(),
                has_changes: true,
                commits: 0,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Report `raw` from `current_ref`.
    pub fn with_ref(self, raw: &str) -> Self {
        self.inner.lock().unwrap().current_ref = Some(raw.to_string());
        self
    }

    /// Report `sha` from `current_sha`.
    pub fn with_sha(self, sha: &str) -> Self {
        self.inner.lock().unwrap().current_sha = Some(sha.to_string());
        self
    }

    /// Seed the working tree with a file when the branch is prepared.
    pub fn with_branch_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .branch_files
            .push((path.into(), contents.to_string()));
        self
    }

    /// Make `commit_all` find nothing staged.
    pub fn without_changes(self) -> Self {
        self.inner.lock().unwrap().has_changes = false;
        self
    }

    /// Configure the mock to fail on a specific operation.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// The working tree handed to `prepare_branch`, if it was called.
    pub fn prepared_work_tree(&self) -> Option<PathBuf> {
        self.operations().into_iter().find_map(|op| match op {
            MockOperation::PrepareBranch { work_tree, .. } => Some(work_tree),
            _ => None,
        })
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }

    fn fails(&self, which: FailOn) -> bool {
        self.inner.lock().unwrap().fail_on == Some(which)
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitClient for MockGit {
    fn current_ref(&self, source: &Path) -> Result<String, GitError> {
        self.record(MockOperation::CurrentRef {
            source: source.to_path_buf(),
        });

        self.inner
            .lock()
            .unwrap()
            .current_ref
            .clone()
            .ok_or_else(|| GitError::RefDetectionFailed {
                path: source.to_path_buf(),
                details: "mock has no current ref".to_string(),
            })
    }

    fn current_sha(&self, source: &Path) -> Result<Option<String>, GitError> {
        self.record(MockOperation::CurrentSha {
            source: source.to_path_buf(),
        });
        Ok(self.inner.lock().unwrap().current_sha.clone())
    }

    fn prepare_branch(
        &self,
        repo_url: &str,
        branch: &str,
        work_tree: &Path,
        identity: &CommitIdentity,
    ) -> Result<(), GitError> {
        self.record(MockOperation::PrepareBranch {
            repo_url: repo_url.to_string(),
            branch: branch.to_string(),
            work_tree: work_tree.to_path_buf(),
            identity: identity.clone(),
        });

        let prepare = |details: String| GitError::BranchPrepareFailed {
            branch: branch.to_string(),
            details,
        };

        if self.fails(FailOn::PrepareBranch) {
            return Err(prepare("mock prepare failure".to_string()));
        }

        std::fs::create_dir_all(work_tree).map_err(|e| prepare(e.to_string()))?;
        let files = self.inner.lock().unwrap().branch_files.clone();
        for (path, contents) in files {
            let full = work_tree.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).map_err(|e| prepare(e.to_string()))?;
            }
            std::fs::write(&full, contents).map_err(|e| prepare(e.to_string()))?;
        }
        Ok(())
    }

    fn commit_all(
        &self,
        work_tree: &Path,
        message: &str,
        _identity: &CommitIdentity,
        amend: bool,
    ) -> Result<Option<String>, GitError> {
        self.record(MockOperation::CommitAll {
            work_tree: work_tree.to_path_buf(),
            message: message.to_string(),
            amend,
        });

        if self.fails(FailOn::Commit) {
            return Err(GitError::CommitFailed {
                path: work_tree.to_path_buf(),
                details: "mock commit failure".to_string(),
            });
        }

        let mut inner = self.inner.lock().unwrap();
        if !inner.has_changes {
            return Ok(None);
        }
        inner.commits += 1;
        Ok(Some(format!("{:040x}", inner.commits)))
    }

    fn push(
        &self,
        _work_tree: &Path,
        repo_url: &str,
        branch: &str,
        force: bool,
    ) -> Result<(), GitError> {
        self.record(MockOperation::Push {
            repo_url: repo_url.to_string(),
            branch: branch.to_string(),
            force,
        });

        if self.fails(FailOn::NonFastForward) && !force {
            return Err(GitError::NonFastForward {
                branch: branch.to_string(),
            });
        }
        if self.fails(FailOn::Push) {
            return Err(GitError::PushFailed {
                branch: branch.to_string(),
                details: "mock push failure".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let git = MockGit::new().with_ref("refs/tags/v1").with_sha("abc");
        let dir = tempfile::TempDir::new().unwrap();

        git.current_ref(dir.path()).unwrap();
        git.current_sha(dir.path()).unwrap();
        git.push(dir.path(), "url", "gh-pages", true).unwrap();

        let ops = git.operations();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], MockOperation::CurrentRef { .. }));
        assert!(matches!(ops[1], MockOperation::CurrentSha { .. }));
        assert_eq!(
            ops[2],
            MockOperation::Push {
                repo_url: "url".into(),
                branch: "gh-pages".into(),
                force: true
            }
        );
    }

    #[test]
    fn missing_ref_fails_detection() {
        let git = MockGit::new();
        let err = git.current_ref(Path::new(".")).unwrap_err();
        assert!(matches!(err, GitError::RefDetectionFailed { .. }));
    }

    #[test]
    fn prepare_seeds_branch_files() {
        let git = MockGit::new().with_branch_file("v1/index.html", "old");
        let dir = tempfile::TempDir::new().unwrap();
        let tree = dir.path().join("tree");

        git.prepare_branch("url", "gh-pages", &tree, &CommitIdentity::default())
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(tree.join("v1/index.html")).unwrap(),
            "old"
        );
        assert_eq!(git.prepared_work_tree(), Some(tree));
    }

    #[test]
    fn commits_are_numbered() {
        let git = MockGit::new();
        let id = CommitIdentity::default();
        let first = git.commit_all(Path::new("."), "m", &id, false).unwrap().unwrap();
        let second = git.commit_all(Path::new("."), "m", &id, true).unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(first.len(), 40);
        assert!(matches!(
            git.operations()[1],
            MockOperation::CommitAll { amend: true, .. }
        ));
    }

    #[test]
    fn non_fast_forward_only_without_force() {
        let git = MockGit::new().fail_on(FailOn::NonFastForward);
        assert!(matches!(
            git.push(Path::new("."), "url", "b", false),
            Err(GitError::NonFastForward { .. })
        ));
        assert!(git.push(Path::new("."), "url", "b", true).is_ok());
    }
}
