//! git::interface
//!
//! Git interface implementation backed by the git executable.
//!
//! This module provides the **single doorway** to all Git operations in
//! refpages. Every interaction flows through the [`GitClient`] trait, which
//! provides structured results and normalizes failures into typed categories.
//!
//! # Architecture
//!
//! [`Git`] shells out to a configurable git executable. Each method runs
//! one or more git commands with captured output, and every nonzero exit is
//! a failure unless the method documents it as tolerated.
//!
//! All commands run with `LC_ALL=C` (stable output to parse) and
//! `GIT_TERMINAL_PROMPT=0` (never block on a credential prompt).
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::Spawn`]: The git executable could not be started
//! - [`GitError::RefDetectionFailed`]: HEAD has no usable ref name
//! - [`GitError::BranchPrepareFailed`]: Clone/init/checkout failed
//! - [`GitError::CommitFailed`]: Staging or committing failed
//! - [`GitError::NonFastForward`]: A history-preserving push was rejected
//! - [`GitError::PushFailed`]: Any other push failure
//!
//! # Example
//!
//! ```ignore
//! use refpages::git::{Git, GitClient};
//! use std::path::Path;
//!
//! let git = Git::new("git");
//! let raw = git.current_ref(Path::new("."))?;
//! println!("building {}", raw);
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::core::types::CommitIdentity;
use crate::ui::output::{self, Verbosity};

/// Name of the remote configured in publish working trees.
pub const REMOTE_NAME: &str = "upstream";

/// Message of the root commit created for a new branch.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial empty commit";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git executable could not be started.
    #[error("failed to run git executable '{program}': {source}")]
    Spawn {
        /// The configured git executable
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No ref could be inferred for HEAD.
    #[error("could not infer the git ref in {path}: {details}")]
    RefDetectionFailed {
        /// The directory that was inspected
        path: PathBuf,
        /// What git reported
        details: String,
    },

    /// Preparing the target branch failed.
    #[error("failed to prepare branch '{branch}': {details}")]
    BranchPrepareFailed {
        /// The target branch
        branch: String,
        /// What git reported
        details: String,
    },

    /// Staging or committing failed.
    #[error("failed to commit in {path}: {details}")]
    CommitFailed {
        /// The working tree
        path: PathBuf,
        /// What git reported
        details: String,
    },

    /// The remote rejected a non-force push because it has diverged.
    #[error("push to '{branch}' rejected: remote has diverged (non-fast-forward)")]
    NonFastForward {
        /// The target branch
        branch: String,
    },

    /// Any other push failure.
    #[error("failed to push to '{branch}': {details}")]
    PushFailed {
        /// The target branch
        branch: String,
        /// What git reported
        details: String,
    },
}

/// The git operations the publisher needs.
///
/// [`Git`] is the real implementation; [`crate::git::mock::MockGit`] is an
/// in-memory fake for exercising the orchestrator without an executable.
pub trait GitClient {
    /// Full ref name (`refs/heads/...` or `refs/tags/...`) checked out in
    /// `source`.
    fn current_ref(&self, source: &Path) -> Result<String, GitError>;

    /// HEAD commit of `source`, or `None` when there is no commit yet.
    fn current_sha(&self, source: &Path) -> Result<Option<String>, GitError>;

    /// Leave `work_tree` checked out on `branch` as it exists at `repo_url`,
    /// or on a new branch holding a single empty root commit when the
    /// remote does not have it. Idempotent.
    fn prepare_branch(
        &self,
        repo_url: &str,
        branch: &str,
        work_tree: &Path,
        identity: &CommitIdentity,
    ) -> Result<(), GitError>;

    /// Stage everything and commit. `None` when nothing was staged.
    ///
    /// With `amend` the staged tree replaces the tip commit instead of
    /// going on top of it, so the previous tip drops out of the history.
    fn commit_all(
        &self,
        work_tree: &Path,
        message: &str,
        identity: &CommitIdentity,
        amend: bool,
    ) -> Result<Option<String>, GitError>;

    /// Push HEAD to `branch` at `repo_url`. Without `force` the update must
    /// be a fast-forward.
    fn push(&self, work_tree: &Path, repo_url: &str, branch: &str, force: bool)
        -> Result<(), GitError>;
}

/// Captured result of one git invocation.
#[derive(Debug, Clone)]
struct GitOutput {
    /// Exit code (`None` if killed by a signal)
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best description of a failure: stderr, else stdout, else the code.
    fn details(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// The git executable.
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
    verbosity: Verbosity,
}

impl Git {
    /// Create a client for the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Echo every command and its output on stderr at `Verbose`.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    // =========================================================================
    // Process plumbing
    // =========================================================================

    /// Run git in `cwd`. Only a failure to start is an error here.
    fn run<S: AsRef<str>>(&self, cwd: &Path, args: &[S]) -> Result<GitOutput, GitError> {
        self.run_with_env(cwd, args, &[])
    }

    fn run_with_env<S: AsRef<str>>(
        &self,
        cwd: &Path,
        args: &[S],
        env: &[(&str, &str)],
    ) -> Result<GitOutput, GitError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(cwd)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(env.iter().copied())
            .output()
            .map_err(|source| GitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let result = GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if self.verbosity == Verbosity::Verbose {
            let mut msg = format!("git {} (in {})", args.join(" "), cwd.display());
            for line in result.stdout.lines().chain(result.stderr.lines()) {
                msg.push_str("\n  > ");
                msg.push_str(line);
            }
            output::debug(msg, self.verbosity);
        }

        Ok(result)
    }

    /// Run git and require a zero exit, mapping failures with `fail`.
    fn run_ok<S: AsRef<str>>(
        &self,
        cwd: &Path,
        args: &[S],
        fail: impl FnOnce(String) -> GitError,
    ) -> Result<GitOutput, GitError> {
        let out = self.run(cwd, args)?;
        if out.success() {
            Ok(out)
        } else {
            let cmd = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
            Err(fail(format!("git {} failed: {}", cmd, out.details())))
        }
    }

    /// Per-invocation settings that make commits independent of the
    /// caller's git configuration and environment.
    fn identity_args(identity: &CommitIdentity) -> Vec<String> {
        vec![
            "-c".to_string(),
            format!("user.name={}", identity.name),
            "-c".to_string(),
            format!("user.email={}", identity.email),
            "-c".to_string(),
            "commit.gpgsign=false".to_string(),
        ]
    }

    fn identity_env(identity: &CommitIdentity) -> [(&str, &str); 4] {
        [
            ("GIT_AUTHOR_NAME", identity.name.as_str()),
            ("GIT_AUTHOR_EMAIL", identity.email.as_str()),
            ("GIT_COMMITTER_NAME", identity.name.as_str()),
            ("GIT_COMMITTER_EMAIL", identity.email.as_str()),
        ]
    }

    fn commit_with_identity(
        &self,
        work_tree: &Path,
        identity: &CommitIdentity,
        extra: &[&str],
        fail: impl FnOnce(String) -> GitError,
    ) -> Result<(), GitError> {
        let mut args = Self::identity_args(identity);
        args.push("commit".to_string());
        args.push("-q".to_string());
        args.extend(extra.iter().map(|s| s.to_string()));

        let out = self.run_with_env(work_tree, &args, &Self::identity_env(identity))?;
        if out.success() {
            Ok(())
        } else {
            Err(fail(format!("git commit failed: {}", out.details())))
        }
    }

    // =========================================================================
    // Branch preparation steps
    // =========================================================================

    /// Point `upstream` at `repo_url`, adding the remote if needed.
    fn ensure_remote(&self, work_tree: &Path, repo_url: &str, branch: &str) -> Result<(), GitError> {
        let prepare = |details| GitError::BranchPrepareFailed {
            branch: branch.to_string(),
            details,
        };

        let current = self.run(work_tree, &["remote", "get-url", REMOTE_NAME])?;
        if !current.success() {
            self.run_ok(work_tree, &["remote", "add", REMOTE_NAME, repo_url], prepare)?;
        } else if current.stdout.trim() != repo_url {
            self.run_ok(work_tree, &["remote", "set-url", REMOTE_NAME, repo_url], prepare)?;
        }
        Ok(())
    }

    /// Whether `branch` exists on the remote.
    fn remote_has_branch(&self, work_tree: &Path, branch: &str) -> Result<bool, GitError> {
        let refname = format!("refs/heads/{branch}");
        let out = self.run(
            work_tree,
            &["ls-remote", "--exit-code", "--heads", REMOTE_NAME, refname.as_str()],
        )?;

        match out.code {
            Some(0) => Ok(true),
            // ls-remote --exit-code: no matching refs
            Some(2) => Ok(false),
            _ => Err(GitError::BranchPrepareFailed {
                branch: branch.to_string(),
                details: format!("git ls-remote failed: {}", out.details()),
            }),
        }
    }

    /// Check out the remote branch, discarding any local state.
    fn checkout_remote_branch(&self, work_tree: &Path, branch: &str) -> Result<(), GitError> {
        let prepare = |details| GitError::BranchPrepareFailed {
            branch: branch.to_string(),
            details,
        };
        let tracking = format!("refs/remotes/{REMOTE_NAME}/{branch}");
        let refspec = format!("+refs/heads/{branch}:{tracking}");

        self.run_ok(
            work_tree,
            &["fetch", "-q", "--no-tags", REMOTE_NAME, refspec.as_str()],
            prepare,
        )?;
        self.run_ok(
            work_tree,
            &["checkout", "-q", "-f", "-B", branch, tracking.as_str()],
            prepare,
        )?;
        self.run_ok(work_tree, &["clean", "-ffdqx"], prepare)?;
        Ok(())
    }

    /// Start `branch` from scratch with an empty root commit.
    fn init_orphan_branch(
        &self,
        work_tree: &Path,
        branch: &str,
        identity: &CommitIdentity,
    ) -> Result<(), GitError> {
        let prepare = |details| GitError::BranchPrepareFailed {
            branch: branch.to_string(),
            details,
        };
        let refname = format!("refs/heads/{branch}");

        // A local branch left over from an earlier run that never reached
        // the remote is discarded.
        let local = self.run(work_tree, &["rev-parse", "--verify", "-q", refname.as_str()])?;
        if local.success() {
            self.run_ok(work_tree, &["symbolic-ref", "HEAD", "refs/heads/__refpages_tmp"], prepare)?;
            self.run_ok(work_tree, &["update-ref", "-d", refname.as_str()], prepare)?;
        }

        self.run_ok(work_tree, &["symbolic-ref", "HEAD", refname.as_str()], prepare)?;
        self.run_ok(work_tree, &["read-tree", "--empty"], prepare)?;
        self.run_ok(work_tree, &["clean", "-ffdqx"], prepare)?;
        self.commit_with_identity(
            work_tree,
            identity,
            &["--allow-empty", "-m", INITIAL_COMMIT_MESSAGE],
            prepare,
        )
    }
}

impl GitClient for Git {
    fn current_ref(&self, source: &Path) -> Result<String, GitError> {
        let symbolic = self.run(source, &["symbolic-ref", "-q", "HEAD"])?;
        if symbolic.success() {
            let name = symbolic.stdout.trim();
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }

        // Detached HEAD: accept a tag pointing exactly at it
        let tag = self.run(source, &["describe", "--tags", "--exact-match", "HEAD"])?;
        let name = tag.stdout.trim();
        if tag.success() && !name.is_empty() {
            return Ok(format!("refs/tags/{name}"));
        }

        Err(GitError::RefDetectionFailed {
            path: source.to_path_buf(),
            details: format!(
                "HEAD is neither a branch nor exactly at a tag ({})",
                symbolic.details()
            ),
        })
    }

    fn current_sha(&self, source: &Path) -> Result<Option<String>, GitError> {
        let out = self.run(source, &["rev-parse", "--verify", "-q", "HEAD"])?;
        let sha = out.stdout.trim();
        if out.success() && !sha.is_empty() {
            Ok(Some(sha.to_string()))
        } else {
            Ok(None)
        }
    }

    fn prepare_branch(
        &self,
        repo_url: &str,
        branch: &str,
        work_tree: &Path,
        identity: &CommitIdentity,
    ) -> Result<(), GitError> {
        let prepare = |details| GitError::BranchPrepareFailed {
            branch: branch.to_string(),
            details,
        };

        std::fs::create_dir_all(work_tree)
            .map_err(|e| prepare(format!("cannot create {}: {e}", work_tree.display())))?;

        if !work_tree.join(".git").exists() {
            self.run_ok(work_tree, &["init", "-q"], prepare)?;
        }

        // Local, not global: commits made here are attributable without
        // touching the caller's configuration.
        self.run_ok(work_tree, &["config", "user.name", identity.name.as_str()], prepare)?;
        self.run_ok(work_tree, &["config", "user.email", identity.email.as_str()], prepare)?;
        self.run_ok(work_tree, &["config", "commit.gpgsign", "false"], prepare)?;

        self.ensure_remote(work_tree, repo_url, branch)?;

        if self.remote_has_branch(work_tree, branch)? {
            output::debug(format!("checking out existing branch '{branch}'"), self.verbosity);
            self.checkout_remote_branch(work_tree, branch)
        } else {
            output::debug(
                format!("branch '{branch}' not found on remote; creating it fresh"),
                self.verbosity,
            );
            self.init_orphan_branch(work_tree, branch, identity)
        }
    }

    fn commit_all(
        &self,
        work_tree: &Path,
        message: &str,
        identity: &CommitIdentity,
        amend: bool,
    ) -> Result<Option<String>, GitError> {
        let commit = |details| GitError::CommitFailed {
            path: work_tree.to_path_buf(),
            details,
        };

        self.run_ok(work_tree, &["add", "-A", "."], commit)?;

        let staged = self.run(work_tree, &["diff", "--cached", "--quiet"])?;
        match staged.code {
            Some(0) => return Ok(None),
            Some(1) => {}
            _ => {
                return Err(commit(format!(
                    "git diff --cached failed: {}",
                    staged.details()
                )))
            }
        }

        let mut extra = Vec::new();
        if amend {
            // --reset-author: the replacement carries this run's identity
            // and timestamp, not those of the commit it replaces.
            extra.extend(["--amend", "--reset-author", "--date=now"]);
        }
        extra.extend(["-m", message]);
        self.commit_with_identity(work_tree, identity, &extra, commit)?;

        let head = self.run_ok(work_tree, &["rev-parse", "HEAD"], commit)?;
        Ok(Some(head.stdout.trim().to_string()))
    }

    fn push(
        &self,
        work_tree: &Path,
        repo_url: &str,
        branch: &str,
        force: bool,
    ) -> Result<(), GitError> {
        let dst = format!("HEAD:refs/heads/{branch}");
        let mut args = vec!["push", "--porcelain"];
        if force {
            args.push("--force");
        }
        args.push(repo_url);
        args.push(dst.as_str());

        let out = self.run(work_tree, &args)?;
        if out.success() {
            return Ok(());
        }

        if !force && is_non_fast_forward(&out) {
            return Err(GitError::NonFastForward {
                branch: branch.to_string(),
            });
        }

        Err(GitError::PushFailed {
            branch: branch.to_string(),
            details: out.details(),
        })
    }
}

/// Whether a failed push was rejected for not being a fast-forward.
///
/// Porcelain output marks rejected refs with a leading `!` and a reason in
/// parentheses.
fn is_non_fast_forward(out: &GitOutput) -> bool {
    const REASONS: [&str; 3] = ["non-fast-forward", "fetch first", "stale info"];

    let porcelain = out
        .stdout
        .lines()
        .filter(|line| line.starts_with('!'))
        .any(|line| REASONS.iter().any(|r| line.contains(r)));

    porcelain || REASONS.iter().any(|r| out.stderr.contains(r))
}
