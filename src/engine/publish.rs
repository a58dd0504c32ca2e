//! engine::publish
//!
//! The publish orchestrator.
//!
//! # Lifecycle
//!
//! ```text
//! Init -> RefResolved -> ShaResolved -> TargetPrepared -> TreePublished
//!      -> Committed (remote) -> Pushed (remote) -> Done
//! ```
//!
//! A failure in any stage aborts the rest. The publisher remembers the last
//! stage it reached, so callers can tell how far a failed run got.
//!
//! # Invariants
//!
//! - Target validation happens before any filesystem or git operation
//! - The remote working tree is a `TempDir` released on every exit path
//! - A history-preserving run never pushes with `--force`
//! - A forced run amends the branch tip, so the previous deploy (or the
//!   empty root commit of a new branch) leaves the history
//! - Reaching `Done` is the only success signal
//!
//! # Example
//!
//! ```ignore
//! use refpages::engine::{PublishSettings, Publisher};
//! use refpages::git::Git;
//! use refpages::ui::output::Verbosity;
//!
//! let git = Git::new("git");
//! let mut settings = PublishSettings::new("docs/_build/html");
//! settings.repo = Some("git@github.com:org/project.git".into());
//!
//! let report = Publisher::new(&git, Verbosity::Normal).run(&settings)?;
//! println!("published {}", report.identity);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::manifest::{self, ManifestError};
use super::tree::{publish_tree, TreeError};
use crate::core::config::{default_aliases, DEFAULT_BRANCH};
use crate::core::naming::resolve_ref;
use crate::core::types::{CommitIdentity, RefIdentity, RefKind, TypeError};
use crate::git::{GitClient, GitError};
use crate::ui::output::{self, Verbosity};

/// Errors from a publish run.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Invalid or conflicting options.
    #[error("configuration error: {0}")]
    Config(String),

    /// No ref was given and none could be inferred.
    #[error("no git ref given and none could be inferred")]
    MissingRef,

    /// The ref does not map to a usable directory name.
    #[error("the provided or inferred git ref is invalid")]
    InvalidRef(#[from] TypeError),

    /// Ref detection in the source checkout failed.
    #[error("could not detect the git ref; pass --ref or run inside a git checkout")]
    RefDetectionFailed(#[source] GitError),

    /// The git executable is missing or not runnable.
    #[error("git is unavailable")]
    GitUnavailable(#[source] GitError),

    /// Copying the source tree failed.
    #[error("failed to publish '{name}'")]
    CopyFailed {
        name: String,
        #[source]
        source: TreeError,
    },

    /// Cloning, initializing or checking out the target branch failed.
    #[error("failed to prepare branch '{branch}' of {repo}")]
    BranchPrepareFailed {
        repo: String,
        branch: String,
        #[source]
        source: GitError,
    },

    /// Committing the published tree failed.
    #[error("failed to commit published content")]
    CommitFailed(#[source] GitError),

    /// The remote branch diverged and the push was not forced.
    #[error("branch '{branch}' of {repo} has diverged; rerun with --force to overwrite its history")]
    NonFastForward {
        repo: String,
        branch: String,
        #[source]
        source: GitError,
    },

    /// Any other push failure.
    #[error("failed to push branch '{branch}' to {repo}")]
    PushFailed {
        repo: String,
        branch: String,
        #[source]
        source: GitError,
    },

    /// Reading or writing versions.json failed.
    #[error("failed to update the versions manifest")]
    ManifestFailed(#[from] ManifestError),

    /// The ephemeral working tree could not be created.
    #[error("failed to create a temporary working tree")]
    WorkTree(#[source] std::io::Error),
}

impl PublishError {
    /// Map a git failure in the context of a remote target.
    fn from_git(err: GitError, repo: &str, branch: &str) -> Self {
        let (repo, branch) = (repo.to_string(), branch.to_string());
        match err {
            GitError::Spawn { .. } => PublishError::GitUnavailable(err),
            GitError::RefDetectionFailed { .. } => PublishError::RefDetectionFailed(err),
            GitError::BranchPrepareFailed { .. } => PublishError::BranchPrepareFailed {
                repo,
                branch,
                source: err,
            },
            GitError::CommitFailed { .. } => PublishError::CommitFailed(err),
            GitError::NonFastForward { .. } => PublishError::NonFastForward {
                repo,
                branch,
                source: err,
            },
            GitError::PushFailed { .. } => PublishError::PushFailed {
                repo,
                branch,
                source: err,
            },
        }
    }

    /// Map a git failure while inspecting the source checkout.
    fn from_source_git(err: GitError) -> Self {
        match err {
            GitError::Spawn { .. } => PublishError::GitUnavailable(err),
            _ => PublishError::RefDetectionFailed(err),
        }
    }
}

/// Fully resolved publish options.
///
/// Defaults live here rather than in globals; the CLI layer fills the
/// fields from config files and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Directory whose contents are published
    pub source: PathBuf,
    /// Ref override; detected from `source` when `None`
    pub git_ref: Option<String>,
    /// SHA override; detected from `source` when `None`
    pub sha: Option<String>,
    /// Remote target repository
    pub repo: Option<String>,
    /// Local target directory
    pub target: Option<PathBuf>,
    /// Remote branch
    pub branch: String,
    /// Replace the branch tip and force push instead of preserving history
    pub force: bool,
    /// Commit author
    pub identity: CommitIdentity,
    /// Maintain versions.json at the target root
    pub manifest: bool,
    /// Manifest alias rules, alias name to ref pattern
    pub aliases: BTreeMap<String, String>,
}

impl PublishSettings {
    /// Settings for `source` with every option at its default.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            git_ref: None,
            sha: None,
            repo: None,
            target: None,
            branch: DEFAULT_BRANCH.to_string(),
            force: false,
            identity: CommitIdentity::default(),
            manifest: false,
            aliases: default_aliases(),
        }
    }
}

/// Where a run publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishTarget {
    /// A branch of a git repository
    Remote {
        repo_url: String,
        branch: String,
        force: bool,
    },
    /// A plain directory
    Local { directory: PathBuf },
}

impl PublishTarget {
    /// Select the target, enforcing that exactly one was given.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Config` when both or neither of `repo` and
    /// `target` are set, or when the branch name is empty.
    pub fn from_settings(settings: &PublishSettings) -> Result<Self, PublishError> {
        let repo = settings.repo.as_deref().filter(|r| !r.trim().is_empty());
        match (repo, &settings.target) {
            (Some(_), Some(_)) => Err(PublishError::Config(
                "only one of 'repo' and 'target' can be specified".to_string(),
            )),
            (None, None) => Err(PublishError::Config(
                "either 'repo' or 'target' must be specified".to_string(),
            )),
            (Some(repo), None) => {
                if settings.branch.trim().is_empty() {
                    return Err(PublishError::Config("branch cannot be empty".to_string()));
                }
                Ok(PublishTarget::Remote {
                    repo_url: repo.to_string(),
                    branch: settings.branch.clone(),
                    force: settings.force,
                })
            }
            (None, Some(directory)) => Ok(PublishTarget::Local {
                directory: directory.clone(),
            }),
        }
    }
}

/// Stages of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublishStage {
    Init,
    RefResolved,
    ShaResolved,
    TargetPrepared,
    TreePublished,
    Committed,
    Pushed,
    Done,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishStage::Init => "init",
            PublishStage::RefResolved => "ref-resolved",
            PublishStage::ShaResolved => "sha-resolved",
            PublishStage::TargetPrepared => "target-prepared",
            PublishStage::TreePublished => "tree-published",
            PublishStage::Committed => "committed",
            PublishStage::Pushed => "pushed",
            PublishStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// The ref that was published
    pub identity: RefIdentity,
    /// Source commit, when known
    pub sha: Option<String>,
    /// Human-readable location of the published directory
    pub location: String,
    /// Commit created on the target branch (remote only)
    pub commit: Option<String>,
    /// Whether a push happened (remote only)
    pub pushed: bool,
    /// Last stage reached
    pub stage: PublishStage,
}

/// Build the commit message for a publish.
///
/// # Example
///
/// ```
/// use refpages::core::naming::resolve_ref;
/// use refpages::engine::publish::commit_message;
///
/// let id = resolve_ref("refs/heads/main").unwrap();
/// assert_eq!(commit_message(&id, Some("4f1c2ab")), "Deploy main from 4f1c2ab");
/// assert_eq!(commit_message(&id, None), "Deploy main");
/// ```
pub fn commit_message(identity: &RefIdentity, sha: Option<&str>) -> String {
    match sha {
        Some(sha) => format!("Deploy {} from {}", identity.name(), sha),
        None => format!("Deploy {}", identity.name()),
    }
}

/// Sequences one publish run.
pub struct Publisher<'a> {
    git: &'a dyn GitClient,
    verbosity: Verbosity,
    stage: PublishStage,
}

impl<'a> Publisher<'a> {
    pub fn new(git: &'a dyn GitClient, verbosity: Verbosity) -> Self {
        Self {
            git,
            verbosity,
            stage: PublishStage::Init,
        }
    }

    /// The last stage reached.
    pub fn stage(&self) -> PublishStage {
        self.stage
    }

    fn advance(&mut self, stage: PublishStage) {
        self.stage = stage;
        output::debug(format!("stage: {}", stage), self.verbosity);
    }

    /// Run the whole publish sequence.
    ///
    /// # Errors
    ///
    /// Any [`PublishError`]; nothing is retried.
    pub fn run(&mut self, settings: &PublishSettings) -> Result<PublishReport, PublishError> {
        self.stage = PublishStage::Init;

        let target = PublishTarget::from_settings(settings)?;
        if !settings.source.is_dir() {
            return Err(PublishError::Config(format!(
                "source '{}' is not a directory",
                settings.source.display()
            )));
        }

        let identity = self.resolve_identity(settings)?;
        self.advance(PublishStage::RefResolved);

        let sha = self.resolve_sha(settings)?;
        self.advance(PublishStage::ShaResolved);

        let mut report = match target {
            PublishTarget::Remote {
                repo_url,
                branch,
                force,
            } => self.publish_remote(settings, identity, sha, &repo_url, &branch, force)?,
            PublishTarget::Local { directory } => {
                self.publish_local(settings, identity, sha, &directory)?
            }
        };

        self.advance(PublishStage::Done);
        report.stage = self.stage;
        Ok(report)
    }

    fn resolve_identity(&self, settings: &PublishSettings) -> Result<RefIdentity, PublishError> {
        let given = settings
            .git_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let raw = match given {
            Some(raw) => raw.to_string(),
            None => self
                .git
                .current_ref(&settings.source)
                .map_err(PublishError::from_source_git)?,
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PublishError::MissingRef);
        }

        let identity = resolve_ref(raw)?;
        if identity.kind() == RefKind::Unknown {
            output::debug(format!("unrecognized ref format: {}", raw), self.verbosity);
        }
        output::debug(
            format!("using ref '{}' (parsed from '{}')", identity.name(), raw),
            self.verbosity,
        );
        Ok(identity)
    }

    fn resolve_sha(&self, settings: &PublishSettings) -> Result<Option<String>, PublishError> {
        let given = settings
            .sha
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let sha = match given {
            Some(sha) => Some(sha.to_string()),
            None => self
                .git
                .current_sha(&settings.source)
                .map_err(PublishError::from_source_git)?,
        };

        match &sha {
            Some(sha) => output::debug(format!("source SHA: {}", sha), self.verbosity),
            None => output::debug("source has no commits; publishing without a SHA", self.verbosity),
        }
        Ok(sha)
    }

    fn publish_remote(
        &mut self,
        settings: &PublishSettings,
        identity: RefIdentity,
        sha: Option<String>,
        repo_url: &str,
        branch: &str,
        force: bool,
    ) -> Result<PublishReport, PublishError> {
        let repo_url = normalize_repo_url(repo_url);
        let git_err = |e| PublishError::from_git(e, &repo_url, branch);

        // Dropped on every return path below, deleting the clone.
        let work = tempfile::Builder::new()
            .prefix("refpages-")
            .tempdir()
            .map_err(PublishError::WorkTree)?;
        output::debug(
            format!("working tree: {}", work.path().display()),
            self.verbosity,
        );

        self.git
            .prepare_branch(&repo_url, branch, work.path(), &settings.identity)
            .map_err(git_err)?;
        self.advance(PublishStage::TargetPrepared);

        self.publish_into(settings, work.path(), &identity, sha.as_deref())?;
        self.advance(PublishStage::TreePublished);

        let message = commit_message(&identity, sha.as_deref());
        if force {
            output::debug("force: amending the tip of the branch", self.verbosity);
        }
        let commit = self
            .git
            .commit_all(work.path(), &message, &settings.identity, force)
            .map_err(git_err)?;

        match &commit {
            Some(id) => {
                output::debug(format!("committed {}", id), self.verbosity);
                self.advance(PublishStage::Committed);
            }
            None => output::debug("published content is unchanged", self.verbosity),
        }

        let pushed = commit.is_some() || force;
        if pushed {
            self.git
                .push(work.path(), &repo_url, branch, force)
                .map_err(git_err)?;
            self.advance(PublishStage::Pushed);
        } else {
            output::debug("nothing to commit; skipping push", self.verbosity);
        }

        Ok(PublishReport {
            location: format!("{} ({}:{})", repo_url, branch, identity.name()),
            identity,
            sha,
            commit,
            pushed,
            stage: self.stage,
        })
    }

    fn publish_local(
        &mut self,
        settings: &PublishSettings,
        identity: RefIdentity,
        sha: Option<String>,
        directory: &Path,
    ) -> Result<PublishReport, PublishError> {
        std::fs::create_dir_all(directory).map_err(|e| PublishError::CopyFailed {
            name: identity.name().to_string(),
            source: TreeError::Io {
                path: directory.to_path_buf(),
                source: e,
            },
        })?;
        self.advance(PublishStage::TargetPrepared);

        let destination = self.publish_into(settings, directory, &identity, sha.as_deref())?;
        self.advance(PublishStage::TreePublished);

        Ok(PublishReport {
            location: destination.display().to_string(),
            identity,
            sha,
            commit: None,
            pushed: false,
            stage: self.stage,
        })
    }

    /// Replace the ref's directory under `root` and update the manifest.
    fn publish_into(
        &self,
        settings: &PublishSettings,
        root: &Path,
        identity: &RefIdentity,
        sha: Option<&str>,
    ) -> Result<PathBuf, PublishError> {
        let tree = publish_tree(&settings.source, root, identity.name()).map_err(|err| {
            PublishError::CopyFailed {
                name: identity.name().to_string(),
                source: err,
            }
        })?;
        output::debug(
            format!(
                "{} {} ({} files)",
                if tree.replaced { "replaced" } else { "created" },
                tree.destination.display(),
                tree.files
            ),
            self.verbosity,
        );

        if settings.manifest {
            let entry = manifest::record_publish(root, identity, sha, &settings.aliases)?;
            output::debug(
                format!("recorded {} in {}", entry.name, manifest::MANIFEST_FILE_NAME),
                self.verbosity,
            );
        }

        Ok(tree.destination)
    }
}

/// Local repository paths are made absolute; the clone runs elsewhere.
fn normalize_repo_url(repo_url: &str) -> String {
    let path = Path::new(repo_url);
    if path.exists() {
        if let Ok(abs) = path.canonicalize() {
            return abs.to_string_lossy().into_owned();
        }
    }
    repo_url.to_string()
}
