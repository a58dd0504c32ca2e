//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! that the Git interface works correctly with actual git operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use refpages::core::types::CommitIdentity;
use refpages::git::{Git, GitClient, GitError, INITIAL_COMMIT_MESSAGE};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository on `main` with an initial commit.
    fn new() -> Self {
        let repo = Self::empty();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    /// Create a repository on `main` with no commits.
    fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);

        Self { dir }
    }

    /// Get the path to the repository.
    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file and commit it.
    fn commit_file(&self, path: &str, content: &str, message: &str) {
        fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-q", "-m", message]);
    }
}

/// A bare repository standing in for the publish remote.
struct Remote {
    dir: TempDir,
}

impl Remote {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-q", "--bare"]);
        Self { dir }
    }

    fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Tip of `branch`, or `None` if it does not exist.
    fn tip(&self, branch: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", &format!("refs/heads/{branch}")])
            .current_dir(self.dir.path())
            .output()
            .expect("git rev-parse failed");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command and return its trimmed stdout.
fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn identity() -> CommitIdentity {
    CommitIdentity::new("Docs Bot", "docs@example.com")
}

/// Prepare a working tree, add a file, commit and push it.
fn publish_file(git: &Git, remote: &Remote, work: &Path, path: &str, contents: &str) -> String {
    git.prepare_branch(&remote.url(), "gh-pages", work, &identity())
        .unwrap();
    let full = work.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
    let sha = git
        .commit_all(work, &format!("Deploy {path}"), &identity(), false)
        .unwrap()
        .unwrap();
    git.push(work, &remote.url(), "gh-pages", false).unwrap();
    sha
}

fn work_dir(temp: &TempDir, name: &str) -> PathBuf {
    temp.path().join(name)
}

// =============================================================================
// Ref and SHA Detection
// =============================================================================

#[test]
fn current_ref_on_branch() {
    let repo = TestRepo::new();
    let git = Git::new("git");

    assert_eq!(git.current_ref(repo.path()).unwrap(), "refs/heads/main");
}

#[test]
fn current_ref_in_subdirectory() {
    let repo = TestRepo::new();
    let sub = repo.path().join("docs/_build/html");
    fs::create_dir_all(&sub).unwrap();

    let git = Git::new("git");
    assert_eq!(git.current_ref(&sub).unwrap(), "refs/heads/main");
}

#[test]
fn current_ref_detached_at_tag() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["tag", "v1.0"]);
    run_git(repo.path(), &["checkout", "-q", "--detach"]);

    let git = Git::new("git");
    assert_eq!(git.current_ref(repo.path()).unwrap(), "refs/tags/v1.0");
}

#[test]
fn current_ref_detached_without_tag_fails() {
    let repo = TestRepo::new();
    run_git(repo.path(), &["checkout", "-q", "--detach"]);

    let git = Git::new("git");
    let err = git.current_ref(repo.path()).unwrap_err();
    assert!(matches!(err, GitError::RefDetectionFailed { .. }));
}

#[test]
fn current_sha_matches_head() {
    let repo = TestRepo::new();
    let git = Git::new("git");

    assert_eq!(
        git.current_sha(repo.path()).unwrap(),
        Some(git_stdout(repo.path(), &["rev-parse", "HEAD"]))
    );
}

#[test]
fn current_sha_without_commits_is_none() {
    let repo = TestRepo::empty();
    let git = Git::new("git");

    assert_eq!(git.current_sha(repo.path()).unwrap(), None);
}

#[test]
fn missing_executable_is_spawn_error() {
    let repo = TestRepo::new();
    let git = Git::new("/nonexistent/refpages-test-git");

    let err = git.current_ref(repo.path()).unwrap_err();
    assert!(matches!(err, GitError::Spawn { .. }));
    assert!(err.to_string().contains("refpages-test-git"));
}

// =============================================================================
// Branch Preparation
// =============================================================================

#[test]
fn prepare_creates_missing_branch() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let work = work_dir(&temp, "work");
    let git = Git::new("git");

    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();

    assert_eq!(
        git_stdout(&work, &["symbolic-ref", "HEAD"]),
        "refs/heads/gh-pages"
    );
    assert_eq!(
        git_stdout(&work, &["log", "--format=%s"]),
        INITIAL_COMMIT_MESSAGE
    );
    assert_eq!(git_stdout(&work, &["log", "--format=%an <%ae>"]), "Docs Bot <docs@example.com>");
    assert_eq!(git_stdout(&work, &["ls-files"]), "");
    // Nothing reaches the remote until a push.
    assert_eq!(remote.tip("gh-pages"), None);
}

#[test]
fn prepare_checks_out_existing_branch() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    let pushed = publish_file(&git, &remote, &work_dir(&temp, "first"), "v1.0/index.html", "v1");

    let work = work_dir(&temp, "second");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();

    assert_eq!(git_stdout(&work, &["rev-parse", "HEAD"]), pushed);
    assert_eq!(
        fs::read_to_string(work.join("v1.0/index.html")).unwrap(),
        "v1"
    );
}

#[test]
fn prepare_is_idempotent() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    let pushed = publish_file(&git, &remote, &work_dir(&temp, "first"), "main/index.html", "m");

    let work = work_dir(&temp, "second");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();
    fs::write(work.join("stray.txt"), "untracked").unwrap();
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();

    assert_eq!(git_stdout(&work, &["rev-parse", "HEAD"]), pushed);
    assert!(!work.join("stray.txt").exists());
    assert!(work.join("main/index.html").exists());
}

#[test]
fn prepare_unreachable_remote_fails() {
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    let missing = temp.path().join("no-such-remote.git");

    let err = git
        .prepare_branch(
            &missing.to_string_lossy(),
            "gh-pages",
            &work_dir(&temp, "work"),
            &identity(),
        )
        .unwrap_err();
    assert!(matches!(err, GitError::BranchPrepareFailed { .. }));
}

// =============================================================================
// Commit
// =============================================================================

#[test]
fn commit_without_changes_is_none() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let work = work_dir(&temp, "work");
    let git = Git::new("git");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();

    assert_eq!(git.commit_all(&work, "Deploy main", &identity(), false).unwrap(), None);
}

#[test]
fn commit_records_identity_and_message() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let work = work_dir(&temp, "work");
    let git = Git::new("git");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();

    fs::create_dir_all(work.join("main")).unwrap();
    fs::write(work.join("main/index.html"), "docs").unwrap();
    let sha = git
        .commit_all(&work, "Deploy main from abc123", &identity(), false)
        .unwrap()
        .unwrap();

    assert_eq!(git_stdout(&work, &["rev-parse", "HEAD"]), sha);
    assert_eq!(
        git_stdout(&work, &["log", "-1", "--format=%s|%an|%ce"]),
        "Deploy main from abc123|Docs Bot|docs@example.com"
    );
}

#[test]
fn amend_replaces_the_empty_root_commit() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let work = work_dir(&temp, "work");
    let git = Git::new("git");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();
    let root = git_stdout(&work, &["rev-parse", "HEAD"]);

    fs::write(work.join("index.html"), "docs").unwrap();
    let sha = git
        .commit_all(&work, "Deploy main", &identity(), true)
        .unwrap()
        .unwrap();

    assert_ne!(sha, root);
    assert_eq!(git_stdout(&work, &["rev-list", "--count", "HEAD"]), "1");
    assert_eq!(git_stdout(&work, &["log", "-1", "--format=%s|%an"]), "Deploy main|Docs Bot");
}

#[test]
fn amend_replaces_the_previous_deploy() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    let first = publish_file(&git, &remote, &work_dir(&temp, "a"), "main/index.html", "1");

    let work = work_dir(&temp, "b");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();
    fs::write(work.join("main/index.html"), "2").unwrap();
    let second = git
        .commit_all(&work, "Deploy main", &identity(), true)
        .unwrap()
        .unwrap();

    // Same parent as the commit it replaced
    assert_eq!(
        git_stdout(&work, &["rev-parse", "HEAD~1"]),
        git_stdout(remote.dir.path(), &["rev-parse", &format!("{first}~1")])
    );
    let ancestor = Command::new("git")
        .args(["merge-base", "--is-ancestor", &first, &second])
        .current_dir(&work)
        .status()
        .unwrap();
    assert!(!ancestor.success());
}

#[test]
fn amend_without_changes_is_none() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    let first = publish_file(&git, &remote, &work_dir(&temp, "a"), "main/index.html", "1");

    let work = work_dir(&temp, "b");
    git.prepare_branch(&remote.url(), "gh-pages", &work, &identity())
        .unwrap();
    assert_eq!(git.commit_all(&work, "Deploy main", &identity(), true).unwrap(), None);
    assert_eq!(git_stdout(&work, &["rev-parse", "HEAD"]), first);
}

// =============================================================================
// Push
// =============================================================================

#[test]
fn push_fast_forward() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");

    let first = publish_file(&git, &remote, &work_dir(&temp, "a"), "main/index.html", "1");
    assert_eq!(remote.tip("gh-pages"), Some(first.clone()));

    let second = publish_file(&git, &remote, &work_dir(&temp, "b"), "v1/index.html", "2");
    assert_eq!(remote.tip("gh-pages"), Some(second.clone()));
    assert_eq!(
        git_stdout(remote.dir.path(), &["rev-parse", "gh-pages~1"]),
        first
    );
}

#[test]
fn diverged_push_is_non_fast_forward() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    publish_file(&git, &remote, &work_dir(&temp, "seed"), "main/index.html", "0");

    // Two runs prepare from the same tip; the second to push has diverged.
    let stale = work_dir(&temp, "stale");
    git.prepare_branch(&remote.url(), "gh-pages", &stale, &identity())
        .unwrap();
    let winner = publish_file(&git, &remote, &work_dir(&temp, "winner"), "v2/index.html", "w");

    fs::write(stale.join("late.html"), "late").unwrap();
    git.commit_all(&stale, "Deploy late", &identity(), false)
        .unwrap()
        .unwrap();
    let err = git
        .push(&stale, &remote.url(), "gh-pages", false)
        .unwrap_err();

    assert!(matches!(err, GitError::NonFastForward { .. }));
    assert_eq!(remote.tip("gh-pages"), Some(winner));
}

#[test]
fn force_push_replaces_remote_tip() {
    let remote = Remote::new();
    let temp = TempDir::new().unwrap();
    let git = Git::new("git");
    publish_file(&git, &remote, &work_dir(&temp, "seed"), "main/index.html", "0");

    let stale = work_dir(&temp, "stale");
    git.prepare_branch(&remote.url(), "gh-pages", &stale, &identity())
        .unwrap();
    publish_file(&git, &remote, &work_dir(&temp, "other"), "v2/index.html", "w");

    fs::write(stale.join("late.html"), "late").unwrap();
    let local = git
        .commit_all(&stale, "Deploy late", &identity(), false)
        .unwrap()
        .unwrap();
    git.push(&stale, &remote.url(), "gh-pages", true).unwrap();

    assert_eq!(remote.tip("gh-pages"), Some(local));
}
