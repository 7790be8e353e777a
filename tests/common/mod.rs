//! Shared helpers for integration tests: build throwaway repositories and
//! staging contexts without touching the process-wide current directory.
#![allow(dead_code)]

use divvy::core::StagingContext;
use divvy::git::GitCommand;
use divvy::settings::DivvySettings;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run a git command in `dir`, panicking with stderr on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run a git command in `dir` and return trimmed stdout.
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository with the staging branch checked out and one
/// seed commit.
pub fn init_staging_repo(root: &Path) -> PathBuf {
    let repo = root.join("repo");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "--initial-branch=staging"]);
    configure_identity(&repo);
    write(&repo, "README.md", "seed\n");
    git(&repo, &["add", "README.md"]);
    git(&repo, &["commit", "-m", "Seed commit"]);
    repo
}

pub fn configure_identity(repo: &Path) {
    git(repo, &["config", "user.name", "divvy tests"]);
    git(repo, &["config", "user.email", "tests@divvy.invalid"]);
    git(repo, &["config", "commit.gpgsign", "false"]);
}

pub fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}

/// A staging context rooted at `repo`, which doubles as project root and
/// staging worktree.
pub fn ctx(repo: &Path) -> StagingContext {
    StagingContext {
        git: GitCommand::new(true),
        settings: DivvySettings::default(),
        project_root: repo.to_path_buf(),
        staging_dir: repo.to_path_buf(),
    }
}

/// Path of a workspace created by the assignment engine.
pub fn workspace_dir(repo: &Path, name: &str) -> PathBuf {
    repo.join(".divvy").join(name)
}

/// Commit all current changes in a workspace worktree.
///
/// Timestamps are pinned to a fixed past date so a later cherry-pick of the
/// commit (committer date = now) cannot reproduce a byte-identical commit
/// object — and thus the same sha — when both happen within the same second.
pub fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "-A"]);
    let output = Command::new("git")
        .args(["commit", "-m", message])
        .env("GIT_AUTHOR_DATE", "2005-04-07T22:13:13 +0000")
        .env("GIT_COMMITTER_DATE", "2005-04-07T22:13:13 +0000")
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git commit failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
