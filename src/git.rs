//! Thin wrapper around the `git` executable.
//!
//! Every operation shells out to git and surfaces failures as errors carrying
//! git's stderr. Operations that act on a particular working copy take the
//! worktree directory explicitly; nothing here depends on the process-wide
//! current directory except [`GitCommand::config_get`], which reads git's
//! layered config from wherever divvy was invoked.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

pub struct GitCommand {
    quiet: bool,
}

impl GitCommand {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Read a git config value. Returns `None` if the key is unset.
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let output = Command::new("git")
            .args(["config", "--get", key])
            .output()
            .context("Failed to execute git config command")?;

        if !output.status.success() {
            // Exit code 1 means the key is not set
            return Ok(None);
        }

        let value = String::from_utf8(output.stdout)
            .context("Failed to parse git config output")?
            .trim()
            .to_string();

        Ok(if value.is_empty() { None } else { Some(value) })
    }

    /// Output of `git status --porcelain` for a working copy.
    pub fn status_porcelain(&self, dir: &Path) -> Result<String> {
        let output = Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(dir)
            .output()
            .context("Failed to execute git status command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git status failed: {}", stderr);
        }

        String::from_utf8(output.stdout).context("Failed to parse git status output")
    }

    /// Check if a specific worktree path has uncommitted or untracked changes.
    pub fn has_uncommitted_changes_in(&self, dir: &Path) -> Result<bool> {
        Ok(!self.status_porcelain(dir)?.trim().is_empty())
    }

    /// Stage a single path, including deletions (`git add -A -- <path>`).
    pub fn add_path(&self, dir: &Path, path: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["add", "-A", "--", path])
            .current_dir(dir)
            .output()
            .context("Failed to execute git add command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git add failed for '{}': {}", path, stderr);
        }

        Ok(())
    }

    /// Commit whatever is staged with the given message.
    pub fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["commit", "-m", message]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git commit command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git commit failed: {}", stderr);
        }

        Ok(())
    }

    /// Resolve a ref to its full SHA.
    pub fn rev_parse(&self, dir: &Path, rev: &str) -> Result<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", rev])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-parse command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-parse failed for '{}': {}", rev, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-parse output")?;
        Ok(stdout.trim().to_string())
    }

    /// Extract a single commit as a patch (`git format-patch -1 --stdout`).
    pub fn format_patch(&self, dir: &Path, sha: &str) -> Result<String> {
        let output = Command::new("git")
            .args(["format-patch", "-1", "--stdout", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git format-patch command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git format-patch failed for {}: {}", sha, stderr);
        }

        String::from_utf8(output.stdout).context("Failed to parse git format-patch output")
    }

    /// Apply a patch to a working copy, uncommitted.
    pub fn apply_patch(&self, dir: &Path, patch: &str) -> Result<()> {
        let mut child = Command::new("git")
            .args(["apply", "--whitespace=nowarn"])
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn git apply command")?;

        child
            .stdin
            .take()
            .context("Failed to open stdin of git apply")?
            .write_all(patch.as_bytes())
            .context("Failed to write patch to git apply")?;

        let output = child
            .wait_with_output()
            .context("Failed to wait for git apply")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git apply failed: {}", stderr);
        }

        Ok(())
    }

    /// Contents of `<path>` as committed in `<sha>` (`git show <sha>:<path>`).
    pub fn show_file(&self, dir: &Path, sha: &str, path: &str) -> Result<Vec<u8>> {
        let output = Command::new("git")
            .args(["show", &format!("{sha}:{path}")])
            .current_dir(dir)
            .output()
            .context("Failed to execute git show command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git show failed for {}:{}: {}", sha, path, stderr);
        }

        Ok(output.stdout)
    }

    /// Per-file change status of a commit as `(status, path)` pairs, where
    /// status is git's one-letter code (`A`, `M`, `D`, ...).
    pub fn diff_tree_name_status(&self, dir: &Path, sha: &str) -> Result<Vec<(char, String)>> {
        let output = Command::new("git")
            .args(["diff-tree", "--no-commit-id", "--name-status", "--root", "-r", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git diff-tree command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git diff-tree failed for {}: {}", sha, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git diff-tree output")?;

        let mut changes = Vec::new();
        for line in stdout.lines() {
            let mut parts = line.splitn(2, '\t');
            let status = parts.next().and_then(|s| s.chars().next());
            let path = parts.next();
            if let (Some(status), Some(path)) = (status, path) {
                changes.push((status, path.to_string()));
            }
        }

        Ok(changes)
    }

    /// Create a revert commit for `<sha>`. A conflict leaves the revert in
    /// progress and returns an error.
    pub fn revert(&self, dir: &Path, sha: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["revert", "--no-edit", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git revert command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git revert failed for {}: {}", sha, stderr);
        }

        Ok(())
    }

    /// Cherry-pick a commit onto the branch checked out in `dir`. A conflict
    /// leaves the cherry-pick in progress and returns an error.
    pub fn cherry_pick(&self, dir: &Path, sha: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["cherry-pick", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git cherry-pick command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git cherry-pick failed for {}: {}", sha, stderr);
        }

        Ok(())
    }

    /// SHAs in a revision range, optionally oldest-first.
    pub fn rev_list(&self, dir: &Path, range: &str, reverse: bool) -> Result<Vec<String>> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-list", range]);

        if reverse {
            cmd.arg("--reverse");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-list command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-list failed for '{}': {}", range, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-list output")?;

        Ok(stdout.lines().map(|s| s.to_string()).collect())
    }

    /// Count commits in a revision range.
    pub fn rev_list_count(&self, dir: &Path, range: &str) -> Result<u32> {
        let output = Command::new("git")
            .args(["rev-list", "--count", range])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-list command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-list failed for '{}': {}", range, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-list output")?;

        stdout
            .trim()
            .parse::<u32>()
            .context("Failed to parse commit count as number")
    }

    /// The most recent `limit` SHAs reachable from `rev`.
    pub fn rev_list_recent(&self, dir: &Path, rev: &str, limit: u32) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args(["rev-list", "-n", &limit.to_string(), rev])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-list command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-list failed for '{}': {}", rev, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-list output")?;

        Ok(stdout.lines().map(|s| s.to_string()).collect())
    }

    /// SHAs reachable from `rev` whose message matches an extended-regexp
    /// pattern, newest first.
    pub fn log_grep(&self, dir: &Path, rev: &str, pattern: &str) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args([
                "log",
                "--extended-regexp",
                "--grep",
                pattern,
                "--format=%H",
                rev,
            ])
            .current_dir(dir)
            .output()
            .context("Failed to execute git log command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git log --grep failed: {}", stderr);
        }

        let stdout = String::from_utf8(output.stdout).context("Failed to parse git log output")?;

        Ok(stdout.lines().map(|s| s.to_string()).collect())
    }

    /// Full message body of a commit.
    pub fn commit_message(&self, dir: &Path, sha: &str) -> Result<String> {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%B", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git log command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git log failed for {}: {}", sha, stderr);
        }

        String::from_utf8(output.stdout).context("Failed to parse git log output")
    }

    /// Content-derived, rebase-stable fingerprint of a commit's change-set
    /// (`git show <sha> | git patch-id --stable`). Returns `None` for commits
    /// with an empty diff (e.g. merges).
    pub fn patch_id(&self, dir: &Path, sha: &str) -> Result<Option<String>> {
        let show = Command::new("git")
            .args(["show", sha])
            .current_dir(dir)
            .output()
            .context("Failed to execute git show command")?;

        if !show.status.success() {
            let stderr = String::from_utf8_lossy(&show.stderr);
            anyhow::bail!("Git show failed for {}: {}", sha, stderr);
        }

        let mut child = Command::new("git")
            .args(["patch-id", "--stable"])
            .current_dir(dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn git patch-id command")?;

        child
            .stdin
            .take()
            .context("Failed to open stdin of git patch-id")?
            .write_all(&show.stdout)
            .context("Failed to write diff to git patch-id")?;

        let output = child
            .wait_with_output()
            .context("Failed to wait for git patch-id")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git patch-id failed for {}: {}", sha, stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git patch-id output")?;

        Ok(stdout
            .split_whitespace()
            .next()
            .map(|id| id.to_string()))
    }

    /// Ahead/behind counts for `local...other` via
    /// `git rev-list --left-right --count`.
    pub fn ahead_behind(&self, dir: &Path, local: &str, other: &str) -> Result<(u32, u32)> {
        let output = Command::new("git")
            .args([
                "rev-list",
                "--left-right",
                "--count",
                &format!("{local}...{other}"),
            ])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-list command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-list --left-right failed: {}", stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-list output")?;
        let mut parts = stdout.split_whitespace();
        let ahead = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .context("Failed to parse ahead count")?;
        let behind = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .context("Failed to parse behind count")?;

        Ok((ahead, behind))
    }

    /// The remote tracking ref of a branch (e.g. `origin/feature`), if any.
    pub fn upstream_ref(&self, dir: &Path, branch: &str) -> Result<Option<String>> {
        let output = Command::new("git")
            .args([
                "rev-parse",
                "--abbrev-ref",
                &format!("{branch}@{{upstream}}"),
            ])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-parse command")?;

        if !output.status.success() {
            // No upstream configured
            return Ok(None);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-parse output")?;
        let upstream = stdout.trim().to_string();

        Ok(if upstream.is_empty() {
            None
        } else {
            Some(upstream)
        })
    }

    /// Check if `commit` is an ancestor of `target` using merge-base.
    pub fn merge_base_is_ancestor(&self, dir: &Path, commit: &str, target: &str) -> Result<bool> {
        let output = Command::new("git")
            .args(["merge-base", "--is-ancestor", commit, target])
            .current_dir(dir)
            .output()
            .context("Failed to execute git merge-base command")?;

        Ok(output.status.success())
    }

    /// Check if a local branch exists.
    pub fn branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        let output = Command::new("git")
            .args([
                "show-ref",
                "--verify",
                "--quiet",
                &format!("refs/heads/{branch}"),
            ])
            .current_dir(dir)
            .output()
            .context("Failed to execute git show-ref command")?;

        Ok(output.status.success())
    }

    /// Absolute path of the repository's common git dir.
    pub fn git_common_dir(&self, dir: &Path) -> Result<std::path::PathBuf> {
        let output = Command::new("git")
            .args(["rev-parse", "--path-format=absolute", "--git-common-dir"])
            .current_dir(dir)
            .output()
            .context("Failed to execute git rev-parse command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git rev-parse --git-common-dir failed: {}", stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git rev-parse output")?;
        Ok(std::path::PathBuf::from(stdout.trim()))
    }

    pub fn worktree_list_porcelain(&self, dir: &Path) -> Result<String> {
        let output = Command::new("git")
            .args(["worktree", "list", "--porcelain"])
            .current_dir(dir)
            .output()
            .context("Failed to execute git worktree list command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git worktree list failed: {}", stderr);
        }

        String::from_utf8(output.stdout).context("Failed to parse git worktree list output")
    }

    /// Add a worktree at `path` on a new branch starting from `start`.
    pub fn worktree_add_new_branch(
        &self,
        dir: &Path,
        path: &Path,
        branch: &str,
        start: &str,
    ) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["worktree", "add"]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        cmd.args(["-b", branch]).arg(path).arg(start);

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git worktree add command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git worktree add failed for '{}': {}", branch, stderr);
        }

        Ok(())
    }

    pub fn worktree_remove(&self, dir: &Path, path: &Path, force: bool) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["worktree", "remove"]);

        if force {
            cmd.arg("--force");
        }

        cmd.arg(path);

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git worktree remove command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Git worktree remove failed for '{}': {}",
                path.display(),
                stderr
            );
        }

        Ok(())
    }

    pub fn branch_delete(&self, dir: &Path, branch: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        let output = Command::new("git")
            .args(["branch", flag, branch])
            .current_dir(dir)
            .output()
            .context("Failed to execute git branch delete command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git branch delete failed for '{}': {}", branch, stderr);
        }

        Ok(())
    }

    /// Recreate `branch` at `start` in place (`git checkout -B`), carrying
    /// uncommitted edits through when the trees allow it.
    pub fn checkout_reset_branch(&self, dir: &Path, branch: &str, start: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["checkout", "-B", branch, start]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git checkout command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git checkout -B failed for '{}': {}", branch, stderr);
        }

        Ok(())
    }

    /// Discard uncommitted changes to a single path (`git checkout -- <path>`).
    pub fn checkout_path(&self, dir: &Path, path: &str) -> Result<()> {
        let output = Command::new("git")
            .args(["checkout", "--", path])
            .current_dir(dir)
            .output()
            .context("Failed to execute git checkout command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git checkout failed for '{}': {}", path, stderr);
        }

        Ok(())
    }

    pub fn fetch(&self, dir: &Path, remote: &str, prune: bool) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.arg("fetch");

        if self.quiet {
            cmd.arg("--quiet");
        }

        if prune {
            cmd.arg("--prune");
        }

        cmd.arg(remote);

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git fetch command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git fetch failed: {}", stderr);
        }

        Ok(())
    }

    /// Fetch with an explicit refspec. A plain (non-forced) refspec makes
    /// this a fast-forward-only update of the destination ref.
    pub fn fetch_refspec(&self, dir: &Path, remote: &str, refspec: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.arg("fetch");

        if self.quiet {
            cmd.arg("--quiet");
        }

        cmd.arg(remote).arg(refspec);

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git fetch command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git fetch with refspec '{}' failed: {}", refspec, stderr);
        }

        Ok(())
    }

    /// Merge `rev` into the branch checked out in `dir`. A conflict leaves
    /// the merge in progress and returns an error.
    pub fn merge(&self, dir: &Path, rev: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["merge", "--no-edit", rev]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git merge command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!("Git merge failed for '{}': {}{}", rev, stdout, stderr);
        }

        Ok(())
    }

    /// Fast-forward the branch checked out in `dir` to `rev`; refuses to
    /// create a merge commit.
    pub fn merge_ff_only(&self, dir: &Path, rev: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["merge", "--ff-only", rev]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git merge command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git merge --ff-only failed for '{}': {}", rev, stderr);
        }

        Ok(())
    }

    /// Check if a branch exists on a remote via `git ls-remote --heads`.
    pub fn ls_remote_branch_exists(&self, dir: &Path, remote: &str, branch: &str) -> Result<bool> {
        let output = Command::new("git")
            .args(["ls-remote", "--heads", remote, branch])
            .current_dir(dir)
            .output()
            .context("Failed to execute git ls-remote command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git ls-remote failed: {}", stderr);
        }

        let stdout =
            String::from_utf8(output.stdout).context("Failed to parse git ls-remote output")?;
        Ok(!stdout.trim().is_empty())
    }

    /// Delete a remote branch via `git push <remote> --delete <branch>`.
    pub fn push_delete(&self, dir: &Path, remote: &str, branch: &str) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(["push", "--no-verify", remote, "--delete", branch]);

        if self.quiet {
            cmd.arg("--quiet");
        }

        let output = cmd
            .current_dir(dir)
            .output()
            .context("Failed to execute git push --delete command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git push --delete failed for '{}': {}", branch, stderr);
        }

        Ok(())
    }
}
