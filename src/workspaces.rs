//! Live workspace registry.
//!
//! A workspace is an independent worktree identified solely by its branch
//! name; the branch name doubles as its directory name under
//! `<project root>/.divvy/`. The registry is derived from
//! `git worktree list --porcelain` on every call. There is no separate
//! store to fall out of sync.

use crate::git::GitCommand;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One workspace: a worktree plus the branch checked out in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Workspace name; identical to the branch name.
    pub name: String,
    pub branch: String,
    pub path: PathBuf,
}

/// Parsed entry from `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorktreeEntry {
    path: PathBuf,
    branch: Option<String>,
    is_bare: bool,
}

fn parse_worktree_list(porcelain: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;

    for line in porcelain.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(WorktreeEntry {
                path: PathBuf::from(path),
                branch: None,
                is_bare: false,
            });
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            if let Some(ref mut entry) = current {
                let branch = branch_ref
                    .strip_prefix("refs/heads/")
                    .unwrap_or(branch_ref)
                    .to_string();
                entry.branch = Some(branch);
            }
        } else if line == "bare" {
            if let Some(ref mut entry) = current {
                entry.is_bare = true;
            }
        }
        // "HEAD <sha>", "detached" and blank separators need no handling:
        // detached worktrees simply keep branch == None.
    }

    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    entries
}

/// All workspaces, i.e. every worktree except bare/detached entries and the
/// ones holding the staging or integration branch.
pub fn list_workspaces(
    git: &GitCommand,
    repo_dir: &Path,
    staging: &str,
    integration: &str,
) -> Result<Vec<Workspace>> {
    let porcelain = git.worktree_list_porcelain(repo_dir)?;
    let workspaces = parse_worktree_list(&porcelain)
        .into_iter()
        .filter(|entry| !entry.is_bare)
        .filter_map(|entry| {
            let branch = entry.branch?;
            if branch == staging || branch == integration {
                return None;
            }
            Some(Workspace {
                name: branch.clone(),
                branch,
                path: entry.path,
            })
        })
        .collect();

    Ok(workspaces)
}

/// Look up a single workspace by name.
pub fn find_workspace(
    git: &GitCommand,
    repo_dir: &Path,
    staging: &str,
    integration: &str,
    name: &str,
) -> Result<Option<Workspace>> {
    let workspaces = list_workspaces(git, repo_dir, staging, integration)?;
    Ok(workspaces.into_iter().find(|ws| ws.name == name))
}

/// The worktree a branch is checked out in, if any.
pub fn worktree_for_branch(
    git: &GitCommand,
    repo_dir: &Path,
    branch: &str,
) -> Result<Option<PathBuf>> {
    let porcelain = git.worktree_list_porcelain(repo_dir)?;
    Ok(parse_worktree_list(&porcelain)
        .into_iter()
        .find(|entry| entry.branch.as_deref() == Some(branch))
        .map(|entry| entry.path))
}

/// The worktree that has the staging branch checked out. Every staging-side
/// mutation runs inside this directory.
pub fn staging_worktree(git: &GitCommand, repo_dir: &Path, staging: &str) -> Result<PathBuf> {
    worktree_for_branch(git, repo_dir, staging)?
        .with_context(|| format!("Staging branch '{staging}' is not checked out in any worktree"))
}

/// Create a workspace: a new branch at `start` checked out in a fresh
/// worktree under `<project root>/.divvy/<name>`.
pub fn create_workspace(
    git: &GitCommand,
    repo_dir: &Path,
    project_root: &Path,
    name: &str,
    start: &str,
) -> Result<Workspace> {
    validate_workspace_name(name)?;

    let container = project_root.join(".divvy");
    if !container.exists() {
        fs::create_dir_all(&container)
            .with_context(|| format!("Failed to create directory: {}", container.display()))?;
    }
    ensure_excluded(git, repo_dir)?;

    let path = container.join(name);
    git.worktree_add_new_branch(repo_dir, &path, name, start)?;

    Ok(Workspace {
        name: name.to_string(),
        branch: name.to_string(),
        path,
    })
}

/// Reject names git would refuse as branch names or that would escape the
/// workspace container directory.
pub fn validate_workspace_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && !name.starts_with('-')
        && !name.contains("..")
        && !name.contains('/')
        && !name.chars().any(|c| c.is_whitespace() || c == '~' || c == '^' || c == ':');

    if !ok {
        anyhow::bail!("Invalid workspace name: '{}'", name);
    }

    Ok(())
}

/// Keep the workspace container out of `git status` by listing it in the
/// repository-local `info/exclude` (never touches tracked files).
fn ensure_excluded(git: &GitCommand, repo_dir: &Path) -> Result<()> {
    let exclude = git.git_common_dir(repo_dir)?.join("info").join("exclude");

    let existing = fs::read_to_string(&exclude).unwrap_or_default();
    if existing.lines().any(|line| line.trim() == ".divvy/") {
        return Ok(());
    }

    if let Some(parent) = exclude.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&exclude)
        .with_context(|| format!("Failed to open {}", exclude.display()))?;
    writeln!(file, ".divvy/").context("Failed to update info/exclude")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORCELAIN: &str = "\
worktree /repo
HEAD 1111111111111111111111111111111111111111
branch refs/heads/staging

worktree /repo/.divvy/feature-auth
HEAD 2222222222222222222222222222222222222222
branch refs/heads/feature-auth

worktree /repo/.divvy/scratch
HEAD 3333333333333333333333333333333333333333
detached
";

    #[test]
    fn test_parse_worktree_list() {
        let entries = parse_worktree_list(PORCELAIN);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, PathBuf::from("/repo"));
        assert_eq!(entries[0].branch.as_deref(), Some("staging"));
        assert_eq!(entries[1].branch.as_deref(), Some("feature-auth"));
        assert_eq!(entries[2].branch, None);
        assert!(!entries[2].is_bare);
    }

    #[test]
    fn test_parse_worktree_list_bare_entry() {
        let porcelain = "worktree /repo/.bare\nbare\n\nworktree /repo/main\nHEAD 1111\nbranch refs/heads/main\n";
        let entries = parse_worktree_list(porcelain);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_bare);
        assert_eq!(entries[1].branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_parse_worktree_list_empty() {
        assert!(parse_worktree_list("").is_empty());
    }

    #[test]
    fn test_validate_workspace_name() {
        assert!(validate_workspace_name("feature-auth").is_ok());
        assert!(validate_workspace_name("fix_123").is_ok());
        assert!(validate_workspace_name("").is_err());
        assert!(validate_workspace_name("-leading-dash").is_err());
        assert!(validate_workspace_name("a..b").is_err());
        assert!(validate_workspace_name("nested/name").is_err());
        assert!(validate_workspace_name("has space").is_err());
        assert!(validate_workspace_name("colon:name").is_err());
    }
}
