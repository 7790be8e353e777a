//! Assignment engine.
//!
//! `assign` moves a pending file-level change from the staging branch into a
//! workspace: the change is committed to staging as a single-file assignment
//! commit carrying a trailer (see [`crate::trailer`]), then the commit's
//! patch is applied, uncommitted, to the workspace's working tree.
//! `unassign` reverses the move by reverting the assignment commit
//! (history-preserving, never rewriting) and best-effort undoing the
//! workspace copy.
//!
//! Batch calls are non-transactional: each path succeeds or fails on its
//! own and the outcome reports both sets. A crash between the staging
//! commit and the workspace copy leaves the commit real and the copy
//! absent; recover with `unassign` followed by a fresh `assign`.

use crate::core::{ProgressSink, StagingContext};
use crate::trailer;
use crate::workspaces::{self, Workspace};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;

/// Result of an `assign` batch.
#[derive(Debug)]
pub struct AssignOutcome {
    pub workspace: String,
    /// True if the workspace was created by this call.
    pub workspace_created: bool,
    /// Paths successfully committed and propagated.
    pub assigned: Vec<String>,
    /// Paths that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Result of an `unassign` (or `unapply`) run.
#[derive(Debug)]
pub struct UnassignOutcome {
    pub workspace: String,
    /// Paths whose assignment commits were reverted, newest-first.
    pub reverted: Vec<String>,
}

/// An assignment commit on the staging branch that has not been reverted.
#[derive(Debug, Clone)]
pub struct ActiveAssignment {
    pub sha: String,
    pub path: String,
}

/// Assign pending changes to a workspace. With an empty `paths` slice every
/// pending path in the staging worktree is assigned ("all pending").
///
/// The workspace (branch + worktree) is created on demand from the staging
/// tip after the first assignment commit, so a fresh workspace's history
/// already contains the change it was created for.
pub fn assign(
    ctx: &StagingContext,
    workspace: &str,
    paths: &[String],
    sink: &mut dyn ProgressSink,
) -> Result<AssignOutcome> {
    workspaces::validate_workspace_name(workspace)?;

    let pending = pending_paths(ctx)?;
    let requested: Vec<String> = if paths.is_empty() {
        pending.clone()
    } else {
        paths.to_vec()
    };

    let mut outcome = AssignOutcome {
        workspace: workspace.to_string(),
        workspace_created: false,
        assigned: Vec::new(),
        failed: Vec::new(),
    };

    if requested.is_empty() {
        return Ok(outcome);
    }

    let pending_set: HashSet<&String> = pending.iter().collect();
    let mut target: Option<Workspace> = ctx.find_workspace(workspace)?;

    for path in &requested {
        if !pending_set.contains(path) {
            outcome.failed.push((
                path.clone(),
                format!("no pending change for '{path}' on the staging branch"),
            ));
            continue;
        }

        sink.on_step(&format!("Assigning '{path}' to '{workspace}'"));

        if let Err(e) = commit_assignment(ctx, workspace, path) {
            outcome.failed.push((path.clone(), e.to_string()));
            continue;
        }
        let sha = ctx.git.rev_parse(&ctx.staging_dir, "HEAD")?;

        if target.is_none() {
            sink.on_step(&format!("Creating workspace '{workspace}'"));
            target = Some(workspaces::create_workspace(
                &ctx.git,
                &ctx.staging_dir,
                &ctx.project_root,
                workspace,
                &sha,
            )?);
            outcome.workspace_created = true;
        }
        let ws = target.as_ref().expect("workspace resolved above");

        match propagate(ctx, ws, &sha, path, sink) {
            Ok(()) => outcome.assigned.push(path.clone()),
            Err(e) => outcome.failed.push((
                path.clone(),
                format!("committed as {} but not propagated: {e}", &sha[..12.min(sha.len())]),
            )),
        }
    }

    Ok(outcome)
}

/// Revert assignment commits for a workspace. With `path == None` ("all"),
/// every active assignment is reverted newest-first; the staging worktree
/// must be otherwise clean. With a path, only the most recent active
/// assignment of that path is reverted.
pub fn unassign(
    ctx: &StagingContext,
    workspace: &str,
    path: Option<&str>,
    sink: &mut dyn ProgressSink,
) -> Result<UnassignOutcome> {
    let mut targets = active_assignments(ctx, workspace, path)?;

    if targets.is_empty() {
        match path {
            Some(path) => anyhow::bail!("No active assignment of '{path}' to '{workspace}'"),
            None => anyhow::bail!("No active assignments for '{workspace}'"),
        }
    }

    if path.is_some() {
        targets.truncate(1);
    } else if ctx.git.has_uncommitted_changes_in(&ctx.staging_dir)? {
        anyhow::bail!(
            "The staging worktree has uncommitted changes; assign or stash them before reverting all assignments"
        );
    }

    let ws = ctx.find_workspace(workspace)?;
    if ws.is_none() {
        sink.on_warning(&format!(
            "Workspace '{workspace}' has no worktree; skipping file restoration"
        ));
    }

    let total = targets.len();
    let mut outcome = UnassignOutcome {
        workspace: workspace.to_string(),
        reverted: Vec::new(),
    };

    // Newest-first keeps each revert applying against the state it expects.
    for assignment in targets {
        sink.on_step(&format!(
            "Reverting assignment of '{}' ({})",
            assignment.path,
            &assignment.sha[..12.min(assignment.sha.len())]
        ));

        ctx.git
            .revert(&ctx.staging_dir, &assignment.sha)
            .with_context(|| {
                format!(
                    "Revert of '{}' stopped after {} of {} (resolve the conflict in {} and run 'git revert --continue')",
                    assignment.path,
                    outcome.reverted.len(),
                    total,
                    ctx.staging_dir.display(),
                )
            })?;

        if let Some(ref ws) = ws {
            restore_workspace_file(ctx, ws, &assignment, sink);
        }
        outcome.reverted.push(assignment.path);
    }

    Ok(outcome)
}

/// Assignment commits for a workspace on the staging branch that have no
/// later revert naming them, newest-first. "Active" is derived entirely
/// from history; nothing is persisted.
pub fn active_assignments(
    ctx: &StagingContext,
    workspace: &str,
    path: Option<&str>,
) -> Result<Vec<ActiveAssignment>> {
    let staging = &ctx.settings.staging;

    let reverted: HashSet<String> = ctx
        .git
        .log_grep(&ctx.staging_dir, staging, &trailer::revert_grep_pattern())?
        .into_iter()
        .filter_map(|sha| {
            let message = ctx.git.commit_message(&ctx.staging_dir, &sha).ok()?;
            trailer::reverted_sha(&message)
        })
        .collect();

    let pattern = trailer::grep_pattern(path, workspace);
    let mut active = Vec::new();
    for sha in ctx.git.log_grep(&ctx.staging_dir, staging, &pattern)? {
        if reverted.contains(&sha) {
            continue;
        }
        let message = ctx.git.commit_message(&ctx.staging_dir, &sha)?;
        // The grep narrows candidates; the strict parse is authoritative.
        let Some(assignment) = trailer::parse_trailer(&message) else {
            continue;
        };
        if assignment.workspace != workspace {
            continue;
        }
        if let Some(path) = path {
            if assignment.path != path {
                continue;
            }
        }
        active.push(ActiveAssignment {
            sha,
            path: assignment.path,
        });
    }

    Ok(active)
}

/// Paths with a pending (staged or unstaged, including untracked) change in
/// the staging worktree.
pub fn pending_paths(ctx: &StagingContext) -> Result<Vec<String>> {
    let porcelain = ctx.git.status_porcelain(&ctx.staging_dir)?;
    Ok(parse_pending_paths(&porcelain))
}

fn parse_pending_paths(porcelain: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for line in porcelain.lines() {
        if line.len() < 4 {
            continue;
        }
        let entry = &line[3..];
        // Renames are listed as "old -> new"; the new path is the one with
        // the pending content.
        let path = match entry.split_once(" -> ") {
            Some((_, new)) => new,
            None => entry,
        };
        let path = path.trim_matches('"');
        if !path.is_empty() {
            paths.push(path.to_string());
        }
    }
    paths
}

fn commit_assignment(ctx: &StagingContext, workspace: &str, path: &str) -> Result<()> {
    ctx.git.add_path(&ctx.staging_dir, path)?;
    ctx.git
        .commit(&ctx.staging_dir, &trailer::assignment_message(path, workspace))
}

/// Carry an assignment commit's change into the workspace working tree,
/// uncommitted. Patch application handles modify/create/delete; when the
/// patch does not apply and the change is not a deletion, fall back to
/// copying the blob out of the assignment commit.
fn propagate(
    ctx: &StagingContext,
    ws: &Workspace,
    sha: &str,
    path: &str,
    sink: &mut dyn ProgressSink,
) -> Result<()> {
    let patch = ctx.git.format_patch(&ctx.staging_dir, sha)?;

    if let Err(apply_err) = ctx.git.apply_patch(&ws.path, &patch) {
        if commit_change_kind(ctx, sha, path)? == Some('D') {
            // Nothing to copy for a deletion; the workspace may simply not
            // have the file.
            sink.on_warning(&format!(
                "Could not apply deletion of '{path}' in workspace '{}': {apply_err}",
                ws.name
            ));
            return Ok(());
        }

        sink.on_step(&format!(
            "Patch for '{path}' did not apply in '{}'; copying file content",
            ws.name
        ));
        let content = ctx.git.show_file(&ctx.staging_dir, sha, path)?;
        let target = ws.path.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    Ok(())
}

/// Best-effort removal of the uncommitted workspace copy created by an
/// assignment. Failures are warnings; the staging revert already happened
/// and stands on its own.
fn restore_workspace_file(
    ctx: &StagingContext,
    ws: &Workspace,
    assignment: &ActiveAssignment,
    sink: &mut dyn ProgressSink,
) {
    if let Err(e) = undo_workspace_copy(ctx, ws, assignment) {
        sink.on_warning(&format!(
            "Could not restore '{}' in workspace '{}': {e}",
            assignment.path, ws.name
        ));
    }
}

fn undo_workspace_copy(
    ctx: &StagingContext,
    ws: &Workspace,
    assignment: &ActiveAssignment,
) -> Result<()> {
    // An assignment that is part of the workspace branch itself (the one the
    // workspace was created from) committed the assigned content there, so
    // `git checkout -- <path>` would bring the change right back. Mirror the
    // post-revert staging content into the working tree instead.
    if ctx
        .git
        .merge_base_is_ancestor(&ctx.staging_dir, &assignment.sha, &ws.branch)?
    {
        return mirror_staging_content(ctx, ws, &assignment.path);
    }

    match commit_change_kind(ctx, &assignment.sha, &assignment.path)? {
        // The assignment introduced the file; drop the workspace copy.
        Some('A') => remove_workspace_copy(&ws.path.join(&assignment.path)),
        // Modified or deleted: restore whatever the workspace branch has.
        _ => ctx.git.checkout_path(&ws.path, &assignment.path),
    }
}

/// Make the workspace's working-tree copy of `path` match what the staging
/// branch has after the revert: the pre-assignment content, or no file at
/// all when the assignment created it.
fn mirror_staging_content(ctx: &StagingContext, ws: &Workspace, path: &str) -> Result<()> {
    match ctx.git.show_file(&ctx.staging_dir, "HEAD", path) {
        Ok(content) => {
            let target = ws.path.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(&target, content)
                .with_context(|| format!("Failed to write {}", target.display()))
        }
        // The revert removed the file from staging entirely.
        Err(_) => remove_workspace_copy(&ws.path.join(path)),
    }
}

fn remove_workspace_copy(target: &std::path::Path) -> Result<()> {
    match fs::remove_file(target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::from(e)),
    }
}

/// The one-letter change status a single-file commit applied to `path`.
fn commit_change_kind(ctx: &StagingContext, sha: &str, path: &str) -> Result<Option<char>> {
    let changes = ctx.git.diff_tree_name_status(&ctx.staging_dir, sha)?;
    Ok(changes
        .into_iter()
        .find(|(_, changed)| changed == path)
        .map(|(status, _)| status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pending_paths() {
        let porcelain = " M src/lib.rs\n?? notes.md\nA  staged.rs\n D gone.rs\n";
        let paths = parse_pending_paths(porcelain);
        assert_eq!(paths, vec!["src/lib.rs", "notes.md", "staged.rs", "gone.rs"]);
    }

    #[test]
    fn test_parse_pending_paths_rename_takes_new_path() {
        let porcelain = "R  old.rs -> new.rs\n";
        assert_eq!(parse_pending_paths(porcelain), vec!["new.rs"]);
    }

    #[test]
    fn test_parse_pending_paths_quoted() {
        let porcelain = "?? \"with space.txt\"\n";
        assert_eq!(parse_pending_paths(porcelain), vec!["with space.txt"]);
    }

    #[test]
    fn test_parse_pending_paths_empty() {
        assert!(parse_pending_paths("").is_empty());
        assert!(parse_pending_paths("\n").is_empty());
    }
}
