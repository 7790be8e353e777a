//! Sync/cleanup engine.
//!
//! Brings upstream work into the staging branch and retires workspaces that
//! have been delivered: fetch, fast-forward the local integration branch,
//! merge it into staging, then walk the registry. A workspace whose branch
//! is reachable from the integration branch is finished: it is removed
//! outright when clean, or given a fresh branch off the new staging tip
//! when it still holds uncommitted edits (the edits were never committed,
//! so they survive the branch swap).
//!
//! Every cleanup step is independent and best-effort: one workspace failing
//! to clean up does not stop the others or fail the sync.

use crate::core::{ProgressSink, StagingContext};
use crate::workspaces::{self, Workspace};
use anyhow::{Context, Result};

/// Result of a `sync` run.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Ref the staging branch was merged from.
    pub merged_from: String,
    /// Workspaces fully removed (worktree, local branch, remote branch).
    pub removed: Vec<String>,
    /// Dirty workspaces whose branch was recreated at the new staging tip.
    pub refreshed: Vec<String>,
    /// Workspaces left untouched (not yet merged upstream).
    pub kept: u32,
    /// Number of best-effort cleanup steps that failed with a warning.
    pub warnings: u32,
}

pub fn sync(ctx: &StagingContext, sink: &mut dyn ProgressSink) -> Result<SyncOutcome> {
    let remote = &ctx.settings.remote;
    let dir = &ctx.staging_dir;

    sink.on_step(&format!(
        "Fetching from {remote} and pruning stale remote-tracking branches"
    ));
    ctx.git.fetch(dir, remote, true).context("git fetch failed")?;

    let source = update_integration(ctx, sink)?;

    sink.on_step(&format!(
        "Merging '{source}' into '{}'",
        ctx.settings.staging
    ));
    ctx.git.merge(dir, &source).with_context(|| {
        format!(
            "Merge of '{source}' into '{}' failed; resolve it in {} and rerun",
            ctx.settings.staging,
            dir.display(),
        )
    })?;

    let staging_tip = ctx.git.rev_parse(dir, "HEAD")?;

    let mut outcome = SyncOutcome {
        merged_from: source.clone(),
        removed: Vec::new(),
        refreshed: Vec::new(),
        kept: 0,
        warnings: 0,
    };

    for ws in ctx.workspaces()? {
        if !ctx.git.merge_base_is_ancestor(dir, &ws.branch, &source)? {
            outcome.kept += 1;
            continue;
        }

        let dirty = match ctx.git.has_uncommitted_changes_in(&ws.path) {
            Ok(dirty) => dirty,
            Err(e) => {
                sink.on_warning(&format!(
                    "Could not inspect workspace '{}': {e}; leaving it alone",
                    ws.name
                ));
                outcome.warnings += 1;
                outcome.kept += 1;
                continue;
            }
        };

        if dirty {
            refresh_workspace(ctx, &ws, &staging_tip, &mut outcome, sink);
        } else {
            remove_workspace(ctx, &ws, &mut outcome, sink);
        }
    }

    Ok(outcome)
}

/// Fast-forward the local integration branch from its remote counterpart
/// and return the ref to merge from. When no local integration branch
/// exists, the remote tracking ref is used directly.
fn update_integration(ctx: &StagingContext, sink: &mut dyn ProgressSink) -> Result<String> {
    let integration = &ctx.settings.integration;
    let remote = &ctx.settings.remote;
    let dir = &ctx.staging_dir;

    if !ctx.git.branch_exists(dir, integration)? {
        return Ok(format!("{remote}/{integration}"));
    }

    sink.on_step(&format!("Fast-forwarding '{integration}' from {remote}"));

    // A checked-out branch cannot be updated by fetch; fast-forward it in
    // its own worktree instead.
    match workspaces::worktree_for_branch(&ctx.git, dir, integration)? {
        Some(worktree) => ctx
            .git
            .merge_ff_only(&worktree, &format!("{remote}/{integration}"))
            .with_context(|| format!("Failed to fast-forward '{integration}'"))?,
        None => ctx
            .git
            .fetch_refspec(dir, remote, &format!("{integration}:{integration}"))
            .with_context(|| format!("Failed to fast-forward '{integration}'"))?,
    }

    Ok(integration.clone())
}

/// Recreate a dirty-but-merged workspace's branch at the new staging tip,
/// in place. Uncommitted edits were never part of the branch and carry
/// over.
fn refresh_workspace(
    ctx: &StagingContext,
    ws: &Workspace,
    staging_tip: &str,
    outcome: &mut SyncOutcome,
    sink: &mut dyn ProgressSink,
) {
    sink.on_step(&format!(
        "Workspace '{}' is merged but has uncommitted edits; recreating its branch",
        ws.name
    ));

    match ctx.git.checkout_reset_branch(&ws.path, &ws.branch, staging_tip) {
        Ok(()) => outcome.refreshed.push(ws.name.clone()),
        Err(e) => {
            sink.on_warning(&format!(
                "Could not recreate branch '{}' in workspace '{}': {e}",
                ws.branch, ws.name
            ));
            outcome.warnings += 1;
        }
    }
}

/// Remove a merged, clean workspace: worktree, local branch, and remote
/// branch if one exists. Steps are attempted independently.
fn remove_workspace(
    ctx: &StagingContext,
    ws: &Workspace,
    outcome: &mut SyncOutcome,
    sink: &mut dyn ProgressSink,
) {
    let dir = &ctx.staging_dir;
    let remote = &ctx.settings.remote;
    sink.on_step(&format!("Removing merged workspace '{}'", ws.name));

    let mut removed = true;

    if let Err(e) = ctx.git.worktree_remove(dir, &ws.path, false) {
        sink.on_warning(&format!(
            "Could not remove worktree for '{}': {e}",
            ws.name
        ));
        outcome.warnings += 1;
        removed = false;
    }

    if let Err(e) = ctx.git.branch_delete(dir, &ws.branch, true) {
        sink.on_warning(&format!("Could not delete branch '{}': {e}", ws.branch));
        outcome.warnings += 1;
        removed = false;
    }

    match ctx.git.ls_remote_branch_exists(dir, remote, &ws.branch) {
        Ok(true) => {
            if let Err(e) = ctx.git.push_delete(dir, remote, &ws.branch) {
                sink.on_warning(&format!(
                    "Could not delete remote branch '{}': {e}",
                    ws.branch
                ));
                outcome.warnings += 1;
            }
        }
        Ok(false) => {}
        Err(e) => {
            sink.on_warning(&format!(
                "Could not check remote for branch '{}': {e}",
                ws.branch
            ));
            outcome.warnings += 1;
        }
    }

    if removed {
        outcome.removed.push(ws.name.clone());
    } else {
        outcome.kept += 1;
    }
}
