//! Status reconciliation.
//!
//! Computes, per workspace and from nothing but the commit graphs and patch
//! identities, whether the workspace's work is represented on the staging
//! branch, plus ahead/behind against its remote tracking ref and whether it
//! has been merged upstream.
//!
//! The applied flag is a layered, best-effort approximation rather than
//! ground truth:
//!
//! 1. no unmerged commits → applied;
//! 2. else an assignment trailer naming the workspace among the staging
//!    commits the workspace does not have → applied (the divergence is
//!    explained by assignments still flowing through staging);
//! 3. else every unmerged commit's patch identity appears in a bounded
//!    window of recent staging commits → applied.
//!
//! Rewritten diffs (conflict resolutions, squashes) defeat the patch-id
//! layer and report "not applied" for work that was in fact delivered.
//! That trade keeps the no-hidden-state property: there is no ledger to
//! fall out of sync.

use crate::core::StagingContext;
use crate::trailer;
use crate::workspaces::Workspace;
use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;

/// How the applied determination was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// No commits unique to the workspace.
    UpToDate,
    /// Unmerged commits, but staging carries assignment trailers for this
    /// workspace that the workspace branch has not absorbed.
    Assigned,
    /// Every unmerged commit has a patch-identity match on staging.
    PatchMatched,
    /// Some unmerged commits have no representation on staging.
    No {
        /// Unmerged commits without a patch-identity match.
        unmatched: u32,
    },
}

/// Reconciled status of one workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceStatus {
    pub name: String,
    pub branch: String,
    pub path: PathBuf,
    /// Commits reachable from the workspace branch but not staging.
    pub unmerged: u32,
    pub applied: Applied,
    /// Ahead/behind the branch's remote tracking ref; `None` when no
    /// upstream is configured.
    pub ahead: Option<u32>,
    pub behind: Option<u32>,
    /// Whether the branch is reachable from the integration branch.
    pub merged_upstream: bool,
    /// Uncommitted edits in the workspace worktree.
    pub dirty: bool,
}

impl WorkspaceStatus {
    pub fn is_applied(&self) -> bool {
        !matches!(self.applied, Applied::No { .. })
    }
}

/// Status for every workspace in the registry. Read-only; computed fresh on
/// each call.
pub fn collect(ctx: &StagingContext) -> Result<Vec<WorkspaceStatus>> {
    ctx.workspaces()?
        .iter()
        .map(|ws| status_for(ctx, ws))
        .collect()
}

/// Status of a single workspace.
pub fn status_for(ctx: &StagingContext, ws: &Workspace) -> Result<WorkspaceStatus> {
    let staging = &ctx.settings.staging;
    let dir = &ctx.staging_dir;

    let unmerged_range = format!("{staging}..{}", ws.branch);
    let unmerged = ctx.git.rev_list_count(dir, &unmerged_range)?;

    let applied = if unmerged == 0 {
        Applied::UpToDate
    } else if has_pending_assignments(ctx, ws)? {
        Applied::Assigned
    } else {
        patch_identity_check(ctx, &unmerged_range)?
    };

    let (ahead, behind) = match ctx.git.upstream_ref(dir, &ws.branch)? {
        Some(upstream) => {
            let (a, b) = ctx.git.ahead_behind(dir, &ws.branch, &upstream)?;
            (Some(a), Some(b))
        }
        None => (None, None),
    };

    let merged_upstream = match integration_ref(ctx)? {
        Some(integration) => ctx.git.merge_base_is_ancestor(dir, &ws.branch, &integration)?,
        None => false,
    };

    let dirty = ctx.git.has_uncommitted_changes_in(&ws.path)?;

    Ok(WorkspaceStatus {
        name: ws.name.clone(),
        branch: ws.branch.clone(),
        path: ws.path.clone(),
        unmerged,
        applied,
        ahead,
        behind,
        merged_upstream,
        dirty,
    })
}

/// Assignment trailers for this workspace among staging commits the
/// workspace branch does not already contain. Trailers inside the
/// workspace's own history cannot explain unmerged work, so the search is
/// scoped to `branch..staging`.
fn has_pending_assignments(ctx: &StagingContext, ws: &Workspace) -> Result<bool> {
    let range = format!("{}..{}", ws.branch, ctx.settings.staging);
    let pattern = trailer::grep_pattern(None, &ws.name);
    for sha in ctx.git.log_grep(&ctx.staging_dir, &range, &pattern)? {
        let message = ctx.git.commit_message(&ctx.staging_dir, &sha)?;
        if let Some(assignment) = trailer::parse_trailer(&message) {
            if assignment.workspace == ws.name {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Patch-identity membership of every unmerged commit against a bounded
/// window of recent staging commits.
fn patch_identity_check(ctx: &StagingContext, unmerged_range: &str) -> Result<Applied> {
    let dir = &ctx.staging_dir;

    let mut staging_ids: HashSet<String> = HashSet::new();
    let window = ctx
        .git
        .rev_list_recent(dir, &ctx.settings.staging, ctx.settings.patch_window)?;
    for sha in window {
        if let Some(id) = ctx.git.patch_id(dir, &sha)? {
            staging_ids.insert(id);
        }
    }

    let mut unmatched = 0u32;
    for sha in ctx.git.rev_list(dir, unmerged_range, false)? {
        match ctx.git.patch_id(dir, &sha)? {
            Some(id) if staging_ids.contains(&id) => {}
            // Empty-diff commits have no identity to match.
            _ => unmatched += 1,
        }
    }

    if unmatched == 0 {
        Ok(Applied::PatchMatched)
    } else {
        Ok(Applied::No { unmatched })
    }
}

/// The ref to test merged-upstream reachability against: the local
/// integration branch when it exists, else its remote tracking ref.
fn integration_ref(ctx: &StagingContext) -> Result<Option<String>> {
    let integration = &ctx.settings.integration;
    if ctx.git.branch_exists(&ctx.staging_dir, integration)? {
        return Ok(Some(integration.clone()));
    }

    let remote_ref = format!("{}/{}", ctx.settings.remote, integration);
    if ctx.git.rev_parse(&ctx.staging_dir, &remote_ref).is_ok() {
        return Ok(Some(remote_ref));
    }

    Ok(None)
}
