//! Apply/unapply engine.
//!
//! `apply` merges a workspace's own commits into the staging branch by
//! cherry-picking them in graph order; after a successful run the staging
//! tip is a superset, by patch identity, of the workspace's change-set.
//! `unapply` is deliberately symmetric with `unassign all`: it reverts the
//! workspace's assignment commits on the staging branch newest-first and
//! does not separately track commits introduced by `apply`.

use crate::core::{assign, ProgressSink, StagingContext};
use anyhow::{Context, Result};

/// Result of an `apply` run.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub workspace: String,
    /// Commits cherry-picked onto the staging branch, oldest-first.
    pub picked: Vec<String>,
}

/// Cherry-pick every commit reachable from the workspace branch but not the
/// staging branch onto staging, oldest first. A conflict halts the sequence
/// with the cherry-pick left in progress for manual resolution.
pub fn apply(
    ctx: &StagingContext,
    workspace: &str,
    sink: &mut dyn ProgressSink,
) -> Result<ApplyOutcome> {
    let ws = ctx
        .find_workspace(workspace)?
        .with_context(|| format!("No workspace named '{workspace}'"))?;

    let range = format!("{}..{}", ctx.settings.staging, ws.branch);
    let unmerged = ctx.git.rev_list(&ctx.staging_dir, &range, true)?;

    let mut outcome = ApplyOutcome {
        workspace: workspace.to_string(),
        picked: Vec::new(),
    };

    let total = unmerged.len();
    for sha in unmerged {
        sink.on_step(&format!(
            "Cherry-picking {} onto '{}'",
            &sha[..12.min(sha.len())],
            ctx.settings.staging
        ));

        ctx.git
            .cherry_pick(&ctx.staging_dir, &sha)
            .with_context(|| {
                format!(
                    "Cherry-pick halted at {} after {} of {} (resolve the conflict in {} and run 'git cherry-pick --continue')",
                    sha,
                    outcome.picked.len(),
                    total,
                    ctx.staging_dir.display(),
                )
            })?;
        outcome.picked.push(sha);
    }

    Ok(outcome)
}

/// Revert the workspace's active assignment commits on the staging branch,
/// newest-first.
pub fn unapply(
    ctx: &StagingContext,
    workspace: &str,
    sink: &mut dyn ProgressSink,
) -> Result<assign::UnassignOutcome> {
    assign::unassign(ctx, workspace, None, sink)
}
