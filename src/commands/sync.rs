//! divvy sync - merge upstream into staging and retire delivered workspaces.

use crate::{
    core::{sync, LogSink, StagingContext},
    is_git_repository,
    logging::init_logging,
    settings::DivvySettings,
    styles,
};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "divvy-sync")]
#[command(version = crate::VERSION)]
#[command(about = "Merge the integration branch into staging and clean up merged workspaces")]
#[command(long_about = r#"
Synchronizes the staging branch with the integration branch and retires
workspaces whose work has landed upstream:

  1. Fetch the remote (with prune) and fast-forward the local integration
     branch.
  2. Merge the integration branch into staging. A conflict aborts; resolve
     it in the staging worktree and rerun.
  3. For every workspace whose branch is reachable from the integration
     branch: remove it entirely (worktree, local branch, remote branch)
     when its working tree is clean, or recreate its branch at the new
     staging tip when it still has uncommitted edits. The edits survive.

Cleanup steps are independent and best-effort; individual failures are
reported as warnings and do not abort the sync.
"#)]
pub struct Args {
    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("sync"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    run_sync(&args)
}

fn run_sync(args: &Args) -> Result<()> {
    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, !args.verbose)?;

    let outcome = sync::sync(&ctx, &mut LogSink)?;

    println!(
        "Merged '{}' into '{}'.",
        outcome.merged_from, ctx.settings.staging
    );

    for name in &outcome.removed {
        println!(" * {} {} (worktree, local branch, remote branch)", tag_removed(), name);
    }
    for name in &outcome.refreshed {
        println!(" * {} {} (branch recreated at the new staging tip)", tag_refreshed(), name);
    }

    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &sync::SyncOutcome) {
    let mut parts: Vec<String> = Vec::new();

    if !outcome.removed.is_empty() {
        let word = if outcome.removed.len() == 1 {
            "workspace"
        } else {
            "workspaces"
        };
        parts.push(format!("Removed {} {word}", outcome.removed.len()));
    }
    if !outcome.refreshed.is_empty() {
        let word = if outcome.refreshed.len() == 1 {
            "workspace"
        } else {
            "workspaces"
        };
        if parts.is_empty() {
            parts.push(format!("Refreshed {} {word}", outcome.refreshed.len()));
        } else {
            parts.push(format!("refreshed {} {word}", outcome.refreshed.len()));
        }
    }
    if outcome.kept > 0 {
        let word = if outcome.kept == 1 {
            "workspace"
        } else {
            "workspaces"
        };
        if parts.is_empty() {
            parts.push(format!("Kept {} {word}", outcome.kept));
        } else {
            parts.push(format!("kept {} {word}", outcome.kept));
        }
    }

    if parts.is_empty() {
        println!("No workspaces to clean up.");
    } else {
        println!("{}", parts.join(", "));
    }

    if outcome.warnings > 0 {
        eprintln!(
            "Completed with {} warning(s); see messages above.",
            outcome.warnings
        );
    }
}

fn tag_removed() -> String {
    if styles::colors_enabled() {
        format!("{}[removed]{}", styles::RED, styles::RESET)
    } else {
        "[removed]".to_string()
    }
}

fn tag_refreshed() -> String {
    if styles::colors_enabled() {
        format!("{}[refreshed]{}", styles::GREEN, styles::RESET)
    } else {
        "[refreshed]".to_string()
    }
}
