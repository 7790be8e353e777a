use crate::{
    core::{assign, LogSink, StagingContext},
    is_git_repository, log_error,
    logging::init_logging,
    settings::DivvySettings,
    styles,
};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "divvy-assign")]
#[command(version = crate::VERSION)]
#[command(about = "Assign pending staging changes to a workspace")]
#[command(long_about = r#"
Moves pending (uncommitted) file changes from the staging branch into a
workspace.

Each path is committed to the staging branch as a single-file assignment
commit tagged with the destination workspace, then applied (uncommitted)
to the workspace's working tree. The staging working tree becomes clean for
the assigned paths; the work itself is preserved in history.

With no paths, every pending change in the staging worktree is assigned.
The workspace (branch + worktree under .divvy/) is created on first use.

Assignments are reversible with `divvy unassign`.

Examples:
  divvy assign feature-auth src/auth.rs   # Assign one file
  divvy assign feature-auth               # Assign everything pending
"#)]
pub struct Args {
    #[arg(help = "Destination workspace (branch name)")]
    workspace: String,

    #[arg(help = "Paths to assign; all pending changes when omitted")]
    paths: Vec<String>,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("assign"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    run_assign(&args)
}

fn run_assign(args: &Args) -> Result<()> {
    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, !args.verbose)?;

    let outcome = assign::assign(&ctx, &args.workspace, &args.paths, &mut LogSink)?;

    if outcome.assigned.is_empty() && outcome.failed.is_empty() {
        println!("No pending changes to assign.");
        return Ok(());
    }

    if outcome.workspace_created {
        println!("Created workspace '{}'", outcome.workspace);
    }

    for path in &outcome.assigned {
        println!(" * {} {}", tag_assigned(), path);
    }
    for (path, reason) in &outcome.failed {
        log_error!("Failed to assign '{}': {}", path, reason);
        println!(" * {} {}", tag_failed(), path);
    }

    println!("---");
    if outcome.failed.is_empty() {
        let word = if outcome.assigned.len() == 1 {
            "file"
        } else {
            "files"
        };
        println!(
            "Assigned {} {word} to '{}'.",
            outcome.assigned.len(),
            outcome.workspace
        );
        Ok(())
    } else {
        anyhow::bail!(
            "Assigned {} file(s), {} failed. Failed paths keep their pending changes.",
            outcome.assigned.len(),
            outcome.failed.len()
        )
    }
}

fn tag_assigned() -> String {
    if styles::colors_enabled() {
        format!("{}[assigned]{}", styles::GREEN, styles::RESET)
    } else {
        "[assigned]".to_string()
    }
}

fn tag_failed() -> String {
    if styles::colors_enabled() {
        format!("{}[failed]{}", styles::RED, styles::RESET)
    } else {
        "[failed]".to_string()
    }
}
