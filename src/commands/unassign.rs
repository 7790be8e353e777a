use crate::{
    core::{assign, LogSink, StagingContext},
    is_git_repository,
    logging::init_logging,
    settings::DivvySettings,
    styles,
};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "divvy-unassign")]
#[command(version = crate::VERSION)]
#[command(about = "Revert assignments made to a workspace")]
#[command(long_about = r#"
Reverses `divvy assign`: creates revert commits on the staging branch for
the workspace's assignment commits and removes the corresponding
uncommitted copies from the workspace's working tree (best effort).

With a path, only the most recent active assignment of that path is
reverted. Without one, every active assignment for the workspace is
reverted, newest first; this requires an otherwise clean staging worktree.

History is preserved: assignment commits are reverted, never deleted. If
the staging branch has since changed an assigned path, the revert may
conflict; resolve it with the normal `git revert --continue` flow.

Examples:
  divvy unassign feature-auth src/auth.rs   # Take back one file
  divvy unassign feature-auth               # Take back everything
"#)]
pub struct Args {
    #[arg(help = "Workspace whose assignments to revert")]
    workspace: String,

    #[arg(help = "Path to unassign; all active assignments when omitted")]
    path: Option<String>,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("unassign"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    run_unassign(&args)
}

fn run_unassign(args: &Args) -> Result<()> {
    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, !args.verbose)?;

    let outcome = assign::unassign(&ctx, &args.workspace, args.path.as_deref(), &mut LogSink)?;

    for path in &outcome.reverted {
        println!(" * {} {}", tag_reverted(), path);
    }

    println!("---");
    let word = if outcome.reverted.len() == 1 {
        "assignment"
    } else {
        "assignments"
    };
    println!(
        "Reverted {} {word} for '{}'.",
        outcome.reverted.len(),
        outcome.workspace
    );

    Ok(())
}

fn tag_reverted() -> String {
    if styles::colors_enabled() {
        format!("{}[reverted]{}", styles::YELLOW, styles::RESET)
    } else {
        "[reverted]".to_string()
    }
}
