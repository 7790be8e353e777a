use crate::{
    core::{apply, LogSink, StagingContext},
    is_git_repository,
    logging::init_logging,
    settings::DivvySettings,
    styles,
};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "divvy-apply")]
#[command(version = crate::VERSION)]
#[command(about = "Cherry-pick a workspace's commits onto the staging branch")]
#[command(long_about = r#"
Merges a workspace's own commits into the staging branch.

Commits reachable from the workspace branch but not from staging are
cherry-picked onto staging in order, oldest first. After a successful run
every one of those commits has a patch-identity match on staging.

A conflict halts the sequence and leaves the cherry-pick in progress in
the staging worktree; resolve it with the normal `git cherry-pick
--continue` flow and rerun.

Reversible with `divvy unapply`.
"#)]
pub struct Args {
    #[arg(help = "Workspace whose commits to apply")]
    workspace: String,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("apply"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    run_apply(&args)
}

fn run_apply(args: &Args) -> Result<()> {
    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, !args.verbose)?;

    let outcome = apply::apply(&ctx, &args.workspace, &mut LogSink)?;

    if outcome.picked.is_empty() {
        println!(
            "Workspace '{}' has no commits to apply.",
            outcome.workspace
        );
        return Ok(());
    }

    for sha in &outcome.picked {
        println!(" * {} {}", tag_picked(), &sha[..12.min(sha.len())]);
    }

    println!("---");
    let word = if outcome.picked.len() == 1 {
        "commit"
    } else {
        "commits"
    };
    println!(
        "Applied {} {word} from '{}' to '{}'.",
        outcome.picked.len(),
        outcome.workspace,
        ctx.settings.staging
    );

    Ok(())
}

fn tag_picked() -> String {
    if styles::colors_enabled() {
        format!("{}[picked]{}", styles::GREEN, styles::RESET)
    } else {
        "[picked]".to_string()
    }
}
