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
#[command(name = "divvy-unapply")]
#[command(version = crate::VERSION)]
#[command(about = "Revert a workspace's assignment commits on the staging branch")]
#[command(long_about = r#"
Reverses the staging branch's record of a workspace's work by reverting the
workspace's assignment commits, newest first. It is the mirror image of
`divvy apply`.

Commits introduced by `apply` are not tracked separately; unapply operates
on the assignment trailers alone. Requires an otherwise clean staging
worktree. Conflicts are surfaced and left for the normal `git revert
--continue` flow.
"#)]
pub struct Args {
    #[arg(help = "Workspace whose staged work to revert")]
    workspace: String,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("unapply"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    run_unapply(&args)
}

fn run_unapply(args: &Args) -> Result<()> {
    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, !args.verbose)?;

    let outcome = apply::unapply(&ctx, &args.workspace, &mut LogSink)?;

    for path in &outcome.reverted {
        println!(" * {} {}", tag_reverted(), path);
    }

    println!("---");
    let word = if outcome.reverted.len() == 1 {
        "commit"
    } else {
        "commits"
    };
    println!(
        "Reverted {} assignment {word} for '{}'.",
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
