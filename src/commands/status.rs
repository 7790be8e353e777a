use crate::{
    core::{status, StagingContext},
    is_git_repository,
    logging::init_logging,
    settings::DivvySettings,
    styles,
};
use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "divvy-status")]
#[command(version = crate::VERSION)]
#[command(about = "Show per-workspace status against the staging branch")]
#[command(long_about = r#"
Shows, for every workspace, whether its work is represented on the staging
branch, how it stands against its remote tracking branch, and whether it
has been merged into the integration branch.

Each workspace is shown with:
  - An applied tag: [applied] when staging covers the workspace's commits,
    [not applied] with a count otherwise
  - The number of commits unique to the workspace
  - Ahead/behind counts vs. the remote tracking branch (e.g. +3 -1)
  - A [merged] tag once the branch is reachable from the integration branch
  - A `*` dirty marker if the worktree has uncommitted changes

The applied determination is a best-effort reading of history (commit
counts, assignment trailers, patch identities), not ground truth.

Use --json for machine-readable output suitable for scripting.
"#)]
pub struct Args {
    #[arg(long, help = "Output in JSON format")]
    json: bool,

    #[arg(short, long, help = "Be verbose; show detailed progress")]
    verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse_from(crate::get_clap_args("status"));

    init_logging(args.verbose);

    if !is_git_repository()? {
        anyhow::bail!("Not inside a Git repository");
    }

    let settings = DivvySettings::load()?;
    let ctx = StagingContext::open(settings, true)?;
    let statuses = status::collect(&ctx)?;

    if args.json {
        return print_json(&statuses);
    }

    print_listing(&ctx.settings.staging, &statuses);
    Ok(())
}

fn print_json(statuses: &[status::WorkspaceStatus]) -> Result<()> {
    let entries: Vec<serde_json::Value> = statuses
        .iter()
        .map(|s| {
            serde_json::json!({
                "name": s.name,
                "branch": s.branch,
                "path": s.path.display().to_string(),
                "unmerged": s.unmerged,
                "applied": s.is_applied(),
                "applied_via": applied_via(&s.applied),
                "ahead": s.ahead,
                "behind": s.behind,
                "merged_upstream": s.merged_upstream,
                "dirty": s.dirty,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_listing(staging: &str, statuses: &[status::WorkspaceStatus]) {
    if statuses.is_empty() {
        println!("No workspaces. Create one with `divvy assign <workspace> [paths...]`.");
        return;
    }

    let use_color = styles::colors_enabled();
    println!("Workspaces against '{staging}':");

    let name_width = statuses.iter().map(|s| s.name.len()).max().unwrap_or(0);

    for s in statuses {
        let dirty = if s.dirty { "*" } else { " " };
        let line = format!(
            " {dirty} {:<name_width$}  {}  {}",
            s.name,
            applied_tag(s, use_color),
            detail_column(s, use_color),
        );
        println!("{}", line.trim_end());
    }
}

fn applied_via(applied: &status::Applied) -> &'static str {
    match applied {
        status::Applied::UpToDate => "up-to-date",
        status::Applied::Assigned => "assigned",
        status::Applied::PatchMatched => "patch-match",
        status::Applied::No { .. } => "none",
    }
}

fn applied_tag(s: &status::WorkspaceStatus, use_color: bool) -> String {
    match s.applied {
        status::Applied::No { unmatched } => {
            let text = format!("[not applied: {unmatched}]");
            if use_color {
                format!("{}{text}{}", styles::RED, styles::RESET)
            } else {
                text
            }
        }
        _ => {
            if use_color {
                format!("{}[applied]{}", styles::GREEN, styles::RESET)
            } else {
                "[applied]".to_string()
            }
        }
    }
}

fn detail_column(s: &status::WorkspaceStatus, use_color: bool) -> String {
    let mut parts: Vec<String> = Vec::new();

    if s.unmerged > 0 {
        let word = if s.unmerged == 1 { "commit" } else { "commits" };
        parts.push(format!("{} own {word}", s.unmerged));
    }

    if let Some(tracking) = format_ahead_behind(s.ahead, s.behind, use_color) {
        parts.push(tracking);
    }

    if s.merged_upstream {
        if use_color {
            parts.push(format!("{}[merged]{}", styles::CYAN, styles::RESET));
        } else {
            parts.push("[merged]".to_string());
        }
    }

    parts.join("  ")
}

fn format_ahead_behind(ahead: Option<u32>, behind: Option<u32>, use_color: bool) -> Option<String> {
    let (ahead, behind) = (ahead?, behind?);
    if ahead == 0 && behind == 0 {
        return None;
    }

    let mut parts = Vec::new();
    if ahead > 0 {
        let text = format!("+{ahead}");
        parts.push(if use_color {
            styles::green(&text)
        } else {
            text
        });
    }
    if behind > 0 {
        let text = format!("-{behind}");
        parts.push(if use_color { styles::red(&text) } else { text });
    }

    Some(parts.join(" "))
}
