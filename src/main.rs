/// divvy - distribute staging work across git worktree workspaces.
///
/// Usable directly (`divvy <command>`) or as a git extension via a
/// `git-divvy` symlink (`git divvy <command>`).
use anyhow::Result;
use divvy::commands;

const USAGE: &str = "\
Usage: divvy <command> [options]

Commands:
  assign     Assign pending staging changes to a workspace
  unassign   Revert assignments made to a workspace
  apply      Cherry-pick a workspace's commits onto the staging branch
  unapply    Revert a workspace's assignment commits on the staging branch
  status     Show per-workspace status against the staging branch
  sync       Merge the integration branch into staging and clean up

Run 'divvy <command> --help' for command details.";

fn main() -> Result<()> {
    divvy::check_dependencies()?;

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(|s| s.as_str()) else {
        println!("{USAGE}");
        return Ok(());
    };

    match command {
        "assign" => commands::assign::run(),
        "unassign" => commands::unassign::run(),
        "apply" => commands::apply::run(),
        "unapply" => commands::unapply::run(),
        "status" => commands::status::run(),
        "sync" => commands::sync::run(),
        "--version" | "-V" => {
            println!("divvy {}", divvy::VERSION);
            Ok(())
        }
        "--help" | "-h" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}
