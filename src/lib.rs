use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use which::which;

pub mod commands;
pub mod core;
pub mod git;
pub mod logging;
pub mod settings;
pub mod styles;
pub mod trailer;
pub mod workspaces;

/// Version string shown by `divvy --version` (includes dev metadata on
/// non-release builds).
pub const VERSION: &str = env!("DIVVY_VERSION_DISPLAY");

pub fn is_git_repository() -> Result<bool> {
    let output = Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("Failed to check if inside Git repository")?;

    Ok(output.success())
}

pub fn get_git_common_dir() -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--path-format=absolute", "--git-common-dir"])
        .output()
        .context("Failed to get git common directory")?;

    if !output.status.success() {
        anyhow::bail!("Not inside a Git repository");
    }

    let path_str = String::from_utf8(output.stdout)
        .context("Failed to parse git common directory output")?
        .trim()
        .to_string();

    Ok(PathBuf::from(path_str))
}

/// The directory that contains the repository's git dir. Worktree-based
/// workspaces live under `<project root>/.divvy/`.
pub fn get_project_root() -> Result<PathBuf> {
    let git_common_dir = get_git_common_dir()?;
    let project_root = git_common_dir
        .parent()
        .context("Failed to determine project root directory")?;
    Ok(project_root.to_path_buf())
}

/// Rebuild argv for a subcommand so clap sees `<name> <flags...>` instead of
/// `divvy <name> <flags...>`.
pub fn get_clap_args(command_name: &str) -> Vec<String> {
    std::iter::once(command_name.to_string())
        .chain(std::env::args().skip(2))
        .collect()
}

pub fn check_dependencies() -> Result<()> {
    if which("git").is_err() {
        anyhow::bail!("Missing required dependency: git");
    }

    Ok(())
}
