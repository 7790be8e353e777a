//! Core engines: assignment, apply/unapply, status reconciliation and
//! sync/cleanup.
//!
//! Engines report progress through [`ProgressSink`] instead of printing, so
//! commands, tests and any future frontends can decide how (and whether) to
//! render it.

pub mod apply;
pub mod assign;
pub mod status;
pub mod sync;

use crate::git::GitCommand;
use crate::settings::DivvySettings;
use crate::workspaces;
use anyhow::Result;
use std::path::PathBuf;

/// Trait for core operations to report progress without depending on a
/// particular output implementation.
pub trait ProgressSink {
    /// Report an intermediate step (shown in verbose mode).
    fn on_step(&mut self, msg: &str);

    /// Report a warning (always shown).
    fn on_warning(&mut self, msg: &str);
}

/// A no-op sink that discards all progress messages.
///
/// Useful for tests and contexts where no output is desired.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_step(&mut self, _msg: &str) {}
    fn on_warning(&mut self, _msg: &str) {}
}

/// Sink that forwards progress to the leveled logger.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn on_step(&mut self, msg: &str) {
        crate::log_debug!("{}", msg);
    }

    fn on_warning(&mut self, msg: &str) {
        crate::log_warning!("{}", msg);
    }
}

/// Bundles the state every engine needs: the git wrapper, where the project
/// lives, and where the staging branch is checked out.
pub struct StagingContext {
    pub git: GitCommand,
    pub settings: DivvySettings,
    pub project_root: PathBuf,
    /// Worktree directory with the staging branch checked out. All staging
    /// history mutations run here.
    pub staging_dir: PathBuf,
}

impl StagingContext {
    /// Discover the repository from the current directory and resolve the
    /// staging worktree.
    pub fn open(settings: DivvySettings, quiet: bool) -> Result<Self> {
        let git = GitCommand::new(quiet);
        let project_root = crate::get_project_root()?;
        let staging_dir = workspaces::staging_worktree(&git, &project_root, &settings.staging)?;

        Ok(Self {
            git,
            settings,
            project_root,
            staging_dir,
        })
    }

    /// All workspaces known to the registry.
    pub fn workspaces(&self) -> Result<Vec<workspaces::Workspace>> {
        workspaces::list_workspaces(
            &self.git,
            &self.staging_dir,
            &self.settings.staging,
            &self.settings.integration,
        )
    }

    /// Look up one workspace by name.
    pub fn find_workspace(&self, name: &str) -> Result<Option<workspaces::Workspace>> {
        workspaces::find_workspace(
            &self.git,
            &self.staging_dir,
            &self.settings.staging,
            &self.settings.integration,
            name,
        )
    }
}
