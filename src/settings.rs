//! Git config-based settings for divvy.
//!
//! This module provides user-configurable options via `git config`.
//! Settings are loaded from git's layered config system (local → global)
//! with built-in defaults as fallback.
//!
//! # Config Keys
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `divvy.staging` | `"staging"` | Name of the staging branch |
//! | `divvy.integration` | `"main"` | Integration branch that `sync` merges from |
//! | `divvy.remote` | `"origin"` | Default remote name |
//! | `divvy.patchWindow` | `200` | Staging commits scanned for patch-identity matches |
//!
//! # Example
//!
//! ```bash
//! # Use a different staging branch for this repository
//! git config divvy.staging incoming
//!
//! # Merge from a release branch instead of main
//! git config divvy.integration release/next
//! ```

use crate::git::GitCommand;
use anyhow::Result;

/// Default values for settings.
pub mod defaults {
    /// Default value for the staging branch name.
    pub const STAGING: &str = "staging";

    /// Default value for the integration branch name.
    pub const INTEGRATION: &str = "main";

    /// Default value for the remote name.
    pub const REMOTE: &str = "origin";

    /// Default value for the patch-identity scan window.
    pub const PATCH_WINDOW: u32 = 200;
}

/// Settings resolved from git config with defaults applied.
#[derive(Debug, Clone)]
pub struct DivvySettings {
    /// Name of the staging branch (`divvy.staging`).
    pub staging: String,
    /// Integration branch that `sync` merges from (`divvy.integration`).
    pub integration: String,
    /// Remote name (`divvy.remote`).
    pub remote: String,
    /// How many recent staging commits to scan for patch-identity matches
    /// (`divvy.patchWindow`).
    pub patch_window: u32,
}

impl Default for DivvySettings {
    fn default() -> Self {
        Self {
            staging: defaults::STAGING.to_string(),
            integration: defaults::INTEGRATION.to_string(),
            remote: defaults::REMOTE.to_string(),
            patch_window: defaults::PATCH_WINDOW,
        }
    }
}

impl DivvySettings {
    /// Load settings from git config, falling back to defaults for unset
    /// or unparseable keys.
    pub fn load() -> Result<Self> {
        let git = GitCommand::new(true);

        let staging = git
            .config_get("divvy.staging")?
            .unwrap_or_else(|| defaults::STAGING.to_string());
        let integration = git
            .config_get("divvy.integration")?
            .unwrap_or_else(|| defaults::INTEGRATION.to_string());
        let remote = git
            .config_get("divvy.remote")?
            .unwrap_or_else(|| defaults::REMOTE.to_string());
        let patch_window = git
            .config_get("divvy.patchWindow")?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::PATCH_WINDOW);

        Ok(Self {
            staging,
            integration,
            remote,
            patch_window,
        })
    }
}
