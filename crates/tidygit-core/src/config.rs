//! Configuration handling for tidygit
//!
//! Settings come from an optional TOML file:
//!
//! ```toml
//! [tidygit]
//! pr_scope = "all"            # or "open"
//! track_worktree_overlap = true
//! remote = "origin"
//! git = "git"
//! gh = "gh"
//! pr_limit = 200
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TidyError;
use crate::github::PrScope;
use crate::reconcile::ReconcileOptions;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TIDYGIT_CONFIG";

/// Tidygit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Tidygit-specific settings
    #[serde(default)]
    pub tidygit: TidyConfig,
}

/// Core tidygit settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TidyConfig {
    /// Which PR states to look up
    #[serde(default)]
    pub pr_scope: PrScope,

    /// Delete a worktree's branch along with it
    #[serde(default = "default_true")]
    pub track_worktree_overlap: bool,

    /// Remote used for default-branch detection and pulls
    #[serde(default = "default_remote")]
    pub remote: String,

    /// git binary
    #[serde(default = "default_git")]
    pub git: String,

    /// gh binary
    #[serde(default = "default_gh")]
    pub gh: String,

    /// `--limit` for `gh pr list`; gh's own default when unset
    #[serde(default)]
    pub pr_limit: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_gh() -> String {
    "gh".to_string()
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            pr_scope: PrScope::default(),
            track_worktree_overlap: default_true(),
            remote: default_remote(),
            git: default_git(),
            gh: default_gh(),
            pr_limit: None,
        }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, TidyError> {
        toml::from_str(content).map_err(|e| TidyError::Config(e.to_string()))
    }

    /// `<config dir>/tidygit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tidygit").join("config.toml"))
    }

    /// Load from `explicit`, else `$TIDYGIT_CONFIG`, else the default path.
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, TidyError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_file(&path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self, TidyError> {
        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path)
            .map_err(|e| TidyError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| TidyError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Engine options derived from the settings
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            pr_scope: self.tidygit.pr_scope,
            track_worktree_overlap: self.tidygit.track_worktree_overlap,
        }
    }
}
