//! Semantic color theme for consistent terminal output
//!
//! - `accent` => blue, headers and repository names
//! - `success` => green, completed operations and kept counts
//! - `warning` => yellow, warnings and PR titles
//! - `fail` => red, errors and destructive counts
//! - `merged` => magenta, merged pull requests
//! - `dim` => secondary text

use std::sync::LazyLock;

use owo_colors::Style;

use tidygit_core::PrState;

/// Semantic color definitions for terminal output
pub struct SemanticColors {
    pub accent: Style,
    pub success: Style,
    pub warning: Style,
    pub fail: Style,
    pub merged: Style,
    pub dim: Style,
}

impl Default for SemanticColors {
    fn default() -> Self {
        Self {
            accent: Style::new().blue().bold(),
            success: Style::new().green(),
            warning: Style::new().yellow(),
            fail: Style::new().red(),
            merged: Style::new().magenta(),
            dim: Style::new().dimmed(),
        }
    }
}

impl SemanticColors {
    /// Style for a pull request state label
    pub fn pr_state(&self, state: &PrState) -> Style {
        match state {
            PrState::Open => self.success,
            PrState::Merged => self.merged,
            PrState::Closed => self.fail,
            PrState::Other(_) => self.dim,
        }
    }
}

/// Global default theme
pub static COLORS: LazyLock<SemanticColors> = LazyLock::new(SemanticColors::default);
