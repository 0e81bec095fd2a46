//! Brand banner for tidygit
//!
//! Shown above the single-repository run, on every multi-repository screen,
//! and above the final summary.

use owo_colors::OwoColorize;

use crate::colors::COLORS;

const NAME: &str = "git tidy";
const BYLINE: &str = "worktree & branch cleanup";

/// Plain banner text, for non-terminal output
fn plain_banner() -> String {
    format!("  {} v{}", NAME, env!("CARGO_PKG_VERSION"))
}

/// Banner text; the styled form carries a blank line above it
pub fn banner(colored: bool) -> String {
    if !colored {
        return plain_banner();
    }
    format!("\n  {} {}", NAME.style(COLORS.accent), BYLINE.style(COLORS.dim))
}
