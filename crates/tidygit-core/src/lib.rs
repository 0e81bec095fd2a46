//! tidygit-core: reconciliation engine for repository hygiene
//!
//! This crate holds the git and gh adapters, the interaction seam, and the
//! pass that turns their listings into confirmed removals.

/// Error types for tidygit operations
pub mod error;

/// Configuration handling
pub mod config;

/// Core data types (worktrees, proposals, results)
pub mod types;

/// git subprocess adapter
pub mod git;

/// Pull request lookup through gh
pub mod github;

/// Operator interaction seam
pub mod interaction;

/// Per-repository reconciliation pass
pub mod reconcile;

/// Single and multi-repository runs
pub mod runner;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::{Config, TidyConfig};
pub use error::TidyError;
pub use git::{GitCli, Vcs};
pub use github::{GhCli, PrScope, PrState, PullRequest, PullRequestSource};
pub use interaction::{
    Confirmation, InteractionAdapter, InteractionError, InteractionResult, ProgressHandle,
    ProgressScope,
};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use runner::{Runner, discover_repositories};
pub use types::{PassState, RepositoryResult, RunSummary, Worktree};
