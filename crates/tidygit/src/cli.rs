//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// tidygit - Interactive cleanup of stale worktrees and branches
#[derive(Parser, Debug)]
#[command(name = "tidygit")]
#[command(version = VERSION)]
#[command(about = "Interactively prune stale worktrees and merged branches")]
#[command(long_about = "tidygit switches a repository to its default branch, syncs it, and walks \
through every linked worktree and local branch asking whether to remove it.\n\nThe suggested \
answer is Yes only when the branch has a merged or closed pull request. Esc, q or Ctrl+C stops \
the current repository.\n\nWithout a subcommand the current directory is cleaned.")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON after the run
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to $TIDYGIT_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only look up open pull requests
    #[arg(long, global = true)]
    pub open_prs_only: bool,

    /// Review a worktree's branch separately instead of deleting it with the worktree
    #[arg(long, global = true)]
    pub no_overlap: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean every git repository directly inside a directory
    ///
    /// Each repository gets its own screen; a summary box follows the last one.
    All {
        /// Directory holding the repositories
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}
