//! GitHub CLI integration
//!
//! PR lookup is enrichment only: a missing, unauthenticated, or failing `gh`
//! yields an empty index. Only a response that cannot be parsed is an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TidyError;

/// Fields requested from `gh pr list --json`
const PR_FIELDS: &str = "headRefName,number,title,url,state";

/// Lifecycle state of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrState {
    Open,
    Merged,
    Closed,
    Other(String),
}

impl From<String> for PrState {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "OPEN" => PrState::Open,
            "MERGED" => PrState::Merged,
            "CLOSED" => PrState::Closed,
            _ => PrState::Other(value),
        }
    }
}

impl From<PrState> for String {
    fn from(state: PrState) -> Self {
        match state {
            PrState::Open => "OPEN".to_string(),
            PrState::Merged => "MERGED".to_string(),
            PrState::Closed => "CLOSED".to_string(),
            PrState::Other(s) => s,
        }
    }
}

impl PrState {
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Merged => write!(f, "merged"),
            PrState::Closed => write!(f, "closed"),
            PrState::Other(s) => write!(f, "{}", s.to_lowercase()),
        }
    }
}

/// Pull request object returned by `gh pr list --json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(rename = "headRefName")]
    pub branch: String,
    pub state: PrState,
}

/// Which pull requests to ask for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrScope {
    /// Open PRs only; every hit suggests keeping the branch
    Open,
    /// Open, merged and closed PRs
    #[default]
    All,
}

/// PRs keyed by source branch
pub type PrIndex = HashMap<String, PullRequest>;

/// Source of pull-request data for a repository
pub trait PullRequestSource {
    fn fetch_pull_requests(&self, scope: PrScope) -> Result<PrIndex, TidyError>;
}

/// Index PRs by source branch; the first PR seen for a branch wins
pub fn index_by_branch(prs: Vec<PullRequest>) -> PrIndex {
    let mut index = PrIndex::with_capacity(prs.len());
    for pr in prs {
        index.entry(pr.branch.clone()).or_insert(pr);
    }
    index
}

/// Parse the JSON array printed by `gh pr list --json ...`
pub fn parse_pr_list(json: &str) -> Result<PrIndex, TidyError> {
    let prs: Vec<PullRequest> =
        serde_json::from_str(json).map_err(|e| TidyError::PrParse(e.to_string()))?;
    Ok(index_by_branch(prs))
}

/// GitHub CLI wrapper bound to one repository
#[derive(Debug, Clone)]
pub struct GhCli {
    repo_root: PathBuf,
    gh_path: String,
    limit: Option<u32>,
}

impl GhCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            gh_path: "gh".to_string(),
            limit: None,
        }
    }

    /// Use a different gh binary
    pub fn with_gh_path(mut self, gh_path: impl Into<String>) -> Self {
        self.gh_path = gh_path.into();
        self
    }

    /// Cap the number of PRs `gh pr list` returns
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.gh_path);
        cmd.current_dir(&self.repo_root);
        cmd
    }

    /// Check if gh CLI is installed
    pub fn is_installed(&self) -> bool {
        self.command()
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Check if gh has a logged-in account
    pub fn is_authenticated(&self) -> bool {
        self.command()
            .args(["auth", "status"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn list_args(&self, scope: PrScope) -> Vec<String> {
        let mut args = vec!["pr".to_string(), "list".to_string()];
        if scope == PrScope::All {
            args.push("--state".to_string());
            args.push("all".to_string());
        }
        if let Some(limit) = self.limit {
            args.push("--limit".to_string());
            args.push(limit.to_string());
        }
        args.push("--json".to_string());
        args.push(PR_FIELDS.to_string());
        args
    }
}

impl PullRequestSource for GhCli {
    fn fetch_pull_requests(&self, scope: PrScope) -> Result<PrIndex, TidyError> {
        if !self.is_installed() {
            debug!("gh not installed; skipping PR lookup");
            return Ok(PrIndex::new());
        }
        if !self.is_authenticated() {
            debug!("gh not authenticated; skipping PR lookup");
            return Ok(PrIndex::new());
        }

        let args = self.list_args(scope);
        debug!(repo = %self.repo_root.display(), ?args, "gh");
        let output = match self.command().args(&args).output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(
                    status = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "gh pr list failed; skipping PR lookup"
                );
                return Ok(PrIndex::new());
            }
            Err(e) => {
                debug!(error = %e, "gh pr list could not run; skipping PR lookup");
                return Ok(PrIndex::new());
            }
        };

        parse_pr_list(&String::from_utf8_lossy(&output.stdout))
    }
}
