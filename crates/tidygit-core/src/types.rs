//! Core data types: worktrees, proposals, per-repository results

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::github::PullRequest;

/// A linked worktree as reported by `git worktree list --porcelain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worktree {
    /// Absolute checkout path
    pub path: PathBuf,
    /// Checked-out branch; `None` for detached or bare entries
    pub branch: Option<String>,
}

impl Worktree {
    pub fn branch_name(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

/// What a proposal would act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Remove a worktree; with `cascade_branch` its branch is deleted too
    Worktree {
        worktree: Worktree,
        cascade_branch: bool,
    },
    /// Delete a standalone local branch
    Branch(String),
}

impl Subject {
    /// Branch the subject is associated with, used for PR lookup
    pub fn branch(&self) -> Option<&str> {
        match self {
            Subject::Worktree { worktree, .. } => worktree.branch_name(),
            Subject::Branch(name) => Some(name),
        }
    }
}

/// One decision to put in front of the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub subject: Subject,
    /// PR whose source branch matches the subject's branch
    pub pull_request: Option<PullRequest>,
    /// Pre-selected answer in the confirmation prompt
    pub suggested: bool,
    /// Prompt title
    pub title: String,
}

/// Reconciliation pass state per repository
///
/// Flow: Init -> DirtyCheck -> BranchSwitch -> Fetch -> Pull -> PrFetch ->
/// WorktreeReview -> BranchReview -> Done, with Aborted reachable from the
/// prompting states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    Init,
    DirtyCheck,
    BranchSwitch,
    Fetch,
    Pull,
    PrFetch,
    WorktreeReview,
    BranchReview,
    Done,
    Aborted,
}

impl PassState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PassState::Done | PassState::Aborted)
    }

    /// Get the next state in the normal flow
    pub fn next(&self) -> Option<PassState> {
        match self {
            PassState::Init => Some(PassState::DirtyCheck),
            PassState::DirtyCheck => Some(PassState::BranchSwitch),
            PassState::BranchSwitch => Some(PassState::Fetch),
            PassState::Fetch => Some(PassState::Pull),
            PassState::Pull => Some(PassState::PrFetch),
            PassState::PrFetch => Some(PassState::WorktreeReview),
            PassState::WorktreeReview => Some(PassState::BranchReview),
            PassState::BranchReview => Some(PassState::Done),
            PassState::Done | PassState::Aborted => None,
        }
    }

    /// Whether an operator abort may happen in this state
    pub fn can_abort(&self) -> bool {
        matches!(
            self,
            PassState::DirtyCheck | PassState::WorktreeReview | PassState::BranchReview
        )
    }
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PassState::Init => "init",
            PassState::DirtyCheck => "dirty-check",
            PassState::BranchSwitch => "branch-switch",
            PassState::Fetch => "fetch",
            PassState::Pull => "pull",
            PassState::PrFetch => "pr-fetch",
            PassState::WorktreeReview => "worktree-review",
            PassState::BranchReview => "branch-review",
            PassState::Done => "done",
            PassState::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryResult {
    /// Directory name of the repository
    pub name: String,
    /// Branch the remote's HEAD points to, if it could be detected
    pub default_branch: Option<String>,
    pub worktrees_total: usize,
    pub worktrees_removed: usize,
    pub worktrees_skipped: usize,
    /// Non-default local branches present at the start of the pass
    pub branches_total: usize,
    /// Deleted with their worktree or on their own
    pub branches_deleted: usize,
    /// Skipped during standalone branch review
    pub branches_skipped: usize,
    pub prs_found: usize,
    pub prs_open: usize,
    /// The operator cut the pass short
    pub aborted: bool,
    /// Recorded, non-fatal failures in the order they happened
    pub errors: Vec<String>,
}

impl RepositoryResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A result that ended before any git command ran
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            errors: vec![error.into()],
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Totals across every repository of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub repos: usize,
    pub repos_clean: usize,
    pub repos_with_errors: usize,
    pub worktrees_total: usize,
    pub worktrees_removed: usize,
    pub worktrees_kept: usize,
    pub branches_total: usize,
    pub branches_deleted: usize,
    pub branches_kept: usize,
    pub prs_found: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RepositoryResult]) -> Self {
        let mut summary = RunSummary::default();
        for r in results {
            summary.repos += 1;
            if r.has_errors() {
                summary.repos_with_errors += 1;
            } else {
                summary.repos_clean += 1;
            }
            summary.worktrees_total += r.worktrees_total;
            summary.worktrees_removed += r.worktrees_removed;
            summary.worktrees_kept += r.worktrees_skipped;
            summary.branches_total += r.branches_total;
            summary.branches_deleted += r.branches_deleted;
            summary.branches_kept += r.branches_skipped;
            summary.prs_found += r.prs_found;
            summary.errors += r.errors.len();
        }
        summary
    }

    /// Worktrees still present after the run
    pub fn worktrees_active(&self) -> usize {
        self.worktrees_total.saturating_sub(self.worktrees_removed)
    }

    /// Branches still present after the run
    pub fn branches_active(&self) -> usize {
        self.branches_total.saturating_sub(self.branches_deleted)
    }
}
