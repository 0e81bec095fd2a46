//! Reconciliation engine
//!
//! Drives one repository through the pass described by [`PassState`]:
//! sync the default branch, look up PRs, then offer each linked worktree and
//! each remaining local branch for removal. Failures are recorded on the
//! [`RepositoryResult`] and the pass keeps going; an operator abort stops it
//! where it stands without undoing anything already applied.

use std::collections::HashSet;
use std::ops::ControlFlow;

use tracing::{debug, info};

use crate::git::Vcs;
use crate::github::{PrIndex, PrScope, PullRequest, PullRequestSource};
use crate::interaction::{Confirmation, InteractionAdapter, ProgressScope};
use crate::types::{PassState, Proposal, RepositoryResult, Subject, Worktree};

pub const REMOVE_WORKTREE: &str = "Remove worktree?";
pub const REMOVE_WORKTREE_AND_BRANCH: &str = "Remove worktree and delete branch?";
pub const DELETE_BRANCH: &str = "Delete branch?";
pub const RESET_PROMPT: &str = "Reset HEAD and discard all changes?";

/// Knobs that select between the historical workflow variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Ask for merged and closed PRs too, not only open ones
    pub pr_scope: PrScope,
    /// Delete a worktree's branch together with the worktree, and keep it
    /// out of the standalone branch review
    pub track_worktree_overlap: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            pr_scope: PrScope::All,
            track_worktree_overlap: true,
        }
    }
}

/// Pre-selected answer: remove only when a PR exists and is no longer open
pub fn suggested_default(pr: Option<&PullRequest>) -> bool {
    pr.is_some_and(|pr| !pr.state.is_open())
}

/// One proposal per worktree, in listing order
///
/// `branches` is the non-default local branch list; a worktree whose branch
/// is in it gets the cascading title when overlap tracking is on.
pub fn plan_worktree_proposals(
    worktrees: &[Worktree],
    branches: &[String],
    prs: &PrIndex,
    track_overlap: bool,
) -> Vec<Proposal> {
    let branch_set: HashSet<&str> = branches.iter().map(String::as_str).collect();

    worktrees
        .iter()
        .map(|wt| {
            let cascade_branch = track_overlap
                && wt
                    .branch_name()
                    .is_some_and(|branch| branch_set.contains(branch));
            let pull_request = wt.branch_name().and_then(|b| prs.get(b)).cloned();
            let title = if cascade_branch {
                REMOVE_WORKTREE_AND_BRANCH
            } else {
                REMOVE_WORKTREE
            };

            Proposal {
                suggested: suggested_default(pull_request.as_ref()),
                subject: Subject::Worktree {
                    worktree: wt.clone(),
                    cascade_branch,
                },
                pull_request,
                title: title.to_string(),
            }
        })
        .collect()
}

/// Branches left for standalone review: listing order, minus the default
/// branch and anything already resolved during worktree review
pub fn remaining_branches(
    branches: &[String],
    default_branch: Option<&str>,
    resolved: &HashSet<String>,
) -> Vec<String> {
    branches
        .iter()
        .filter(|b| Some(b.as_str()) != default_branch)
        .filter(|b| !resolved.contains(*b))
        .cloned()
        .collect()
}

/// One proposal per branch, in the given order
pub fn plan_branch_proposals(branches: &[String], prs: &PrIndex) -> Vec<Proposal> {
    branches
        .iter()
        .map(|branch| {
            let pull_request = prs.get(branch).cloned();
            Proposal {
                suggested: suggested_default(pull_request.as_ref()),
                subject: Subject::Branch(branch.clone()),
                pull_request,
                title: DELETE_BRANCH.to_string(),
            }
        })
        .collect()
}

/// One reconciliation pass over one repository
pub struct Reconciler<'a> {
    git: &'a dyn Vcs,
    prs: &'a dyn PullRequestSource,
    ui: &'a dyn InteractionAdapter,
    options: ReconcileOptions,
    progress: Option<ProgressScope<'a>>,
    show_banner: bool,
    state: PassState,
    result: RepositoryResult,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        name: impl Into<String>,
        git: &'a dyn Vcs,
        prs: &'a dyn PullRequestSource,
        ui: &'a dyn InteractionAdapter,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            git,
            prs,
            ui,
            options,
            progress: None,
            show_banner: false,
            state: PassState::Init,
            result: RepositoryResult::new(name),
        }
    }

    /// Repository progress line to stop before the first prompt
    pub fn with_progress(mut self, progress: ProgressScope<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Print the banner once the default branch is known
    pub fn with_banner(mut self, show_banner: bool) -> Self {
        self.show_banner = show_banner;
        self
    }

    /// Run the pass to `Done` or `Aborted` and hand back the result
    pub fn run(mut self) -> RepositoryResult {
        let flow = self.drive();
        self.stop_progress();

        if flow.is_break() {
            self.enter(PassState::Aborted);
            self.result.aborted = true;
            info!(repo = %self.result.name, "pass aborted by operator");
        } else {
            self.enter(PassState::Done);
            self.ui.print_done();
        }

        debug_assert!(self.state.is_terminal());
        self.result
    }

    fn drive(&mut self) -> ControlFlow<()> {
        let default_branch = self.detect_default_branch();

        self.enter(PassState::DirtyCheck);
        self.offer_reset()?;

        self.enter(PassState::BranchSwitch);
        let on_default = self.switch_to_default(default_branch.as_deref());

        self.enter(PassState::Fetch);
        self.fetch();

        self.enter(PassState::Pull);
        if let (true, Some(branch)) = (on_default, default_branch.as_deref()) {
            self.pull(branch);
        }

        self.enter(PassState::PrFetch);
        let prs = self.fetch_pull_requests();

        self.enter(PassState::WorktreeReview);
        let branches = self.list_branches(default_branch.as_deref());
        let resolved = self.review_worktrees(&branches, &prs)?;

        self.enter(PassState::BranchReview);
        let remaining = remaining_branches(&branches, default_branch.as_deref(), &resolved);
        self.review_branches(&remaining, &prs)
    }

    fn enter(&mut self, state: PassState) {
        debug_assert!(
            self.state.next() == Some(state)
                || (state == PassState::Aborted && self.state.can_abort()),
            "illegal transition {} -> {}",
            self.state,
            state
        );
        debug!(repo = %self.result.name, from = %self.state, to = %state, "pass state");
        self.state = state;
    }

    fn stop_progress(&mut self) {
        if let Some(mut progress) = self.progress.take() {
            progress.stop();
        }
    }

    /// Record a non-fatal failure and show it right away
    fn record(&mut self, message: String) {
        self.ui.print_error(&message);
        self.result.errors.push(message);
    }

    /// Ask the operator. `Continue(None)` means the prompt itself failed and
    /// the failure has been recorded under `context`.
    fn confirm(
        &mut self,
        title: &str,
        default: bool,
        context: &str,
    ) -> ControlFlow<(), Option<bool>> {
        self.stop_progress();

        match self.ui.ask_confirm(title, default) {
            Ok(Confirmation::Accepted) => ControlFlow::Continue(Some(true)),
            Ok(Confirmation::Declined) => ControlFlow::Continue(Some(false)),
            Ok(Confirmation::Aborted) => ControlFlow::Break(()),
            Err(e) => {
                self.record(format!("{}: {}", context, e));
                ControlFlow::Continue(None)
            }
        }
    }

    fn detect_default_branch(&mut self) -> Option<String> {
        let default_branch = match self.git.detect_default_branch() {
            Ok(branch) => Some(branch),
            Err(e) => {
                self.record(format!("detecting default branch: {}", e));
                None
            }
        };
        self.result.default_branch = default_branch.clone();

        if self.show_banner {
            self.ui.show_banner();
        }
        match &default_branch {
            Some(branch) => self
                .ui
                .print_header(&format!("{} ({})", self.result.name, branch)),
            None => self.ui.print_header(&self.result.name.clone()),
        }

        default_branch
    }

    fn offer_reset(&mut self) -> ControlFlow<()> {
        if !self.git.has_uncommitted_changes() {
            return ControlFlow::Continue(());
        }

        self.ui.print_warning("Uncommitted changes detected");
        match self.confirm(RESET_PROMPT, false, "prompting for reset")? {
            None => {}
            Some(false) => self.ui.print_skipped(),
            Some(true) => match self.git.reset_hard() {
                Ok(()) => self.ui.print_success("Reset to HEAD"),
                Err(e) => self.record(e.to_string()),
            },
        }
        ControlFlow::Continue(())
    }

    fn switch_to_default(&mut self, default_branch: Option<&str>) -> bool {
        let Some(branch) = default_branch else {
            return false;
        };

        match self.git.switch_to(branch) {
            Ok(()) => {
                self.ui.print_success(&format!("Switched to {}", branch));
                true
            }
            Err(e) => {
                self.record(e.to_string());
                false
            }
        }
    }

    fn fetch(&mut self) {
        let mut spinner = ProgressScope::start(self.ui, "Fetching");
        let fetched = self.git.fetch_all_pruned();
        spinner.stop();

        match fetched {
            Ok(()) => self.ui.print_success("Fetched (pruned remotes)"),
            Err(e) => self.record(e.to_string()),
        }
    }

    fn pull(&mut self, branch: &str) {
        match self.git.pull_rebase(branch) {
            Ok(()) => self.ui.print_success(&format!("Pulled {} (rebase)", branch)),
            Err(e) => self.record(format!("pulling {}: {}", branch, e)),
        }
    }

    fn fetch_pull_requests(&mut self) -> PrIndex {
        let mut spinner = ProgressScope::start(self.ui, "Checking PRs");
        let fetched = self.prs.fetch_pull_requests(self.options.pr_scope);
        spinner.stop();

        match fetched {
            Ok(prs) => {
                self.result.prs_found = prs.len();
                self.result.prs_open = prs.values().filter(|pr| pr.state.is_open()).count();
                if !prs.is_empty() {
                    self.ui.print_success(&format!("Found {} PR(s)", prs.len()));
                }
                prs
            }
            Err(e) => {
                self.record(format!("fetching PRs: {}", e));
                PrIndex::new()
            }
        }
    }

    fn list_branches(&mut self, default_branch: Option<&str>) -> Vec<String> {
        match self.git.list_branches(default_branch) {
            Ok(branches) => {
                self.result.branches_total = branches.len();
                branches
            }
            Err(e) => {
                self.record(e.to_string());
                Vec::new()
            }
        }
    }

    /// Offer every linked worktree; returns the branches settled along the way
    fn review_worktrees(
        &mut self,
        branches: &[String],
        prs: &PrIndex,
    ) -> ControlFlow<(), HashSet<String>> {
        let mut resolved = HashSet::new();

        if let Err(e) = self.git.prune_worktrees() {
            self.record(e.to_string());
        }

        let worktrees = match self.git.list_worktrees() {
            Ok(worktrees) => worktrees,
            Err(e) => {
                self.record(e.to_string());
                return ControlFlow::Continue(resolved);
            }
        };

        self.result.worktrees_total = worktrees.len();
        if worktrees.is_empty() {
            self.ui.print_note("No worktrees to clean up");
            return ControlFlow::Continue(resolved);
        }

        self.stop_progress();
        self.ui.print_header(&format!("Worktrees ({})", worktrees.len()));

        let proposals = plan_worktree_proposals(
            &worktrees,
            branches,
            prs,
            self.options.track_worktree_overlap,
        );

        for proposal in proposals {
            let Subject::Worktree {
                worktree,
                cascade_branch,
            } = &proposal.subject
            else {
                continue;
            };

            debug!(
                branch = ?proposal.subject.branch(),
                suggested = proposal.suggested,
                "worktree proposal"
            );
            match worktree.branch_name() {
                Some(branch) => self.ui.print_item(&format!(
                    "{} (branch: {})",
                    worktree.path.display(),
                    branch
                )),
                None => self.ui.print_item(&worktree.path.display().to_string()),
            }
            if let Some(pr) = &proposal.pull_request {
                self.ui.print_pull_request(pr);
            }

            let answer = self.confirm(
                &proposal.title,
                proposal.suggested,
                "prompting for worktree removal",
            )?;
            let cascade = cascade_branch.then(|| worktree.branch_name()).flatten();

            match answer {
                None => continue,
                Some(true) => {
                    let removed = match self.git.remove_worktree(&worktree.path) {
                        Ok(()) => {
                            self.ui.print_success("Removed worktree");
                            self.result.worktrees_removed += 1;
                            true
                        }
                        Err(e) => {
                            self.record(e.to_string());
                            false
                        }
                    };

                    if let Some(branch) = cascade {
                        // A branch still checked out somewhere cannot be deleted
                        if removed {
                            match self.git.delete_branch(branch) {
                                Ok(()) => {
                                    self.ui
                                        .print_success(&format!("Deleted branch {}", branch));
                                    self.result.branches_deleted += 1;
                                    resolved.insert(branch.to_string());
                                }
                                Err(e) => self.record(e.to_string()),
                            }
                        } else {
                            resolved.insert(branch.to_string());
                        }
                    }
                }
                Some(false) => {
                    self.ui.print_skipped();
                    self.result.worktrees_skipped += 1;
                    if let Some(branch) = cascade {
                        resolved.insert(branch.to_string());
                    }
                }
            }
            self.ui.print_info("");
        }

        ControlFlow::Continue(resolved)
    }

    fn review_branches(&mut self, branches: &[String], prs: &PrIndex) -> ControlFlow<()> {
        if branches.is_empty() {
            self.ui.print_note("No branches to clean up");
            return ControlFlow::Continue(());
        }

        self.stop_progress();
        self.ui.print_header(&format!("Branches ({})", branches.len()));

        for proposal in plan_branch_proposals(branches, prs) {
            let Subject::Branch(branch) = &proposal.subject else {
                continue;
            };

            debug!(
                branch = ?proposal.subject.branch(),
                suggested = proposal.suggested,
                "branch proposal"
            );
            self.ui.print_item(branch);
            if let Some(pr) = &proposal.pull_request {
                self.ui.print_pull_request(pr);
            }

            match self.confirm(
                &proposal.title,
                proposal.suggested,
                "prompting for branch deletion",
            )? {
                None => continue,
                Some(true) => match self.git.delete_branch(branch) {
                    Ok(()) => {
                        self.ui.print_success("Deleted");
                        self.result.branches_deleted += 1;
                    }
                    Err(e) => self.record(e.to_string()),
                },
                Some(false) => {
                    self.ui.print_skipped();
                    self.result.branches_skipped += 1;
                }
            }
            self.ui.print_info("");
        }

        ControlFlow::Continue(())
    }
}
