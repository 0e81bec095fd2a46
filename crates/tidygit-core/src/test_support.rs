//! In-memory doubles for the git, gh, and terminal seams

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::TidyError;
use crate::git::Vcs;
use crate::github::{PrIndex, PrScope, PrState, PullRequest, PullRequestSource};
use crate::interaction::{
    Confirmation, InteractionAdapter, InteractionError, InteractionResult, ProgressHandle,
};
use crate::types::Worktree;

pub fn worktree(path: &str, branch: Option<&str>) -> Worktree {
    Worktree {
        path: PathBuf::from(path),
        branch: branch.map(str::to_string),
    }
}

pub fn pull_request(number: u64, branch: &str, state: PrState) -> PullRequest {
    PullRequest {
        number,
        title: format!("Change on {}", branch),
        url: format!("https://github.com/acme/widgets/pull/{}", number),
        branch: branch.to_string(),
        state,
    }
}

/// Git double: canned listings, optional failures, and a call log
pub struct MockVcs {
    pub default_branch: Option<String>,
    pub dirty: bool,
    pub worktrees: Vec<Worktree>,
    pub branches: Vec<String>,
    /// Operation names (`switch`, `fetch`, `delete_branch`, ...) that fail
    pub failing: HashSet<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self {
            default_branch: Some("main".to_string()),
            dirty: false,
            worktrees: Vec::new(),
            branches: vec!["main".to_string()],
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_branches(mut self, branches: &[&str]) -> Self {
        self.branches = branches.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn with_worktrees(mut self, worktrees: Vec<Worktree>) -> Self {
        self.worktrees = worktrees;
        self
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    fn log(&self, operation: &'static str, call: String) -> Result<(), TidyError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(operation) {
            Err(TidyError::git(operation, "mock failure"))
        } else {
            Ok(())
        }
    }
}

impl Vcs for MockVcs {
    fn detect_default_branch(&self) -> Result<String, TidyError> {
        self.calls.lock().unwrap().push("detect_default_branch".to_string());
        self.default_branch
            .clone()
            .ok_or_else(|| TidyError::git("getting default branch", "no HEAD branch"))
    }

    fn has_uncommitted_changes(&self) -> bool {
        self.dirty
    }

    fn reset_hard(&self) -> Result<(), TidyError> {
        self.log("reset", "reset_hard".to_string())
    }

    fn switch_to(&self, branch: &str) -> Result<(), TidyError> {
        self.log("switch", format!("switch {}", branch))
    }

    fn fetch_all_pruned(&self) -> Result<(), TidyError> {
        self.log("fetch", "fetch".to_string())
    }

    fn pull_rebase(&self, branch: &str) -> Result<(), TidyError> {
        self.log("pull", format!("pull {}", branch))
    }

    fn prune_worktrees(&self) -> Result<(), TidyError> {
        self.log("prune", "prune".to_string())
    }

    fn list_worktrees(&self) -> Result<Vec<Worktree>, TidyError> {
        self.log("list_worktrees", "list_worktrees".to_string())?;
        Ok(self.worktrees.clone())
    }

    fn list_branches(&self, excluding: Option<&str>) -> Result<Vec<String>, TidyError> {
        self.log("list_branches", "list_branches".to_string())?;
        Ok(self
            .branches
            .iter()
            .filter(|b| Some(b.as_str()) != excluding)
            .cloned()
            .collect())
    }

    fn remove_worktree(&self, path: &Path) -> Result<(), TidyError> {
        self.log("remove_worktree", format!("remove_worktree {}", path.display()))
    }

    fn delete_branch(&self, name: &str) -> Result<(), TidyError> {
        self.log("delete_branch", format!("delete_branch {}", name))
    }
}

/// gh double returning a fixed index, or a parse failure
pub struct MockPrs {
    pub prs: Vec<PullRequest>,
    pub fail: bool,
    scopes: Mutex<Vec<PrScope>>,
}

impl MockPrs {
    pub fn new(prs: Vec<PullRequest>) -> Self {
        Self {
            prs,
            fail: false,
            scopes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            prs: Vec::new(),
            fail: true,
            scopes: Mutex::new(Vec::new()),
        }
    }

    pub fn scopes(&self) -> Vec<PrScope> {
        self.scopes.lock().unwrap().clone()
    }
}

impl PullRequestSource for MockPrs {
    fn fetch_pull_requests(&self, scope: PrScope) -> Result<PrIndex, TidyError> {
        self.scopes.lock().unwrap().push(scope);
        if self.fail {
            return Err(TidyError::PrParse("unexpected token".to_string()));
        }
        Ok(crate::github::index_by_branch(self.prs.clone()))
    }
}

/// Terminal double: answers prompts from a script and records everything
pub struct ScriptedAdapter {
    progress_counter: AtomicU64,
    answers: Mutex<Vec<InteractionResult<Confirmation>>>,
    answer_index: AtomicUsize,
    /// `(title, default)` for every prompt shown
    prompts: Mutex<Vec<(String, bool)>>,
    /// Ordered log of prompts, spinner stops, and printed lines
    events: Mutex<Vec<String>>,
    resets: AtomicUsize,
    /// Report a stop request once this many passes have started
    stop_after: Option<usize>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self {
            progress_counter: AtomicU64::new(0),
            answers: Mutex::new(Vec::new()),
            answer_index: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            resets: AtomicUsize::new(0),
            stop_after: None,
        }
    }

    pub fn with_answers(self, answers: Vec<Confirmation>) -> Self {
        *self.answers.lock().unwrap() = answers.into_iter().map(Ok).collect();
        self
    }

    pub fn with_results(self, answers: Vec<InteractionResult<Confirmation>>) -> Self {
        *self.answers.lock().unwrap() = answers;
        self
    }

    pub fn with_stop_after(mut self, passes: usize) -> Self {
        self.stop_after = Some(passes);
        self
    }

    pub fn non_tty() -> Self {
        let adapter = Self::new();
        *adapter.answers.lock().unwrap() = vec![Err(InteractionError::NonTty); 16];
        adapter
    }

    pub fn prompts(&self) -> Vec<(String, bool)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.events().iter().any(|e| e.contains(needle))
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl InteractionAdapter for ScriptedAdapter {
    /// Unscripted prompts take the default
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<Confirmation> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), default));
        self.push(format!("ask: {}", prompt));

        let answers = self.answers.lock().unwrap();
        let index = self.answer_index.fetch_add(1, Ordering::SeqCst);
        match answers.get(index) {
            Some(answer) => answer.clone(),
            None => Ok(Confirmation::from_answer(default)),
        }
    }

    fn start_progress(&self, message: &str) -> ProgressHandle {
        let id = self.progress_counter.fetch_add(1, Ordering::SeqCst);
        self.push(format!("start: {}", message));
        ProgressHandle::new(id, message)
    }

    fn start_repository_progress(
        &self,
        current: usize,
        total: usize,
        name: &str,
    ) -> ProgressHandle {
        self.start_progress(&format!("[{}/{}] {}", current, total, name))
    }

    fn end_progress(&self, handle: ProgressHandle) {
        self.push(format!("end: {}", handle.message()));
    }

    fn reset_abort(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_requested(&self) -> bool {
        self.stop_after.is_some_and(|n| self.resets() >= n)
    }

    fn show_banner(&self) {
        self.push("banner".to_string());
    }

    fn clear_screen(&self) {
        self.push("clear".to_string());
    }

    fn print_header(&self, message: &str) {
        self.push(format!("header: {}", message));
    }

    fn print_info(&self, message: &str) {
        self.push(format!("info: {}", message));
    }

    fn print_note(&self, message: &str) {
        self.push(format!("note: {}", message));
    }

    fn print_success(&self, message: &str) {
        self.push(format!("ok: {}", message));
    }

    fn print_warning(&self, message: &str) {
        self.push(format!("warn: {}", message));
    }

    fn print_error(&self, message: &str) {
        self.push(format!("error: {}", message));
    }

    fn print_item(&self, message: &str) {
        self.push(format!("item: {}", message));
    }

    fn print_pull_request(&self, pr: &PullRequest) {
        self.push(format!("pr: #{} {}", pr.number, pr.state));
    }

    fn print_skipped(&self) {
        self.push("skipped".to_string());
    }

    fn print_done(&self) {
        self.push("done".to_string());
    }
}
