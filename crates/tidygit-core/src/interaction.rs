//! Operator interaction seam
//!
//! The engine talks to the terminal only through `InteractionAdapter`: a
//! yes/no confirmation gate plus the progress and reporting calls around it.
//! The binary provides the terminal implementation; tests provide scripted ones.

use thiserror::Error;

use crate::github::PullRequest;

/// Answer from the confirmation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
    /// The operator cancelled; the current repository pass must stop
    Aborted,
}

impl Confirmation {
    pub fn from_answer(answer: bool) -> Self {
        if answer {
            Confirmation::Accepted
        } else {
            Confirmation::Declined
        }
    }
}

/// Failure to put a prompt in front of the operator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// stdin is not a terminal
    #[error("cannot prompt: stdin is not a terminal")]
    NonTty,

    /// Terminal IO failed while prompting
    #[error("terminal IO failed: {0}")]
    Io(String),
}

pub type InteractionResult<T> = Result<T, InteractionError>;

/// Handle to a running spinner
#[derive(Debug, PartialEq, Eq)]
pub struct ProgressHandle {
    id: u64,
    message: String,
}

impl ProgressHandle {
    pub fn new(id: u64, message: &str) -> Self {
        Self {
            id,
            message: message.to_string(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Terminal-facing collaborator of the reconciliation engine
pub trait InteractionAdapter {
    /// Binary choice with a pre-selected default
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<Confirmation>;

    /// Start a transient spinner
    fn start_progress(&self, message: &str) -> ProgressHandle;

    /// Start the `[current/total] repo` line shown while a repository runs
    fn start_repository_progress(&self, current: usize, total: usize, name: &str)
    -> ProgressHandle;

    /// Stop a spinner started by either `start_*` method
    fn end_progress(&self, handle: ProgressHandle);

    /// Forget an abort requested during a previous repository
    fn reset_abort(&self) {}

    /// Whether the operator asked to end the whole run, not just one pass
    fn stop_requested(&self) -> bool {
        false
    }

    fn show_banner(&self) {}

    fn clear_screen(&self) {}

    fn print_header(&self, message: &str);

    fn print_info(&self, message: &str);

    fn print_note(&self, message: &str);

    fn print_success(&self, message: &str);

    fn print_warning(&self, message: &str);

    fn print_error(&self, message: &str);

    fn print_item(&self, message: &str);

    fn print_pull_request(&self, pr: &PullRequest);

    fn print_skipped(&self);

    fn print_done(&self);
}

/// Scoped spinner: stopped exactly once, on `stop` or on drop
pub struct ProgressScope<'a> {
    adapter: &'a dyn InteractionAdapter,
    handle: Option<ProgressHandle>,
}

impl<'a> ProgressScope<'a> {
    pub fn start(adapter: &'a dyn InteractionAdapter, message: &str) -> Self {
        Self {
            handle: Some(adapter.start_progress(message)),
            adapter,
        }
    }

    pub fn repository(
        adapter: &'a dyn InteractionAdapter,
        current: usize,
        total: usize,
        name: &str,
    ) -> Self {
        Self {
            handle: Some(adapter.start_repository_progress(current, total, name)),
            adapter,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.adapter.end_progress(handle);
        }
    }
}

impl Drop for ProgressScope<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingAdapter {
        counter: AtomicU64,
        ended: Mutex<Vec<u64>>,
    }

    impl InteractionAdapter for CountingAdapter {
        fn ask_confirm(&self, _prompt: &str, default: bool) -> InteractionResult<Confirmation> {
            Ok(Confirmation::from_answer(default))
        }
        fn start_progress(&self, message: &str) -> ProgressHandle {
            ProgressHandle::new(self.counter.fetch_add(1, Ordering::SeqCst), message)
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
            self.ended.lock().unwrap().push(handle.id());
        }
        fn print_header(&self, _message: &str) {}
        fn print_info(&self, _message: &str) {}
        fn print_note(&self, _message: &str) {}
        fn print_success(&self, _message: &str) {}
        fn print_warning(&self, _message: &str) {}
        fn print_error(&self, _message: &str) {}
        fn print_item(&self, _message: &str) {}
        fn print_pull_request(&self, _pr: &PullRequest) {}
        fn print_skipped(&self) {}
        fn print_done(&self) {}
    }

    #[test]
    fn test_progress_scope_stops_once() {
        let adapter = CountingAdapter::default();
        {
            let mut scope = ProgressScope::start(&adapter, "Fetching");
            assert!(scope.is_running());
            scope.stop();
            assert!(!scope.is_running());
            scope.stop();
        }
        assert_eq!(*adapter.ended.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_progress_scope_stops_on_drop() {
        let adapter = CountingAdapter::default();
        {
            let _scope = ProgressScope::repository(&adapter, 1, 3, "widgets");
        }
        assert_eq!(adapter.ended.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_confirmation_from_answer() {
        assert_eq!(Confirmation::from_answer(true), Confirmation::Accepted);
        assert_eq!(Confirmation::from_answer(false), Confirmation::Declined);
    }
}
