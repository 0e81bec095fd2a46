//! CLI adapter implementation using dialoguer for the confirmation gate
//!
//! Spinners live in one indicatif `MultiProgress`; every line printed while
//! one may be ticking goes through `suspend` so the two never interleave.
//! Report lines go to stdout, or to stderr when stdout is reserved for JSON.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::IsTerminal;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use console::{Style, Term};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::Confirm;
use dialoguer::theme::Theme;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Style as TextStyle};
use tracing::debug;

use tidygit_core::{
    Confirmation, InteractionAdapter, InteractionError, InteractionResult, ProgressHandle,
    PullRequest,
};

use crate::colors::COLORS;
use crate::splash;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

/// Exit status after a second Ctrl+C (128 + SIGINT)
const INTERRUPTED_EXIT: i32 = 130;

/// Set by Ctrl+C outside a prompt; honoured by the next prompt
static CANCELLED: AtomicBool = AtomicBool::new(false);

/// Set by any Ctrl+C; no further repository starts once it is set
static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Record a Ctrl+C; returns true if one was already pending
fn request_stop() -> bool {
    CANCELLED.store(true, Ordering::SeqCst);
    STOP_REQUESTED.swap(true, Ordering::SeqCst)
}

/// Set up the global Ctrl+C handler
///
/// The first Ctrl+C aborts the current pass at its next prompt and ends the
/// run after it. A second one exits immediately.
pub fn setup_ctrl_c_handler() {
    static HANDLER_SET: AtomicBool = AtomicBool::new(false);

    if HANDLER_SET.swap(true, Ordering::SeqCst) {
        return;
    }

    if let Err(e) = ctrlc::set_handler(move || {
        if request_stop() {
            Term::stderr().show_cursor().ok();
            std::process::exit(INTERRUPTED_EXIT);
        }
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {}", e);
    }
}

/// Reset the per-pass cancellation flag; a pending stop request survives
pub fn reset_cancellation() {
    CANCELLED.store(false, Ordering::SeqCst);
}

/// Confirm prompt theme matching the two-space output margin
struct SpacedTheme {
    marker_style: Style,
    yes_style: Style,
    no_style: Style,
    hint_style: Style,
}

impl SpacedTheme {
    fn new() -> Self {
        Self {
            marker_style: Style::new().yellow().bold(),
            yes_style: Style::new().green(),
            no_style: Style::new().red(),
            hint_style: Style::new().dim(),
        }
    }
}

impl Theme for SpacedTheme {
    fn format_prompt(&self, f: &mut dyn FmtWrite, prompt: &str) -> std::fmt::Result {
        write!(f, "  {} {}", self.marker_style.apply_to("?"), prompt)
    }

    fn format_confirm_prompt(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        default: Option<bool>,
    ) -> std::fmt::Result {
        let hint = match default {
            Some(true) => "(Y/n)",
            Some(false) => "(y/N)",
            None => "(y/n)",
        };
        write!(
            f,
            "  {} {} {}",
            self.marker_style.apply_to("?"),
            prompt,
            self.hint_style.apply_to(hint)
        )
    }

    fn format_confirm_prompt_selection(
        &self,
        f: &mut dyn FmtWrite,
        prompt: &str,
        selection: Option<bool>,
    ) -> std::fmt::Result {
        let answer = match selection {
            Some(true) => self.yes_style.apply_to("▸ Yes"),
            Some(false) => self.no_style.apply_to("▸ No"),
            None => self.hint_style.apply_to("▸ Stop"),
        };
        write!(
            f,
            "  {} {} {}",
            self.marker_style.apply_to("?"),
            prompt,
            answer
        )
    }
}

fn spinner_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS)
}

/// CLI adapter for terminal-based user interaction
pub struct CliAdapter {
    is_tty: bool,
    /// Where report lines and the banner are written
    term: Term,
    /// Style report lines; only when `term` is a terminal
    colored: bool,
    progress_counter: AtomicU64,
    multi: MultiProgress,
    active_progress: Mutex<HashMap<u64, ProgressBar>>,
    /// Finished form of repository progress lines, keyed by handle id
    repository_lines: Mutex<HashMap<u64, String>>,
}

impl CliAdapter {
    pub fn new() -> Self {
        Self::with_tty(std::io::stdin().is_terminal())
    }

    pub fn with_tty(is_tty: bool) -> Self {
        setup_ctrl_c_handler();
        let term = Term::stdout();
        Self {
            is_tty,
            colored: term.is_term(),
            term,
            progress_counter: AtomicU64::new(0),
            multi: MultiProgress::new(),
            active_progress: Mutex::new(HashMap::new()),
            repository_lines: Mutex::new(HashMap::new()),
        }
    }

    /// Send report lines to stderr, leaving stdout to the JSON envelope
    pub fn report_to_stderr(mut self) -> Self {
        self.term = Term::stderr();
        self.colored = self.term.is_term();
        self
    }

    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    fn paint(&self, text: &str, style: TextStyle) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn require_tty(&self) -> InteractionResult<()> {
        if !self.is_tty {
            Err(InteractionError::NonTty)
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> u64 {
        self.progress_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn track(&self, id: u64, bar: ProgressBar) {
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut progress_map) = self.active_progress.lock() {
            progress_map.insert(id, bar);
        }
    }

    /// Print a line above any ticking spinner
    fn line(&self, text: String) {
        self.multi.suspend(|| {
            self.term.write_line(&text).ok();
        });
    }
}

impl Default for CliAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionAdapter for CliAdapter {
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<Confirmation> {
        if is_cancelled() {
            debug!(prompt, "cancelled before prompt");
            return Ok(Confirmation::Aborted);
        }
        self.require_tty()?;

        let theme = SpacedTheme::new();
        let answer = self.multi.suspend(|| {
            Confirm::with_theme(&theme)
                .with_prompt(prompt)
                .default(default)
                .interact_opt()
        });

        match answer {
            Ok(Some(choice)) => Ok(Confirmation::from_answer(choice)),
            // Esc or q
            Ok(None) => Ok(Confirmation::Aborted),
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                request_stop();
                Term::stderr().show_cursor().ok();
                Ok(Confirmation::Aborted)
            }
            Err(e) => Err(InteractionError::Io(e.to_string())),
        }
    }

    fn start_progress(&self, message: &str) -> ProgressHandle {
        let id = self.next_id();

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style("  {spinner:.green} {msg}..."));
        bar.set_message(message.to_string());
        self.track(id, bar);

        ProgressHandle::new(id, message)
    }

    fn start_repository_progress(
        &self,
        current: usize,
        total: usize,
        name: &str,
    ) -> ProgressHandle {
        let id = self.next_id();
        let counter = format!("[{}/{}]", current, total);

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style("  {prefix:.dim} {spinner:.green} {msg:.blue.bold}"));
        bar.set_prefix(counter.clone());
        bar.set_message(name.to_string());
        self.track(id, bar);

        let done = format!(
            "  {} {} {}\n  {}",
            self.paint(&counter, COLORS.dim),
            self.paint("✓", COLORS.success),
            self.paint(name, COLORS.accent),
            self.paint(&"─".repeat(40), COLORS.dim)
        );
        if let Ok(mut lines) = self.repository_lines.lock() {
            lines.insert(id, done);
        }

        ProgressHandle::new(id, name)
    }

    fn end_progress(&self, handle: ProgressHandle) {
        let bar = self
            .active_progress
            .lock()
            .ok()
            .and_then(|mut progress_map| progress_map.remove(&handle.id()));
        if let Some(bar) = bar {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }

        let done = self
            .repository_lines
            .lock()
            .ok()
            .and_then(|mut lines| lines.remove(&handle.id()));
        if let Some(done) = done {
            self.line(done);
        }
    }

    fn reset_abort(&self) {
        reset_cancellation();
    }

    fn stop_requested(&self) -> bool {
        STOP_REQUESTED.load(Ordering::SeqCst)
    }

    fn show_banner(&self) {
        self.line(splash::banner(self.colored));
    }

    fn clear_screen(&self) {
        if self.term.is_term() {
            let mut term = self.term.clone();
            execute!(term, Clear(ClearType::All), MoveTo(0, 0)).ok();
        }
    }

    fn print_header(&self, message: &str) {
        self.line(format!("\n  {}\n", self.paint(message, COLORS.accent)));
    }

    fn print_info(&self, message: &str) {
        self.line(message.to_string());
    }

    fn print_note(&self, message: &str) {
        self.line(format!("  {}", self.paint(message, COLORS.dim)));
    }

    fn print_success(&self, message: &str) {
        self.line(format!("  {} {}", self.paint("✓", COLORS.success), message));
    }

    fn print_warning(&self, message: &str) {
        self.line(format!("  {} {}", self.paint("!", COLORS.warning), message));
    }

    fn print_error(&self, message: &str) {
        self.line(format!("  {} {}", self.paint("✗", COLORS.fail), message));
    }

    fn print_item(&self, message: &str) {
        self.line(format!("  {} {}", self.paint("▸", TextStyle::new().bold()), message));
    }

    fn print_pull_request(&self, pr: &PullRequest) {
        let highlight = TextStyle::new().yellow().italic();
        let sep = self.paint(" · ", COLORS.dim);
        self.line(format!(
            "    {}{}{}{}{}\n    {}",
            self.paint(&format!("PR #{}", pr.number), highlight),
            sep,
            self.paint(&pr.state.to_string(), COLORS.pr_state(&pr.state)),
            sep,
            self.paint(&pr.title, highlight),
            self.paint(&pr.url, TextStyle::new().blue().underline())
        ));
    }

    fn print_skipped(&self) {
        self.line(format!("    {}", self.paint("· Skipped", COLORS.dim)));
    }

    fn print_done(&self) {
        self.line(format!("\n  {}\n", self.paint("✓ Done", COLORS.success)));
    }
}
