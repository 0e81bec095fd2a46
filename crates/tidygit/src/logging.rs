//! Diagnostic logging setup
//!
//! The terminal belongs to the prompts, so logging is off unless asked for.
//! `--verbose` turns on debug output for the tidygit crates and
//! `TIDYGIT_LOG` takes any `EnvFilter` directive.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "TIDYGIT_LOG";

const VERBOSE_FILTER: &str = "tidygit=debug,tidygit_core=debug";

/// Filter directive for this run, or `None` when logging stays off
fn filter_directive(verbose: bool, env_value: Option<String>) -> Option<String> {
    match env_value {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ if verbose => Some(VERBOSE_FILTER.to_string()),
        _ => None,
    }
}

/// Install the global subscriber, writing plain text to stderr
pub fn init(verbose: bool) {
    let Some(directive) = filter_directive(verbose, std::env::var(LOG_ENV).ok()) else {
        return;
    };

    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(VERBOSE_FILTER));

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
