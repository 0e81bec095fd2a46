//! tidygit CLI - Interactive cleanup of stale worktrees and branches

mod cli;
mod colors;
mod interaction;
mod logging;
mod output;
mod splash;
mod summary;

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use tidygit_core::{Config, InteractionAdapter, PrScope, RepositoryResult, Runner, TidyError};

use cli::{Cli, Commands};
use interaction::CliAdapter;

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<Config, TidyError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.open_prs_only {
        config.tidygit.pr_scope = PrScope::Open;
    }
    if cli.no_overlap {
        config.tidygit.track_worktree_overlap = false;
    }
    debug!(?config, "effective configuration");
    Ok(config)
}

/// Clean the current directory; exit 1 if anything went wrong
fn run_single(runner: &Runner<'_>, json: bool) -> u8 {
    let result = runner.run_one(Path::new("."), true, None);
    let failed = result.has_errors();

    if json {
        output::print_json(&output::clean_response(result));
    }
    u8::from(failed)
}

/// Clean every repository under `dir`; per-repository errors only show in
/// the summary. With `--json` the envelope is printed even for an empty scan.
fn run_all(
    runner: &Runner<'_>,
    adapter: &CliAdapter,
    dir: &Path,
    json: bool,
) -> Result<u8, TidyError> {
    let results: Vec<RepositoryResult> = runner.run_all(dir)?;

    if json {
        output::print_json(&output::all_response(results));
    } else if !results.is_empty() {
        adapter.show_banner();
        println!();
        println!("{}", summary::render(&results, std::io::stdout().is_terminal()));
        println!();
    }
    Ok(0)
}

fn run(cli: Cli) -> Result<u8, TidyError> {
    let config = load_config(&cli)?;
    let adapter = if cli.json {
        CliAdapter::new().report_to_stderr()
    } else {
        CliAdapter::new()
    };
    let runner = Runner::new(&adapter, &config);
    runner.preflight()?;

    match &cli.command {
        None => Ok(run_single(&runner, cli.json)),
        Some(Commands::All { dir }) => run_all(&runner, &adapter, dir, cli.json),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, on stdout
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}
