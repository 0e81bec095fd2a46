//! Run aggregation across one or many repositories
//!
//! Repositories are processed strictly one after another: every pass needs
//! the terminal to itself.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::TidyError;
use crate::git::GitCli;
use crate::github::GhCli;
use crate::interaction::{InteractionAdapter, ProgressScope};
use crate::reconcile::Reconciler;
use crate::types::RepositoryResult;

pub const NO_REPOSITORIES: &str = "No git repositories found.";

/// A repository directory found under a scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDir {
    pub name: String,
    pub path: PathBuf,
}

/// Immediate subdirectories of `root` that contain a `.git` directory,
/// sorted by name
pub fn discover_repositories(root: &Path) -> Result<Vec<RepositoryDir>, TidyError> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        TidyError::NotADirectory(format!("reading directory {}: {}", root.display(), e))
    })?;

    let mut repos = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(".git").is_dir() {
            continue;
        }
        repos.push(RepositoryDir {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }

    repos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(repos)
}

/// Resolve `dir` to an absolute directory path
pub fn resolve_dir(dir: &Path) -> Result<PathBuf, TidyError> {
    let path = std::path::absolute(dir).map_err(|e| {
        TidyError::NotADirectory(format!("resolving path {}: {}", dir.display(), e))
    })?;

    if !path.is_dir() {
        return Err(TidyError::NotADirectory(format!(
            "changing to directory {}: not a directory",
            path.display()
        )));
    }
    Ok(path)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Drives reconciliation passes with adapters built from the config
pub struct Runner<'a> {
    ui: &'a dyn InteractionAdapter,
    config: &'a Config,
}

impl<'a> Runner<'a> {
    pub fn new(ui: &'a dyn InteractionAdapter, config: &'a Config) -> Self {
        Self { ui, config }
    }

    /// Fail early when git cannot run at all
    pub fn preflight(&self) -> Result<(), TidyError> {
        GitCli::new(".")
            .with_git_path(&self.config.tidygit.git)
            .ensure_available()
    }

    fn git_for(&self, root: &Path) -> GitCli {
        GitCli::new(root)
            .with_git_path(&self.config.tidygit.git)
            .with_remote(&self.config.tidygit.remote)
    }

    fn gh_for(&self, root: &Path) -> GhCli {
        GhCli::new(root)
            .with_gh_path(&self.config.tidygit.gh)
            .with_limit(self.config.tidygit.pr_limit)
    }

    /// One reconciliation pass over `dir`
    ///
    /// A directory that cannot be resolved ends the pass with a single error.
    pub fn run_one(
        &self,
        dir: &Path,
        show_banner: bool,
        progress: Option<ProgressScope<'a>>,
    ) -> RepositoryResult {
        self.ui.reset_abort();

        let root = match resolve_dir(dir) {
            Ok(root) => root,
            Err(e) => {
                let result = RepositoryResult::failed(dir_name(dir), e.to_string());
                self.ui.print_error(&result.errors[0]);
                return result;
            }
        };

        let name = dir_name(&root);
        info!(repo = %name, path = %root.display(), "reconciling");

        let git = self.git_for(&root);
        let gh = self.gh_for(&root);
        let mut reconciler =
            Reconciler::new(name, &git, &gh, self.ui, self.config.reconcile_options())
                .with_banner(show_banner);
        if let Some(progress) = progress {
            reconciler = reconciler.with_progress(progress);
        }
        reconciler.run()
    }

    /// Reconcile every repository directly under `root`
    ///
    /// Returns an empty list, after saying so, when there is nothing to do.
    /// Per-repository failures live in the results, never in the `Err`. A stop
    /// request ends the loop before the next repository starts.
    pub fn run_all(&self, root: &Path) -> Result<Vec<RepositoryResult>, TidyError> {
        let root = resolve_dir(root)?;
        let repos = discover_repositories(&root)?;
        debug!(root = %root.display(), count = repos.len(), "discovered repositories");

        if repos.is_empty() {
            self.ui.print_info(NO_REPOSITORIES);
            return Ok(Vec::new());
        }

        let total = repos.len();
        let mut results = Vec::with_capacity(total);
        for (i, repo) in repos.iter().enumerate() {
            if self.ui.stop_requested() {
                info!(remaining = total - i, "run stopped by operator");
                break;
            }
            self.ui.clear_screen();
            self.ui.show_banner();
            let progress = ProgressScope::repository(self.ui, i + 1, total, &repo.name);

            results.push(self.run_one(&repo.path, false, Some(progress)));
        }

        self.ui.clear_screen();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedAdapter;
    use std::fs;

    #[test]
    fn test_discover_repositories_filters_and_sorts() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp.path();

        fs::create_dir_all(root.join("zeta/.git")).unwrap();
        fs::create_dir_all(root.join("alpha/.git")).unwrap();
        fs::create_dir_all(root.join("plain-dir")).unwrap();
        // A worktree checkout has a .git file, not a directory
        fs::create_dir_all(root.join("linked")).unwrap();
        fs::write(root.join("linked/.git"), "gitdir: /elsewhere\n").unwrap();
        fs::write(root.join("notes.txt"), "hello").unwrap();

        let repos = discover_repositories(root).expect("discovery should succeed");
        let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(repos[0].path, root.join("alpha"));
    }

    #[test]
    fn test_run_all_with_no_repositories() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        fs::create_dir_all(temp.path().join("not-a-repo")).unwrap();

        let ui = ScriptedAdapter::new();
        let config = Config::default();
        let results = Runner::new(&ui, &config)
            .run_all(temp.path())
            .expect("empty scan is not an error");

        assert!(results.is_empty());
        assert!(ui.printed(NO_REPOSITORIES));
        assert!(!ui.printed("clear"));
    }

    #[test]
    fn test_run_all_missing_root_is_error() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let ui = ScriptedAdapter::new();
        let config = Config::default();

        let err = Runner::new(&ui, &config)
            .run_all(&temp.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, TidyError::NotADirectory(_)));
    }

    #[test]
    fn test_run_one_unresolvable_dir_records_single_error() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let missing = temp.path().join("gone");
        let ui = ScriptedAdapter::new();
        let config = Config::default();

        let result = Runner::new(&ui, &config).run_one(&missing, true, None);

        assert_eq!(result.name, "gone");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("not a directory"));
        assert!(ui.prompts().is_empty());
        assert_eq!(ui.resets(), 1);
    }

    #[test]
    fn test_run_all_stops_between_repositories() {
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        for name in ["alpha", "beta", "gamma"] {
            fs::create_dir_all(temp.path().join(name).join(".git")).unwrap();
        }

        let ui = ScriptedAdapter::new().with_stop_after(1);
        let mut config = Config::default();
        config.tidygit.git = "tidygit-no-such-git".to_string();
        config.tidygit.gh = "tidygit-no-such-gh".to_string();

        let results = Runner::new(&ui, &config)
            .run_all(temp.path())
            .expect("scan should succeed");

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha"]);
        assert_eq!(ui.resets(), 1);
        assert!(!ui.printed("[2/3] beta"));
        assert!(ui.printed("end: [1/3] alpha"));
    }
}
