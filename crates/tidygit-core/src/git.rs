//! Git CLI adapter
//!
//! Every call runs `git -C <repo_root> ...` against a root fixed at
//! construction, so nothing here depends on the process working directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::TidyError;
use crate::types::Worktree;

static HEAD_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*HEAD branch:\s*(\S+)\s*$").unwrap());

/// Version-control operations the reconciliation engine needs
pub trait Vcs {
    /// Branch the remote's HEAD points to
    fn detect_default_branch(&self) -> Result<String, TidyError>;

    /// Whether the working tree differs from HEAD. Never fails: anything
    /// other than a clean exit counts as dirty.
    fn has_uncommitted_changes(&self) -> bool;

    fn reset_hard(&self) -> Result<(), TidyError>;

    fn switch_to(&self, branch: &str) -> Result<(), TidyError>;

    fn fetch_all_pruned(&self) -> Result<(), TidyError>;

    fn pull_rebase(&self, branch: &str) -> Result<(), TidyError>;

    fn prune_worktrees(&self) -> Result<(), TidyError>;

    /// Linked worktrees, excluding the primary checkout
    fn list_worktrees(&self) -> Result<Vec<Worktree>, TidyError>;

    /// Local branches in git's order, with `excluding` filtered out
    fn list_branches(&self, excluding: Option<&str>) -> Result<Vec<String>, TidyError>;

    /// Forced removal of a linked worktree
    fn remove_worktree(&self, path: &Path) -> Result<(), TidyError>;

    /// Forced deletion of a local branch
    fn delete_branch(&self, name: &str) -> Result<(), TidyError>;
}

/// Git CLI wrapper bound to one repository
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
    git_path: String,
    remote: String,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            git_path: "git".to_string(),
            remote: "origin".to_string(),
        }
    }

    /// Use a different git binary
    pub fn with_git_path(mut self, git_path: impl Into<String>) -> Self {
        self.git_path = git_path.into();
        self
    }

    /// Query and pull from a remote other than `origin`
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Check that the git binary can be executed at all
    pub fn ensure_available(&self) -> Result<(), TidyError> {
        let output = Command::new(&self.git_path)
            .arg("--version")
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TidyError::GitNotInstalled
                } else {
                    TidyError::git("running git", e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(TidyError::GitNotInstalled);
        }
        debug!(version = %String::from_utf8_lossy(&output.stdout).trim(), "git available");
        Ok(())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.arg("-C").arg(&self.repo_root).args(args);
        cmd
    }

    /// Run a git subcommand, turning spawn failures and non-zero exits into
    /// `TidyError::Git` labelled with `operation`
    fn run(&self, operation: &str, args: &[&str]) -> Result<Output, TidyError> {
        debug!(repo = %self.repo_root.display(), ?args, "git");

        let output = self.command(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TidyError::GitNotInstalled
            } else {
                TidyError::git(operation, e.to_string())
            }
        })?;

        if !output.status.success() {
            debug!(status = ?output.status.code(), ?args, "git failed");
            return Err(TidyError::git(operation, combined_output(&output)));
        }

        Ok(output)
    }
}

/// Trimmed stdout and stderr joined, for diagnostics
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let parts: Vec<&str> = [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    } else {
        parts.join("\n")
    }
}

impl Vcs for GitCli {
    fn detect_default_branch(&self) -> Result<String, TidyError> {
        let operation = "getting default branch";
        let output = self.run(operation, &["remote", "show", &self.remote])?;
        let text = String::from_utf8_lossy(&output.stdout);

        parse_default_branch(&text).ok_or_else(|| {
            TidyError::git(operation, "HEAD branch not found in remote output")
        })
    }

    fn has_uncommitted_changes(&self) -> bool {
        match self
            .command(&["diff-index", "--quiet", "HEAD", "--"])
            .status()
        {
            Ok(status) => !status.success(),
            Err(e) => {
                debug!(error = %e, "diff-index could not run; treating tree as dirty");
                true
            }
        }
    }

    fn reset_hard(&self) -> Result<(), TidyError> {
        self.run("resetting HEAD", &["reset", "--hard", "HEAD"])?;
        Ok(())
    }

    fn switch_to(&self, branch: &str) -> Result<(), TidyError> {
        self.run(&format!("switching to {}", branch), &["switch", branch])?;
        Ok(())
    }

    fn fetch_all_pruned(&self) -> Result<(), TidyError> {
        self.run("fetching", &["fetch", "--all", "--prune"])?;
        Ok(())
    }

    fn pull_rebase(&self, branch: &str) -> Result<(), TidyError> {
        self.run(
            "pulling with rebase",
            &["pull", "--rebase", &self.remote, branch],
        )?;
        Ok(())
    }

    fn prune_worktrees(&self) -> Result<(), TidyError> {
        self.run("pruning worktrees", &["worktree", "prune"])?;
        Ok(())
    }

    fn list_worktrees(&self) -> Result<Vec<Worktree>, TidyError> {
        let output = self.run("listing worktrees", &["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn list_branches(&self, excluding: Option<&str>) -> Result<Vec<String>, TidyError> {
        let output = self.run(
            "listing branches",
            &["branch", "--format=%(refname:short)"],
        )?;
        Ok(parse_branch_list(
            &String::from_utf8_lossy(&output.stdout),
            excluding,
        ))
    }

    fn remove_worktree(&self, path: &Path) -> Result<(), TidyError> {
        let operation = format!("removing worktree {}", path.display());
        let path_str = path
            .to_str()
            .ok_or_else(|| TidyError::git(&operation, "worktree path is not valid UTF-8"))?;

        self.run(&operation, &["worktree", "remove", path_str, "--force"])?;
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<(), TidyError> {
        self.run(&format!("deleting branch {}", name), &["branch", "-D", name])?;
        Ok(())
    }
}

/// Extract the `HEAD branch:` value from `git remote show <remote>` output.
///
/// Returns `None` when the line is absent or git reports `(unknown)`.
pub fn parse_default_branch(output: &str) -> Option<String> {
    HEAD_BRANCH
        .captures(output)
        .map(|caps| caps[1].to_string())
        .filter(|branch| branch != "(unknown)")
}

/// Parse `git worktree list --porcelain` output.
///
/// Entries are blank-line separated. The first entry is always the primary
/// checkout and is skipped. An entry without a `branch` line (detached or
/// bare) yields `branch: None`.
pub fn parse_worktree_list(output: &str) -> Vec<Worktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<Worktree> = None;
    let mut seen_primary = false;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
            if !seen_primary {
                seen_primary = true;
                continue;
            }
            current = Some(Worktree {
                path: PathBuf::from(path),
                branch: None,
            });
        } else if let Some(reference) = line.strip_prefix("branch ") {
            if let Some(wt) = current.as_mut() {
                let name = reference.strip_prefix("refs/heads/").unwrap_or(reference);
                wt.branch = Some(name.to_string());
            }
        } else if line.is_empty() {
            if let Some(done) = current.take() {
                worktrees.push(done);
            }
        }
    }

    if let Some(done) = current.take() {
        worktrees.push(done);
    }

    worktrees
}

/// Parse `git branch --format=%(refname:short)` output, dropping blank lines
/// and `excluding`
pub fn parse_branch_list(output: &str, excluding: Option<&str>) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| Some(*line) != excluding)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_branch() {
        let output = "* remote origin\n  Fetch URL: git@github.com:acme/widgets.git\n  Push  URL: git@github.com:acme/widgets.git\n  HEAD branch: main\n  Remote branches:\n    main tracked\n";
        assert_eq!(parse_default_branch(output), Some("main".to_string()));
    }

    #[test]
    fn test_parse_default_branch_missing() {
        assert_eq!(parse_default_branch("* remote origin\n  Fetch URL: x\n"), None);
        assert_eq!(parse_default_branch("  HEAD branch: (unknown)\n"), None);
    }

    #[test]
    fn test_parse_worktree_list_skips_primary() {
        let output = "worktree /p1\nHEAD 1111111\nbranch refs/heads/main\n\nworktree /p2\nHEAD 2222222\nbranch refs/heads/feat-x\n\n";
        let worktrees = parse_worktree_list(output);
        assert_eq!(
            worktrees,
            vec![Worktree {
                path: PathBuf::from("/p2"),
                branch: Some("feat-x".to_string()),
            }]
        );
    }

    #[test]
    fn test_parse_worktree_list_detached_and_no_trailing_newline() {
        let output = "worktree /repo\nbranch refs/heads/main\n\nworktree /repo-detached\nHEAD abcdef0\ndetached\n\nworktree /repo-wt\nbranch refs/heads/feat/nested";
        let worktrees = parse_worktree_list(output);
        assert_eq!(worktrees.len(), 2);
        assert_eq!(worktrees[0].path, PathBuf::from("/repo-detached"));
        assert_eq!(worktrees[0].branch, None);
        assert_eq!(worktrees[1].path, PathBuf::from("/repo-wt"));
        assert_eq!(worktrees[1].branch.as_deref(), Some("feat/nested"));
    }

    #[test]
    fn test_parse_worktree_list_only_primary() {
        let output = "worktree /repo\nHEAD 1111111\nbranch refs/heads/main\n\n";
        assert!(parse_worktree_list(output).is_empty());
        assert!(parse_worktree_list("").is_empty());
    }

    #[test]
    fn test_parse_branch_list_excludes_and_keeps_order() {
        let output = "main\nfeat-a\n\nfeat-b\n";
        assert_eq!(
            parse_branch_list(output, Some("main")),
            vec!["feat-a".to_string(), "feat-b".to_string()]
        );
    }

    #[test]
    fn test_parse_branch_list_without_exclusion() {
        let output = "  main  \nfeat-a\n";
        assert_eq!(
            parse_branch_list(output, None),
            vec!["main".to_string(), "feat-a".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_combined_output_keeps_both_streams() {
        use std::os::unix::process::ExitStatusExt;

        let output = Output {
            status: std::process::ExitStatus::from_raw(1 << 8),
            stdout: b"Updating 1a2b3c..4d5e6f\n".to_vec(),
            stderr: b"error: cannot pull with rebase\n".to_vec(),
        };
        assert_eq!(
            combined_output(&output),
            "Updating 1a2b3c..4d5e6f\nerror: cannot pull with rebase"
        );

        let silent = Output {
            stdout: Vec::new(),
            stderr: Vec::new(),
            ..output
        };
        assert_eq!(combined_output(&silent), "exit status 1");
    }
}
