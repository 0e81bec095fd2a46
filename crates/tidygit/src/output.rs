//! JSON output formatting for `--json`

use serde::{Deserialize, Serialize};
use tidygit_core::{RepositoryResult, RunSummary};

const SCHEMA_VERSION: &str = "1";

/// JSON response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for forward compatibility
    pub schema_version: String,
    /// Command that generated this response
    pub command: String,
    /// Status: "ok" or "error"
    pub status: String,
    /// Command-specific payload
    pub data: T,
    /// Recorded errors, flattened across repositories
    pub issues: Vec<JsonIssue>,
}

impl<T> JsonResponse<T> {
    /// `ok` when `issues` is empty, `error` otherwise
    pub fn new(command: &str, data: T, issues: Vec<JsonIssue>) -> Self {
        let status = if issues.is_empty() { "ok" } else { "error" };
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            status: status.to_string(),
            data,
            issues,
        }
    }
}

/// One recorded error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonIssue {
    pub repository: String,
    pub message: String,
}

fn issues_for(results: &[RepositoryResult]) -> Vec<JsonIssue> {
    results
        .iter()
        .flat_map(|r| {
            r.errors.iter().map(|message| JsonIssue {
                repository: r.name.clone(),
                message: message.clone(),
            })
        })
        .collect()
}

/// Data payload for the single-repository run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanData {
    pub repository: RepositoryResult,
}

/// Data payload for `all`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllData {
    pub repositories: Vec<RepositoryResult>,
    pub summary: RunSummary,
}

pub fn clean_response(result: RepositoryResult) -> JsonResponse<CleanData> {
    let issues = issues_for(std::slice::from_ref(&result));
    JsonResponse::new("clean", CleanData { repository: result }, issues)
}

pub fn all_response(results: Vec<RepositoryResult>) -> JsonResponse<AllData> {
    let issues = issues_for(&results);
    let summary = RunSummary::from_results(&results);
    JsonResponse::new(
        "all",
        AllData {
            repositories: results,
            summary,
        },
        issues,
    )
}

/// Print a response as pretty JSON on stdout
pub fn print_json<T: Serialize>(response: &JsonResponse<T>) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("error: serializing results: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response_ok() {
        let mut result = RepositoryResult::new("widgets");
        result.branches_total = 2;
        result.branches_deleted = 1;

        let response = clean_response(result);
        assert_eq!(response.status, "ok");
        assert!(response.issues.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["command"], "clean");
        assert_eq!(json["data"]["repository"]["name"], "widgets");
        assert_eq!(json["data"]["repository"]["branches_deleted"], 1);
    }

    #[test]
    fn test_all_response_flattens_errors() {
        let ok = RepositoryResult::new("alpha");
        let failed = RepositoryResult::failed("beta", "fetching: could not resolve host");

        let response = all_response(vec![ok, failed]);
        assert_eq!(response.status, "error");
        assert_eq!(response.issues.len(), 1);
        assert_eq!(response.issues[0].repository, "beta");
        assert_eq!(response.data.summary.repos, 2);
        assert_eq!(response.data.summary.repos_with_errors, 1);
    }
}
