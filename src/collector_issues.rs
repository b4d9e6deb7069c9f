//! Issue-tracker collector (Jira REST API v2).
//!
//! One JQL search over a project, bounded to issues with any activity inside
//! the window, rendered straight from the search response. No per-item
//! enrichment calls: the `fields` parameter pulls everything the block needs.
//!
//! Credentials: `JIRA_API_TOKEN` (personal access token, used as a bearer
//! token) plus the optional `JIRA_BASE_URL` server override.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::credentials::JiraCredentials;
use crate::http::{get_json, truncate};
use crate::logging::RunLogger;
use crate::models::{CollectError, CollectionRequest, Harvest, Source, SourceFilter};
use crate::query;
use crate::traits::Collector;

const SEARCH_FIELDS: &str =
    "summary,status,assignee,priority,updated,created,resolutiondate,description";
const PAGE_SIZE: &str = "100";
const DESCRIPTION_CHARS: usize = 200;

pub const DEFAULT_PROJECT: &str = "RHDPOPS";

pub struct IssuesCollector;

#[async_trait]
impl Collector for IssuesCollector {
    fn source(&self) -> Source {
        Source::Jira
    }

    async fn collect(
        &self,
        request: &CollectionRequest,
        logger: &RunLogger,
    ) -> Result<Harvest, CollectError> {
        let creds = JiraCredentials::resolve(&request.env)?;

        let (project, members) = match &request.filter {
            SourceFilter::Project { key, members } => (key.as_str(), members.as_slice()),
            _ => (DEFAULT_PROJECT, &[][..]),
        };

        let window = request.window.or_last_days(7);
        let (start, end) = (window.start.unwrap_or_default(), window.end.unwrap_or_default());
        let jql = query::jira_jql(project, members, start, end);
        logger.log(&format!("Executing JQL: {}", jql));

        let client = reqwest::Client::new();
        let url = format!("{}/rest/api/2/search", creds.base_url);
        let response = get_json(
            &client,
            &creds.token,
            &url,
            &[
                ("jql", jql.as_str()),
                ("maxResults", PAGE_SIZE),
                ("fields", SEARCH_FIELDS),
            ],
        )
        .await?;

        let issues = response["issues"]
            .as_array()
            .ok_or_else(|| CollectError::Api("search response carried no issues array".into()))?;
        logger.log(&format!("Found {} issues", issues.len()));

        let blocks = issues
            .iter()
            .map(|issue| format_issue(issue, &creds.base_url))
            .collect();

        Ok(Harvest::new(blocks).with_extra("project", json!(project)))
    }
}

/// Render one search hit into its fixed text block.
fn format_issue(issue: &Value, base_url: &str) -> String {
    let key = issue["key"].as_str().unwrap_or("UNKNOWN");
    let fields = &issue["fields"];
    let summary = fields["summary"].as_str().unwrap_or("No summary");
    let status = fields["status"]["name"].as_str().unwrap_or("Unknown");
    let assignee = fields["assignee"]["displayName"]
        .as_str()
        .unwrap_or("Unassigned");
    let priority = fields["priority"]["name"].as_str().unwrap_or("None");
    let created = fields["created"].as_str().unwrap_or("");
    let updated = fields["updated"].as_str().unwrap_or("");
    let description = fields["description"].as_str().unwrap_or("No description");

    let mut block = format!(
        "[{key}]({base_url}/browse/{key}) - {summary}\n\
         \x20 Status: {status}\n\
         \x20 Assignee: {assignee}\n\
         \x20 Priority: {priority}\n\
         \x20 Created: {created}\n\
         \x20 Updated: {updated}\n"
    );
    if let Some(resolved) = fields["resolutiondate"].as_str() {
        block.push_str(&format!("  Resolved: {}\n", resolved));
    }
    block.push_str(&format!(
        "  Description: {}...\n",
        truncate(description, DESCRIPTION_CHARS)
    ));
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://issues.example.com";

    #[test]
    fn formats_unresolved_issue() {
        let issue = json!({
            "key": "OPS-42",
            "fields": {
                "summary": "Pipeline flakes on retry",
                "status": { "name": "In Progress" },
                "assignee": { "displayName": "Alice Example" },
                "priority": { "name": "Major" },
                "created": "2024-01-02T09:00:00.000+0000",
                "updated": "2024-01-05T14:30:00.000+0000",
                "resolutiondate": null,
                "description": "Retries hit a stale cache."
            }
        });
        assert_eq!(
            format_issue(&issue, BASE),
            "[OPS-42](https://issues.example.com/browse/OPS-42) - Pipeline flakes on retry\n\
             \x20 Status: In Progress\n\
             \x20 Assignee: Alice Example\n\
             \x20 Priority: Major\n\
             \x20 Created: 2024-01-02T09:00:00.000+0000\n\
             \x20 Updated: 2024-01-05T14:30:00.000+0000\n\
             \x20 Description: Retries hit a stale cache....\n"
        );
    }

    #[test]
    fn resolved_issue_gains_resolved_line() {
        let issue = json!({
            "key": "OPS-7",
            "fields": {
                "summary": "Done thing",
                "status": { "name": "Closed" },
                "resolutiondate": "2024-01-06T10:00:00.000+0000"
            }
        });
        let block = format_issue(&issue, BASE);
        assert!(block.contains("  Updated: \n  Resolved: 2024-01-06T10:00:00.000+0000\n"));
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let block = format_issue(&json!({ "key": "OPS-1", "fields": {} }), BASE);
        assert!(block.contains("  Status: Unknown\n"));
        assert!(block.contains("  Assignee: Unassigned\n"));
        assert!(block.contains("  Priority: None\n"));
        assert!(block.contains("  Description: No description...\n"));
        assert!(!block.contains("  Resolved:"));
    }

    #[test]
    fn long_description_is_truncated() {
        let issue = json!({
            "key": "OPS-9",
            "fields": { "description": "d".repeat(500) }
        });
        let block = format_issue(&issue, BASE);
        let line = block.lines().last().unwrap();
        assert_eq!(line, format!("  Description: {}...", "d".repeat(200)));
    }
}
