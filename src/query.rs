//! Source-native query construction.
//!
//! Every builder here is a pure function of the request: no I/O, no clock
//! reads except where the window itself defaults to a trailing range. Each
//! collector calls exactly one of these before its first network call.

use chrono::NaiveDate;

use crate::models::DateRange;

/// Fixed sender/subject predicate for the mail search.
pub const MAIL_SENDER: &str = "gemini-notes@google.com";
pub const MAIL_SUBJECT: &str = "Notes:";

/// Gmail search expression: fixed sender/subject predicate plus optional
/// date bounds in Gmail's `YYYY/MM/DD` syntax.
pub fn gmail_query(window: &DateRange) -> String {
    let mut parts = vec![
        format!("from:{}", MAIL_SENDER),
        format!("subject:\"{}\"", MAIL_SUBJECT),
    ];
    if let Some(start) = window.start {
        parts.push(format!("after:{}", start.format("%Y/%m/%d")));
    }
    if let Some(end) = window.end {
        parts.push(format!("before:{}", end.format("%Y/%m/%d")));
    }
    parts.join(" ")
}

/// Drive files query: Google Docs only, full-text term, not trashed,
/// optional created-time bounds. Conjunction joined with ` and `.
pub fn drive_query(term: &str, window: &DateRange) -> String {
    let mut parts = vec![
        "mimeType='application/vnd.google-apps.document'".to_string(),
        format!("fullText contains '{}'", term.replace('\'', "\\'")),
        "trashed=false".to_string(),
    ];
    if let Some(start) = window.start {
        parts.push(format!("createdTime >= '{}T00:00:00'", start));
    }
    if let Some(end) = window.end {
        parts.push(format!("createdTime <= '{}T23:59:59'", end));
    }
    parts.join(" and ")
}

/// JQL for issues with any activity (created, updated, or resolved) inside
/// the window, optionally restricted to a team-member allow-list
/// (assignee-or-reporter per identity), newest update first.
pub fn jira_jql(project: &str, members: &[String], start: NaiveDate, end: NaiveDate) -> String {
    let team_filter = if members.is_empty() {
        String::new()
    } else {
        let conditions = members
            .iter()
            .map(|m| format!("assignee = \"{}\" OR reporter = \"{}\"", m, m))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!(" AND ({})", conditions)
    };

    format!(
        "project = {} AND \
         ((created >= '{start}' AND created <= '{end}') OR \
         (updated >= '{start}' AND updated <= '{end}') OR \
         (resolutiondate >= '{start}' AND resolutiondate <= '{end}')){} \
         ORDER BY updated DESC",
        project, team_filter
    )
}

/// Inclusive epoch-second bounds for the chat history fetch.
///
/// The chat API has no date-expression syntax; the window becomes `oldest`
/// (start of the first day, UTC) and `latest` (end of the last day, UTC).
/// Absent ends default to the trailing seven days.
pub fn slack_window(window: &DateRange) -> (i64, i64) {
    let resolved = window.or_last_days(7);
    let start = resolved.start.unwrap_or_default();
    let end = resolved.end.unwrap_or_default();
    let oldest = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
    let latest = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
    (oldest, latest)
}
