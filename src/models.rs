//! Core data types shared by all four collectors.
//!
//! These types pin the uniform output contract: whatever the upstream service
//! looks like, a run always produces one [`CollectionResult`] on disk, either
//! fully populated (success) or carrying an error tag from the shared taxonomy
//! (degraded run).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Identifies which collector produced a record.
///
/// The serialized tags (`cog_emails`, `gdocs`, `jira`, `slack`) are part of
/// the on-disk contract and must not change: downstream report tooling keys
/// off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    CogEmails,
    Gdocs,
    Jira,
    Slack,
}

impl Source {
    /// The serialized source tag, e.g. `"cog_emails"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Source::CogEmails => "cog_emails",
            Source::Gdocs => "gdocs",
            Source::Jira => "jira",
            Source::Slack => "slack",
        }
    }

    /// Human-readable name used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::CogEmails => "CoG emails",
            Source::Gdocs => "Google Docs",
            Source::Jira => "JIRA",
            Source::Slack => "Slack",
        }
    }

    /// Name of the per-source item count field in the output record.
    pub fn count_field(&self) -> &'static str {
        match self {
            Source::CogEmails => "email_count",
            Source::Gdocs => "doc_count",
            Source::Jira => "issue_count",
            Source::Slack => "message_count",
        }
    }

    /// Default output file name under the system temp directory.
    pub fn default_output_name(&self) -> &'static str {
        match self {
            Source::CogEmails => "cog_emails.json",
            Source::Gdocs => "gdocs.json",
            Source::Jira => "jira.json",
            Source::Slack => "slack.json",
        }
    }

    /// `raw_text` for a successful run that found nothing.
    ///
    /// Chat uses a placeholder; the other sources emit an empty digest (the
    /// zero count disambiguates it).
    pub fn empty_text(&self) -> &'static str {
        match self {
            Source::Slack => "No relevant Slack messages found",
            _ => "",
        }
    }

    /// The fixed placeholder `raw_text` for a degraded run.
    pub fn error_text(&self, kind: ErrorKind) -> String {
        let subject = match self {
            Source::CogEmails => "No CoG emails",
            Source::Gdocs => "No Google Docs data",
            Source::Jira => "No JIRA data",
            Source::Slack => "No Slack data",
        };
        let condition = match (self, kind) {
            (Source::Slack, ErrorKind::MissingCredentials) => "credentials not configured",
            (_, ErrorKind::MissingCredentials) => "missing credentials",
            (_, ErrorKind::InvalidCredentials) => "invalid credentials",
            (_, ErrorKind::ApiFailure) => "API error",
            (_, ErrorKind::UnexpectedError) => "unexpected error",
        };
        format!("{} - {}", subject, condition)
    }
}

/// Inclusive calendar-date window; either side may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Fill absent ends with a trailing window: `[today - days, today]` (UTC).
    ///
    /// Used by the issue and chat collectors, whose default window is the
    /// last seven days rather than unbounded.
    pub fn or_last_days(self, days: i64) -> Self {
        let today = Utc::now().date_naive();
        Self {
            start: Some(self.start.unwrap_or(today - Duration::days(days))),
            end: Some(self.end.unwrap_or(today)),
        }
    }
}

/// Source-specific selector carried by a [`CollectionRequest`].
#[derive(Debug, Clone)]
pub enum SourceFilter {
    /// No extra selector (mail).
    None,
    /// Full-text search term (documents).
    SearchTerm(String),
    /// Project key plus optional team-member identities (issue tracker).
    Project { key: String, members: Vec<String> },
    /// Channel ids plus optional author allow-list (chat).
    Channels { ids: Vec<String>, authors: Vec<String> },
}

impl SourceFilter {
    /// Split a comma-separated CLI argument into trimmed, non-empty entries.
    pub fn parse_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Snapshot of the process environment taken during request resolution.
///
/// Collectors never read `std::env` directly; credentials are resolved from
/// this snapshot so the resolution step is testable with fabricated values.
#[derive(Debug, Clone, Default)]
pub struct EnvVars(HashMap<String, String>);

impl EnvVars {
    pub fn from_process() -> Self {
        Self(std::env::vars().collect())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl FromIterator<(String, String)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolved, immutable input to a single collector run.
///
/// Fully determined before any network call is made.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub window: DateRange,
    pub output_path: PathBuf,
    pub log_dir: PathBuf,
    pub filter: SourceFilter,
    pub env: EnvVars,
}

/// What a successful collect produced: one formatted text block per retained
/// item, plus source-specific metadata for the output record.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Ordered text blocks, upstream listing order, one per retained item.
    pub blocks: Vec<String>,
    /// Extra output fields (e.g. `search_query`, `project`, `channel_count`).
    pub extra: serde_json::Map<String, Value>,
    /// Overrides the source default `raw_text` when no blocks were retained.
    pub empty_text: Option<String>,
}

impl Harvest {
    pub fn new(blocks: Vec<String>) -> Self {
        Self {
            blocks,
            extra: serde_json::Map::new(),
            empty_text: None,
        }
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn with_empty_text(mut self, text: &str) -> Self {
        self.empty_text = Some(text.to_string());
        self
    }
}

/// Uniform error taxonomy, serialized into the output record's `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredentials,
    InvalidCredentials,
    ApiFailure,
    UnexpectedError,
}

/// Top-level failure of a collector run.
///
/// Per-item enrichment failures are never represented here; they are logged
/// and recovered inline. Anything of this type short-circuits the run and is
/// converted into a written, degraded [`CollectionResult`].
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{0} must be set")]
    MissingCredentials(&'static str),

    #[error("invalid {var}: {reason}")]
    InvalidCredentials { var: &'static str, reason: String },

    #[error("{0}")]
    Api(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl CollectError {
    /// Map onto the output taxonomy.
    ///
    /// Only the chat collector surfaces `unexpected_error`; the other three
    /// fold unclassified failures into `api_failure`.
    pub fn kind(&self, source: Source) -> ErrorKind {
        match self {
            CollectError::MissingCredentials(_) => ErrorKind::MissingCredentials,
            CollectError::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            CollectError::Api(_) => ErrorKind::ApiFailure,
            CollectError::Unexpected(_) if source == Source::Slack => ErrorKind::UnexpectedError,
            CollectError::Unexpected(_) => ErrorKind::ApiFailure,
        }
    }

    /// Whether the run should exit non-zero.
    ///
    /// A missing chat token means "nothing to collect", not an error: chat is
    /// an optional enrichment source for the aggregate pipeline.
    pub fn is_fatal(&self, source: Source) -> bool {
        !(matches!(self, CollectError::MissingCredentials(_)) && source == Source::Slack)
    }
}

impl From<reqwest::Error> for CollectError {
    fn from(err: reqwest::Error) -> Self {
        CollectError::Api(err.to_string())
    }
}

/// The single normalized output record, written exactly once per run.
#[derive(Debug, Serialize)]
pub struct CollectionResult {
    pub raw_text: String,
    pub source: Source,
    #[serde(flatten)]
    pub counts: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CollectionResult {
    /// Build the record for a completed run.
    ///
    /// `count` is the number of text blocks actually joined into `raw_text`;
    /// skipped items are excluded by construction.
    pub fn success(
        source: Source,
        raw_text: String,
        count: usize,
        extra: serde_json::Map<String, Value>,
        window: DateRange,
    ) -> Self {
        let mut counts = serde_json::Map::new();
        counts.insert(source.count_field().to_string(), Value::from(count));
        counts.extend(extra);
        Self {
            raw_text,
            source,
            counts,
            date_range: Some(window),
            error: None,
            error_message: None,
        }
    }

    /// Build the degraded record for a classified top-level failure.
    pub fn failure(source: Source, kind: ErrorKind, message: Option<String>) -> Self {
        Self {
            raw_text: source.error_text(kind),
            source,
            counts: serde_json::Map::new(),
            date_range: None,
            error: Some(kind),
            error_message: message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tags_match_contract() {
        assert_eq!(Source::CogEmails.tag(), "cog_emails");
        assert_eq!(Source::Gdocs.tag(), "gdocs");
        assert_eq!(Source::Jira.tag(), "jira");
        assert_eq!(Source::Slack.tag(), "slack");
        assert_eq!(
            serde_json::to_value(Source::CogEmails).unwrap(),
            serde_json::json!("cog_emails")
        );
    }

    #[test]
    fn error_text_placeholders() {
        assert_eq!(
            Source::CogEmails.error_text(ErrorKind::MissingCredentials),
            "No CoG emails - missing credentials"
        );
        assert_eq!(
            Source::Slack.error_text(ErrorKind::MissingCredentials),
            "No Slack data - credentials not configured"
        );
        assert_eq!(
            Source::Gdocs.error_text(ErrorKind::InvalidCredentials),
            "No Google Docs data - invalid credentials"
        );
        assert_eq!(
            Source::Jira.error_text(ErrorKind::ApiFailure),
            "No JIRA data - API error"
        );
        assert_eq!(
            Source::Slack.error_text(ErrorKind::UnexpectedError),
            "No Slack data - unexpected error"
        );
    }

    #[test]
    fn unexpected_errors_fold_into_api_failure_except_chat() {
        let err = CollectError::Unexpected(anyhow::anyhow!("boom"));
        assert_eq!(err.kind(Source::Jira), ErrorKind::ApiFailure);
        assert_eq!(err.kind(Source::Slack), ErrorKind::UnexpectedError);
    }

    #[test]
    fn missing_chat_token_is_not_fatal() {
        let err = CollectError::MissingCredentials("SLACK_BOT_TOKEN");
        assert!(!err.is_fatal(Source::Slack));
        assert!(err.is_fatal(Source::CogEmails));

        let invalid = CollectError::InvalidCredentials {
            var: "GOOGLE_TOKEN",
            reason: "unparseable".to_string(),
        };
        assert!(invalid.is_fatal(Source::Slack));
    }

    #[test]
    fn success_record_shape() {
        let mut extra = serde_json::Map::new();
        extra.insert("project".to_string(), serde_json::json!("OPS"));
        let window = DateRange::new(
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()),
        );
        let result = CollectionResult::success(Source::Jira, String::new(), 0, extra, window);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["source"], "jira");
        assert_eq!(value["issue_count"], 0);
        assert_eq!(value["project"], "OPS");
        assert_eq!(value["raw_text"], "");
        assert_eq!(value["date_range"]["start"], "2024-01-01");
        assert_eq!(value["date_range"]["end"], "2024-01-07");
        assert!(value.get("error").is_none());
        assert!(value.get("error_message").is_none());
    }

    #[test]
    fn unbounded_window_echoes_nulls() {
        let result = CollectionResult::success(
            Source::CogEmails,
            String::new(),
            0,
            serde_json::Map::new(),
            DateRange::default(),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["date_range"]["start"].is_null());
        assert!(value["date_range"]["end"].is_null());
    }

    #[test]
    fn failure_record_shape() {
        let result = CollectionResult::failure(
            Source::Slack,
            ErrorKind::ApiFailure,
            Some("auth.test failed: invalid_auth".to_string()),
        );
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["source"], "slack");
        assert_eq!(value["error"], "api_failure");
        assert_eq!(value["error_message"], "auth.test failed: invalid_auth");
        assert_eq!(value["raw_text"], "No Slack data - API error");
        assert!(value.get("message_count").is_none());
        assert!(value.get("date_range").is_none());
    }

    #[test]
    fn parse_list_trims_and_drops_empties() {
        assert_eq!(
            SourceFilter::parse_list("a, b ,,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(SourceFilter::parse_list("").is_empty());
        assert!(SourceFilter::parse_list(" , ").is_empty());
    }

    #[test]
    fn or_last_days_fills_absent_ends() {
        let today = Utc::now().date_naive();
        let filled = DateRange::default().or_last_days(7);
        assert_eq!(filled.end, Some(today));
        assert_eq!(filled.start, Some(today - Duration::days(7)));

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let partial = DateRange::new(Some(start), None).or_last_days(7);
        assert_eq!(partial.start, Some(start));
        assert_eq!(partial.end, Some(today));
    }
}
