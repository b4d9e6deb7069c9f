//! Documents collector (Google Drive + Docs REST APIs).
//!
//! Finds Google Docs matching a full-text search term via the Drive files
//! listing, then enriches each hit with a content preview from the Docs API.
//! A failed preview fetch keeps the document without its preview line.
//!
//! Credentials: `GDOCS_SERVICE_ACCOUNT`, a service-account key JSON blob
//! exchanged for a Drive+Docs-scoped access token at collect time.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::credentials::DocsCredentials;
use crate::http::{get_json, truncate};
use crate::logging::RunLogger;
use crate::models::{CollectError, CollectionRequest, Harvest, Source, SourceFilter};
use crate::query;
use crate::traits::Collector;

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DOCS_URL: &str = "https://docs.googleapis.com/v1/documents";
const LIST_FIELDS: &str =
    "files(id, name, createdTime, modifiedTime, webViewLink, owners, lastModifyingUser)";
const PAGE_SIZE: &str = "100";
const PREVIEW_CHARS: usize = 200;

pub const DEFAULT_SEARCH_TERM: &str = "cog";

pub struct DocsCollector;

#[async_trait]
impl Collector for DocsCollector {
    fn source(&self) -> Source {
        Source::Gdocs
    }

    async fn collect(
        &self,
        request: &CollectionRequest,
        logger: &RunLogger,
    ) -> Result<Harvest, CollectError> {
        let creds = DocsCredentials::resolve(&request.env)?;
        let token = creds.access_token().await?;

        let term = match &request.filter {
            SourceFilter::SearchTerm(term) => term.as_str(),
            _ => DEFAULT_SEARCH_TERM,
        };
        let query = query::drive_query(term, &request.window);
        logger.log(&format!("Executing query: {}", query));

        let client = reqwest::Client::new();
        let listing = get_json(
            &client,
            &token,
            FILES_URL,
            &[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ],
        )
        .await?;

        let files = listing["files"].as_array().cloned().unwrap_or_default();
        logger.log(&format!("Found {} documents", files.len()));

        let mut blocks = Vec::with_capacity(files.len());
        for file in &files {
            let mut block = format_document(file);
            if let Some(id) = file["id"].as_str() {
                let url = format!("{}/{}", DOCS_URL, id);
                match get_json(&client, &token, &url, &[]).await {
                    Ok(document) => {
                        if let Some(preview) = preview_line(&document) {
                            block.push_str(&preview);
                        }
                    }
                    Err(err) => {
                        logger.log(&format!(
                            "  WARNING: Could not fetch content for {}: {}",
                            id, err
                        ));
                    }
                }
            }
            blocks.push(block);
        }

        Ok(Harvest::new(blocks).with_extra("search_query", json!(term)))
    }
}

/// Render one Drive listing entry into its metadata block (no preview line).
fn format_document(file: &Value) -> String {
    let name = file["name"].as_str().unwrap_or("Untitled");
    let link = file["webViewLink"].as_str().unwrap_or("");
    let created = file["createdTime"].as_str().unwrap_or("");
    let modified = file["modifiedTime"].as_str().unwrap_or("");
    let owner = file["owners"][0]["displayName"].as_str().unwrap_or("Unknown");
    let modified_by = file["lastModifyingUser"]["displayName"]
        .as_str()
        .unwrap_or(owner);

    format!(
        "[{}]({})\n  Created: {}\n  Last Modified: {}\n  Owner: {}\n  Last Modified By: {}\n",
        name, link, created, modified, owner, modified_by
    )
}

/// Build the `  Preview: ...` line from a fetched document body, or `None`
/// when the document has no extractable text.
fn preview_line(document: &Value) -> Option<String> {
    let text = document_text(document);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let flattened = truncate(trimmed, PREVIEW_CHARS).replace('\n', " ");
    Some(format!("  Preview: {}...\n", flattened))
}

/// Concatenate every text run in the document body, in order.
fn document_text(document: &Value) -> String {
    let mut text = String::new();
    if let Some(content) = document["body"]["content"].as_array() {
        for element in content {
            if let Some(runs) = element["paragraph"]["elements"].as_array() {
                for run in runs {
                    if let Some(chunk) = run["textRun"]["content"].as_str() {
                        text.push_str(chunk);
                    }
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_document_metadata_block() {
        let file = json!({
            "id": "doc1",
            "name": "CoG Weekly Plan",
            "createdTime": "2024-01-02T09:00:00.000Z",
            "modifiedTime": "2024-01-05T14:30:00.000Z",
            "webViewLink": "https://docs.google.com/document/d/doc1/edit",
            "owners": [{ "displayName": "Alice Example" }],
            "lastModifyingUser": { "displayName": "Bob Example" }
        });
        assert_eq!(
            format_document(&file),
            "[CoG Weekly Plan](https://docs.google.com/document/d/doc1/edit)\n\
             \x20 Created: 2024-01-02T09:00:00.000Z\n\
             \x20 Last Modified: 2024-01-05T14:30:00.000Z\n\
             \x20 Owner: Alice Example\n\
             \x20 Last Modified By: Bob Example\n"
        );
    }

    #[test]
    fn missing_modifier_falls_back_to_owner() {
        let file = json!({
            "name": "Plan",
            "owners": [{ "displayName": "Alice Example" }]
        });
        let block = format_document(&file);
        assert!(block.contains("  Owner: Alice Example\n"));
        assert!(block.contains("  Last Modified By: Alice Example\n"));
    }

    #[test]
    fn missing_everything_uses_placeholders() {
        let block = format_document(&json!({}));
        assert!(block.starts_with("[Untitled]()\n"));
        assert!(block.contains("  Owner: Unknown\n"));
    }

    #[test]
    fn document_text_concatenates_runs() {
        let document = json!({
            "body": { "content": [
                { "sectionBreak": {} },
                { "paragraph": { "elements": [
                    { "textRun": { "content": "First line.\n" } },
                    { "textRun": { "content": "Second " } },
                    { "inlineObjectElement": {} }
                ]}},
                { "paragraph": { "elements": [
                    { "textRun": { "content": "part.\n" } }
                ]}}
            ]}
        });
        assert_eq!(document_text(&document), "First line.\nSecond part.\n");
    }

    #[test]
    fn preview_flattens_newlines_and_truncates() {
        let document = json!({
            "body": { "content": [
                { "paragraph": { "elements": [
                    { "textRun": { "content": "line one\nline two\n" } }
                ]}}
            ]}
        });
        assert_eq!(
            preview_line(&document).unwrap(),
            "  Preview: line one line two...\n"
        );

        let long = "x".repeat(500);
        let document = json!({
            "body": { "content": [
                { "paragraph": { "elements": [
                    { "textRun": { "content": long } }
                ]}}
            ]}
        });
        let line = preview_line(&document).unwrap();
        assert_eq!(line.len(), "  Preview: ".len() + PREVIEW_CHARS + "...\n".len());
    }

    #[test]
    fn empty_document_has_no_preview() {
        assert!(preview_line(&json!({})).is_none());
        let blank = json!({
            "body": { "content": [
                { "paragraph": { "elements": [
                    { "textRun": { "content": "  \n" } }
                ]}}
            ]}
        });
        assert!(preview_line(&blank).is_none());
    }
}
