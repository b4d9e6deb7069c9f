//! Mail collector (Gmail REST API).
//!
//! Searches for meeting-notes emails with a fixed sender/subject predicate,
//! then fetches each message in full to extract headers and body. A failed
//! per-message fetch keeps the item with degraded fields; it never aborts the
//! run.
//!
//! Credentials: `GOOGLE_TOKEN`, a JSON OAuth bundle (refresh token, client
//! id/secret) exchanged for a Gmail-scoped access token at collect time.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use crate::credentials::MailCredentials;
use crate::http::get_json;
use crate::logging::RunLogger;
use crate::models::{CollectError, CollectionRequest, Harvest, Source};
use crate::query;
use crate::traits::Collector;

const MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";
const PAGE_SIZE: &str = "100";

pub struct MailCollector;

#[async_trait]
impl Collector for MailCollector {
    fn source(&self) -> Source {
        Source::CogEmails
    }

    async fn collect(
        &self,
        request: &CollectionRequest,
        logger: &RunLogger,
    ) -> Result<Harvest, CollectError> {
        let creds = MailCredentials::resolve(&request.env)?;
        let token = creds.access_token().await?;

        let query = query::gmail_query(&request.window);
        logger.log(&format!("Executing Gmail query: {}", query));

        let client = reqwest::Client::new();
        let listing = get_json(
            &client,
            &token,
            MESSAGES_URL,
            &[("q", query.as_str()), ("maxResults", PAGE_SIZE)],
        )
        .await?;

        let ids: Vec<String> = listing["messages"]
            .as_array()
            .map(|msgs| {
                msgs.iter()
                    .filter_map(|m| m["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        logger.log(&format!("Found {} CoG emails", ids.len()));

        let blocks = fetch_blocks(&client, &token, MESSAGES_URL, &ids, logger).await;
        Ok(Harvest::new(blocks))
    }
}

/// Fetch and render each listed message. A failed fetch keeps the item with
/// degraded fields, so the block count always matches the listing.
async fn fetch_blocks(
    client: &reqwest::Client,
    token: &str,
    base_url: &str,
    ids: &[String],
    logger: &RunLogger,
) -> Vec<String> {
    let mut blocks = Vec::with_capacity(ids.len());
    for id in ids {
        let url = format!("{}/{}", base_url, id);
        match get_json(client, token, &url, &[("format", "full")]).await {
            Ok(message) => blocks.push(format_email(&message)),
            Err(err) => {
                logger.log(&format!("  WARNING: Could not fetch email {}: {}", id, err));
                blocks.push(render_email("Unknown", "(unavailable)", "", ""));
            }
        }
    }
    blocks
}

/// Render one fetched message into its fixed text block.
fn format_email(message: &Value) -> String {
    let payload = &message["payload"];
    let from = header_value(payload, "From").unwrap_or("Unknown");
    let subject = header_value(payload, "Subject").unwrap_or("No Subject");
    let date = header_value(payload, "Date").unwrap_or("");
    let body = extract_body(payload);
    render_email(from, subject, date, &body)
}

fn render_email(from: &str, subject: &str, date: &str, body: &str) -> String {
    format!(
        "From: {}\nSubject: {}\nDate: {}\n\n{}\n{}\n",
        from,
        subject,
        date,
        body,
        "-".repeat(80)
    )
}

/// Look up a header by name in the message payload.
fn header_value<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    payload["headers"].as_array()?.iter().find_map(|h| {
        (h["name"].as_str() == Some(name))
            .then(|| h["value"].as_str())
            .flatten()
    })
}

/// Extract the message body: first `text/plain` part wins, `text/html` is the
/// fallback, and single-part messages carry the body on the payload itself.
fn extract_body(payload: &Value) -> String {
    if let Some(parts) = payload["parts"].as_array() {
        let mut body = String::new();
        for part in parts {
            let mime = part["mimeType"].as_str().unwrap_or("");
            let data = part["body"]["data"].as_str();
            match (mime, data) {
                ("text/plain", Some(data)) => {
                    if let Some(text) = decode_body(data) {
                        return text;
                    }
                }
                ("text/html", Some(data)) if body.is_empty() => {
                    if let Some(text) = decode_body(data) {
                        body = text;
                    }
                }
                _ => {}
            }
        }
        body
    } else {
        payload["body"]["data"]
            .as_str()
            .and_then(decode_body)
            .unwrap_or_default()
    }
}

/// Decode Gmail's base64url body data (tolerating padded and unpadded forms).
fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')).ok()?;
    Some(String::from_utf8_lossy(&bytes).to_string())
}
