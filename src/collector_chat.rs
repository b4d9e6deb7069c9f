//! Chat collector (Slack Web API).
//!
//! Reads the history of an explicit channel list over the window, resolves
//! each author's profile, and keeps only human messages from allow-listed
//! authors. Degradation here is the most permissive of the four collectors:
//! a channel whose history cannot be read is skipped, a message whose author
//! cannot be resolved is skipped, and the run still exits zero.
//!
//! Credentials: `SLACK_BOT_TOKEN`. A missing token is treated as "chat not
//! configured" and is the one non-fatal credential failure in the system.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Value};

use crate::credentials::SlackCredentials;
use crate::logging::RunLogger;
use crate::models::{CollectError, CollectionRequest, Harvest, Source, SourceFilter};
use crate::query;
use crate::traits::Collector;

const API_BASE: &str = "https://slack.com/api";
const HISTORY_LIMIT: &str = "200";

/// Message subtypes that are never human activity.
const SKIPPED_SUBTYPES: &[&str] = &["bot_message", "channel_join", "channel_leave"];

pub struct ChatCollector;

#[async_trait]
impl Collector for ChatCollector {
    fn source(&self) -> Source {
        Source::Slack
    }

    async fn collect(
        &self,
        request: &CollectionRequest,
        logger: &RunLogger,
    ) -> Result<Harvest, CollectError> {
        let creds = SlackCredentials::resolve(&request.env)?;

        let (channels, authors) = match &request.filter {
            SourceFilter::Channels { ids, authors } => (ids.as_slice(), authors.as_slice()),
            _ => (&[][..], &[][..]),
        };
        if channels.is_empty() {
            logger.log("No channels specified");
            return Ok(Harvest::new(vec![])
                .with_extra("channel_count", json!(0))
                .with_empty_text("No Slack data - no channels configured"));
        }

        let client = reqwest::Client::new();
        let identity = slack_call(&client, &creds.bot_token, API_BASE, "auth.test", &[]).await?;
        logger.log(&format!(
            "Authenticated as bot: {}",
            identity["user"].as_str().unwrap_or("unknown")
        ));

        let (oldest, latest) = query::slack_window(&request.window);
        let blocks = gather_channels(
            &client,
            &creds.bot_token,
            API_BASE,
            channels,
            authors,
            (oldest, latest),
            logger,
        )
        .await;

        Ok(Harvest::new(blocks).with_extra("channel_count", json!(channels.len())))
    }
}

/// Walk the channel list and accumulate formatted message blocks.
///
/// A channel whose history cannot be read contributes nothing and the walk
/// continues; a message whose author profile cannot be resolved is skipped.
async fn gather_channels(
    client: &reqwest::Client,
    token: &str,
    api_base: &str,
    channels: &[String],
    authors: &[String],
    (oldest, latest): (i64, i64),
    logger: &RunLogger,
) -> Vec<String> {
    let oldest = oldest.to_string();
    let latest = latest.to_string();

    let mut blocks = Vec::new();
    for channel in channels {
        logger.log(&format!("Fetching messages from channel {}", channel));

        let name = match slack_call(
            client,
            token,
            api_base,
            "conversations.info",
            &[("channel", channel.as_str())],
        )
        .await
        {
            Ok(info) => info["channel"]["name"]
                .as_str()
                .unwrap_or(channel)
                .to_string(),
            Err(err) => {
                logger.log(&format!(
                    "  WARNING: Could not get channel info for {}: {}",
                    channel, err
                ));
                channel.to_string()
            }
        };

        let history = match slack_call(
            client,
            token,
            api_base,
            "conversations.history",
            &[
                ("channel", channel.as_str()),
                ("oldest", oldest.as_str()),
                ("latest", latest.as_str()),
                ("limit", HISTORY_LIMIT),
            ],
        )
        .await
        {
            Ok(history) => history,
            Err(err) => {
                let text = err.to_string();
                logger.log(&format!(
                    "  ERROR: Failed to fetch messages from {}: {}",
                    channel, text
                ));
                if text.contains("not_in_channel") {
                    logger.log(&format!(
                        "  HINT: Bot needs to be invited to channel {}",
                        channel
                    ));
                }
                continue;
            }
        };

        let messages = history["messages"].as_array().cloned().unwrap_or_default();
        logger.log(&format!("  Found {} messages in #{}", messages.len(), name));

        for message in &messages {
            if should_skip(message) {
                continue;
            }
            let Some(user_id) = message["user"].as_str() else {
                continue;
            };
            let profile = match slack_call(
                client,
                token,
                api_base,
                "users.info",
                &[("user", user_id)],
            )
            .await
            {
                Ok(info) => info["user"].clone(),
                Err(err) => {
                    logger.log(&format!(
                        "  WARNING: Could not get user info for {}: {}",
                        user_id, err
                    ));
                    continue;
                }
            };
            if let Some(block) = accept_and_format(message, &name, &profile, authors) {
                blocks.push(block);
            }
        }
    }
    blocks
}

/// Call one Slack Web API method and unwrap its `ok` envelope.
async fn slack_call(
    client: &reqwest::Client,
    token: &str,
    api_base: &str,
    method: &str,
    params: &[(&str, &str)],
) -> Result<Value, CollectError> {
    let url = format!("{}/{}", api_base, method);
    let response = client
        .get(&url)
        .bearer_auth(token)
        .query(params)
        .send()
        .await?
        .json::<Value>()
        .await?;

    if response["ok"].as_bool() != Some(true) {
        let reason = response["error"].as_str().unwrap_or("unknown error");
        return Err(CollectError::Api(format!("{} failed: {}", method, reason)));
    }
    Ok(response)
}

/// Whether the message is a non-human event (bot post, join/leave marker).
fn should_skip(message: &Value) -> bool {
    match message["subtype"].as_str() {
        Some(subtype) => SKIPPED_SUBTYPES.contains(&subtype),
        None => false,
    }
}

/// Apply the author allow-list and render the retained message, in one step
/// so a rejected author never produces a block.
fn accept_and_format(
    message: &Value,
    channel_name: &str,
    profile: &Value,
    authors: &[String],
) -> Option<String> {
    let display = profile["profile"]["display_name"].as_str().unwrap_or("");
    let real = profile["real_name"].as_str().unwrap_or("");
    if !author_matches(authors, display, real) {
        return None;
    }
    Some(format_message(message, channel_name, display, real))
}

/// Case-insensitive substring match against either profile name; an empty
/// allow-list accepts everyone.
fn author_matches(authors: &[String], display: &str, real: &str) -> bool {
    if authors.is_empty() {
        return true;
    }
    let display = display.to_lowercase();
    let real = real.to_lowercase();
    authors.iter().any(|author| {
        let needle = author.to_lowercase();
        display.contains(&needle) || real.contains(&needle)
    })
}

fn format_message(message: &Value, channel_name: &str, display: &str, real: &str) -> String {
    let author = if display.is_empty() { real } else { display };
    let timestamp = message["ts"]
        .as_str()
        .and_then(|ts| ts.parse::<f64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let replies = match message["reply_count"].as_u64() {
        Some(n) if n > 0 => format!(" [{} replies]", n),
        _ => String::new(),
    };
    let text = message["text"].as_str().unwrap_or("");

    format!(
        "#{} - {} ({}){}:\n{}\n",
        channel_name, author, timestamp, replies, text
    )
}
