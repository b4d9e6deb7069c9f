//! Thin bearer-auth JSON GET helper shared by the REST collectors.

use reqwest::Client;
use serde_json::Value;

use crate::models::CollectError;

/// Issue a bearer-authenticated GET and parse the JSON body.
///
/// Non-2xx statuses become [`CollectError::Api`] carrying the status and a
/// truncated response body; transport errors convert the same way.
pub async fn get_json(
    client: &Client,
    token: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Value, CollectError> {
    let resp = client
        .get(url)
        .bearer_auth(token)
        .query(params)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CollectError::Api(format!(
            "HTTP {} from {}: {}",
            status,
            url,
            truncate(&body, 500)
        )));
    }

    Ok(resp.json::<Value>().await?)
}

/// First `max` characters of a response body, for error messages.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
