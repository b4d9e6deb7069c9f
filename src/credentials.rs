//! Credential resolution for all four collectors.
//!
//! Each collector resolves exactly one secret bundle from a named environment
//! variable, taken from the [`EnvVars`] snapshot on the request. Resolution is
//! pure (no network): a variable that is absent or blank (orchestrators often
//! export empty vars) maps to [`CollectError::MissingCredentials`], one that
//! is present but unparseable maps to
//! [`CollectError::InvalidCredentials`]. Google access-token acquisition
//! happens afterwards, at collect time, and its failures classify as API
//! failures.

use serde::Deserialize;
use yup_oauth2::authorized_user::AuthorizedUserSecret;
use yup_oauth2::{AuthorizedUserAuthenticator, ServiceAccountAuthenticator, ServiceAccountKey};

use crate::models::{CollectError, EnvVars};

pub const MAIL_TOKEN_VAR: &str = "GOOGLE_TOKEN";
pub const DOCS_KEY_VAR: &str = "GDOCS_SERVICE_ACCOUNT";
pub const JIRA_TOKEN_VAR: &str = "JIRA_API_TOKEN";
pub const JIRA_BASE_URL_VAR: &str = "JIRA_BASE_URL";
pub const SLACK_TOKEN_VAR: &str = "SLACK_BOT_TOKEN";

pub const DEFAULT_JIRA_BASE_URL: &str = "https://issues.redhat.com";

const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DOCS_SCOPE: &str = "https://www.googleapis.com/auth/documents.readonly";

/// Read a required variable, treating empty and whitespace-only values the
/// same as absent ones.
fn required<'a>(env: &'a EnvVars, var: &'static str) -> Result<&'a str, CollectError> {
    match env.get(var) {
        Some(raw) if !raw.trim().is_empty() => Ok(raw),
        _ => Err(CollectError::MissingCredentials(var)),
    }
}

/// Shape of the `GOOGLE_TOKEN` JSON blob (OAuth refresh-token bundle).
#[derive(Debug, Clone, Deserialize)]
struct GoogleTokenBundle {
    refresh_token: String,
    client_id: String,
    client_secret: String,
}

/// Mail collector credentials: an OAuth authorized-user refresh bundle.
#[derive(Debug, Clone)]
pub struct MailCredentials {
    secret: AuthorizedUserSecret,
}

impl MailCredentials {
    pub fn resolve(env: &EnvVars) -> Result<Self, CollectError> {
        let raw = required(env, MAIL_TOKEN_VAR)?;
        let bundle: GoogleTokenBundle =
            serde_json::from_str(raw).map_err(|e| CollectError::InvalidCredentials {
                var: MAIL_TOKEN_VAR,
                reason: e.to_string(),
            })?;
        Ok(Self {
            secret: AuthorizedUserSecret {
                client_id: bundle.client_id,
                client_secret: bundle.client_secret,
                refresh_token: bundle.refresh_token,
                key_type: "authorized_user".to_string(),
            },
        })
    }

    /// Exchange the refresh token for a Gmail-scoped access token.
    pub async fn access_token(&self) -> Result<String, CollectError> {
        let auth = AuthorizedUserAuthenticator::builder(self.secret.clone())
            .build()
            .await
            .map_err(|e| CollectError::Api(format!("failed to build Google authenticator: {}", e)))?;
        let token = auth
            .token(&[GMAIL_SCOPE])
            .await
            .map_err(|e| CollectError::Api(format!("Google token exchange failed: {}", e)))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| CollectError::Api("Google token response carried no access token".into()))
    }
}

/// Documents collector credentials: a service-account key.
#[derive(Debug, Clone)]
pub struct DocsCredentials {
    key: ServiceAccountKey,
}

impl DocsCredentials {
    pub fn resolve(env: &EnvVars) -> Result<Self, CollectError> {
        let raw = required(env, DOCS_KEY_VAR)?;
        let key: ServiceAccountKey =
            serde_json::from_str(raw).map_err(|e| CollectError::InvalidCredentials {
                var: DOCS_KEY_VAR,
                reason: e.to_string(),
            })?;
        Ok(Self { key })
    }

    /// Obtain a Drive+Docs-scoped access token for the service account.
    pub async fn access_token(&self) -> Result<String, CollectError> {
        let auth = ServiceAccountAuthenticator::builder(self.key.clone())
            .build()
            .await
            .map_err(|e| CollectError::Api(format!("failed to build Google authenticator: {}", e)))?;
        let token = auth
            .token(&[DRIVE_SCOPE, DOCS_SCOPE])
            .await
            .map_err(|e| CollectError::Api(format!("Google token exchange failed: {}", e)))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| CollectError::Api("Google token response carried no access token".into()))
    }
}

/// Issue-tracker credentials: a personal access token plus the server base URL.
#[derive(Debug, Clone)]
pub struct JiraCredentials {
    pub token: String,
    pub base_url: String,
}

impl JiraCredentials {
    pub fn resolve(env: &EnvVars) -> Result<Self, CollectError> {
        let token = required(env, JIRA_TOKEN_VAR)?;
        let base_url = env
            .get(JIRA_BASE_URL_VAR)
            .unwrap_or(DEFAULT_JIRA_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            token: token.to_string(),
            base_url,
        })
    }
}

/// Chat collector credentials: a bot token.
#[derive(Debug, Clone)]
pub struct SlackCredentials {
    pub bot_token: String,
}

impl SlackCredentials {
    pub fn resolve(env: &EnvVars) -> Result<Self, CollectError> {
        let token = required(env, SLACK_TOKEN_VAR)?;
        Ok(Self {
            bot_token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mail_missing_token() {
        let err = MailCredentials::resolve(&env(&[])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(MAIL_TOKEN_VAR)));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = MailCredentials::resolve(&env(&[(MAIL_TOKEN_VAR, "")])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(MAIL_TOKEN_VAR)));

        let err = DocsCredentials::resolve(&env(&[(DOCS_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(DOCS_KEY_VAR)));
    }

    #[test]
    fn mail_unparseable_token() {
        let err =
            MailCredentials::resolve(&env(&[(MAIL_TOKEN_VAR, "not json")])).unwrap_err();
        assert!(matches!(err, CollectError::InvalidCredentials { var: MAIL_TOKEN_VAR, .. }));
    }

    #[test]
    fn mail_bundle_missing_fields_is_invalid() {
        let err = MailCredentials::resolve(&env(&[(MAIL_TOKEN_VAR, r#"{"client_id":"x"}"#)]))
            .unwrap_err();
        assert!(matches!(err, CollectError::InvalidCredentials { var: MAIL_TOKEN_VAR, .. }));
    }

    #[test]
    fn mail_valid_bundle() {
        let blob = r#"{
            "access_token": "ignored",
            "refresh_token": "1//r",
            "client_id": "c.apps.googleusercontent.com",
            "client_secret": "s"
        }"#;
        assert!(MailCredentials::resolve(&env(&[(MAIL_TOKEN_VAR, blob)])).is_ok());
    }

    #[test]
    fn docs_unparseable_key() {
        let err = DocsCredentials::resolve(&env(&[(DOCS_KEY_VAR, "{")])).unwrap_err();
        assert!(matches!(err, CollectError::InvalidCredentials { var: DOCS_KEY_VAR, .. }));
    }

    #[test]
    fn jira_defaults_base_url_and_trims_slash() {
        let creds = JiraCredentials::resolve(&env(&[(JIRA_TOKEN_VAR, "t0k3n")])).unwrap();
        assert_eq!(creds.base_url, DEFAULT_JIRA_BASE_URL);

        let creds = JiraCredentials::resolve(&env(&[
            (JIRA_TOKEN_VAR, "t0k3n"),
            (JIRA_BASE_URL_VAR, "https://jira.example.com/"),
        ]))
        .unwrap();
        assert_eq!(creds.base_url, "https://jira.example.com");
    }

    #[test]
    fn jira_blank_token_is_missing() {
        let err = JiraCredentials::resolve(&env(&[(JIRA_TOKEN_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(JIRA_TOKEN_VAR)));
    }

    #[test]
    fn slack_missing_and_blank_tokens() {
        let err = SlackCredentials::resolve(&env(&[])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(SLACK_TOKEN_VAR)));

        let err = SlackCredentials::resolve(&env(&[(SLACK_TOKEN_VAR, "")])).unwrap_err();
        assert!(matches!(err, CollectError::MissingCredentials(SLACK_TOKEN_VAR)));
    }
}
