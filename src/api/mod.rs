//! api
//!
//! HTTP client for the platform web API.
//!
//! # Design
//!
//! Every method is a form-encoded POST to `{host}/api/{method}` returning a
//! JSON envelope with an `ok` boolean. When `ok` is false the `error` field
//! carries a snake_case code which is mapped through the error catalog so
//! callers can match on it (see [`crate::error::codes`]).
//!
//! The host is mutable behind the client: token rotation must target the
//! host stored on each credential record and restore the previous host
//! afterwards, so [`ApiClient::set_host`] uses interior mutability rather
//! than requiring `&mut` access everywhere.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::auth::Auth;
use crate::error::{codes, Error, Result};

/// Production API host.
pub const DEFAULT_PROD_HOST: &str = "https://slack.com";

/// Development API host, selected by the `--slackdev` flag.
pub const DEFAULT_DEV_HOST: &str = "https://dev.slack.com";

/// Per-call HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether a host points at a development instance, i.e. its first
/// hostname label starts with `dev` (`https://dev.slack.com`,
/// `https://dev1234.slack.com`).
pub fn is_api_host_dev(host: &str) -> bool {
    let hostname = host
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    hostname
        .split(['/', ':'])
        .next()
        .and_then(|name| name.split('.').next())
        .map_or(false, |label| label.starts_with("dev"))
}

const SESSION_VALIDATE_METHOD: &str = "auth.test";
const REVOKE_TOKEN_METHOD: &str = "auth.revoke";
const ROTATE_TOKEN_METHOD: &str = "tooling.tokens.rotate";

/// Session and credential operations against the web API.
///
/// The trait seam lets the credential store be tested without a network.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Validate a token and describe its session (`auth.test`).
    async fn validate_session(&self, token: &str) -> Result<AuthSession>;

    /// Revoke a token (`auth.revoke`).
    async fn revoke_token(&self, token: &str) -> Result<()>;

    /// Exchange a refresh token for a fresh access token
    /// (`tooling.tokens.rotate`).
    async fn rotate_token(&self, auth: &Auth) -> Result<RotateTokenResult>;

    /// The currently configured API host.
    fn host(&self) -> String;

    /// Point subsequent calls at a different host.
    fn set_host(&self, host: &str);
}

/// Session details returned by `auth.test`.
///
/// No property is guaranteed in the response, so everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSession {
    #[serde(rename = "user")]
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub team_id: Option<String>,
    #[serde(rename = "team")]
    pub team_name: Option<String>,
    pub enterprise_id: Option<String>,
    pub is_enterprise_install: Option<bool>,
    pub url: Option<String>,
}

/// Fresh credentials returned by `tooling.tokens.rotate`.
#[derive(Debug, Clone, Deserialize)]
pub struct RotateTokenResult {
    pub token: String,
    pub refresh_token: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Envelope shared by all web API responses.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Client for the platform web API.
pub struct ApiClient {
    client: Client,
    host: RwLock<String>,
}

impl ApiClient {
    /// Create a client pointed at the given host.
    pub fn new(host: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            host: RwLock::new(host.to_string()),
        }
    }

    /// Build the URL for an API method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/api/{}", self.host(), method)
    }

    /// POST a form to an API method and decode the response body.
    async fn post_form(&self, method: &str, form: &[(&str, &str)]) -> Result<serde_json::Value> {
        let url = self.method_url(method);
        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                Error::new(codes::HTTP_REQUEST_FAILED)
                    .with_message(format!("Request to {} failed", method))
                    .with_source(e)
            })?;

        let body: serde_json::Value = response.json().await.map_err(|e| {
            Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message(format!("Invalid response from {}", method))
                .with_source(e)
        })?;

        let envelope: ApiEnvelope = serde_json::from_value(body.clone()).map_err(|e| {
            Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message(format!("Invalid response envelope from {}", method))
                .with_source(e)
        })?;

        if !envelope.ok {
            let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            let message = envelope
                .description
                .unwrap_or_else(|| format!("The API method {} returned \"{}\"", method, code));
            return Err(Error::new(code).with_message(message));
        }

        Ok(body)
    }
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn validate_session(&self, token: &str) -> Result<AuthSession> {
        let body = self
            .post_form(SESSION_VALIDATE_METHOD, &[("token", token)])
            .await?;
        let session: AuthSession = serde_json::from_value(body).map_err(|e| {
            Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message("Invalid session in auth.test response")
                .with_source(e)
        })?;
        if session.user_id.is_none() {
            return Err(Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message("auth.test response is missing a user_id"));
        }
        Ok(session)
    }

    async fn revoke_token(&self, token: &str) -> Result<()> {
        self.post_form(REVOKE_TOKEN_METHOD, &[("token", token)])
            .await?;
        Ok(())
    }

    async fn rotate_token(&self, auth: &Auth) -> Result<RotateTokenResult> {
        let body = self
            .post_form(
                ROTATE_TOKEN_METHOD,
                &[
                    ("refresh_token", auth.refresh_token.as_str()),
                    ("team_id", auth.team_id.as_str()),
                ],
            )
            .await?;
        serde_json::from_value(body).map_err(|e| {
            Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message("Invalid tooling.tokens.rotate response")
                .with_source(e)
        })
    }

    fn host(&self) -> String {
        self.host.read().map(|h| h.clone()).unwrap_or_default()
    }

    fn set_host(&self, host: &str) {
        if let Ok(mut current) = self.host.write() {
            *current = host.to_string();
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("host", &self.host()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod dev_hosts {
        use super::*;

        #[test]
        fn dev_prefixed_hosts_are_recognized() {
            assert!(is_api_host_dev(DEFAULT_DEV_HOST));
            assert!(is_api_host_dev("https://dev1234.slack.com"));
            assert!(is_api_host_dev("https://dev.slack.com:8443/path"));
        }

        #[test]
        fn production_hosts_are_not() {
            assert!(!is_api_host_dev(DEFAULT_PROD_HOST));
            assert!(!is_api_host_dev("https://acme.slack.com"));
            assert!(!is_api_host_dev("https://slack.com/devtools"));
        }
    }

    #[test]
    fn method_url_joins_host_and_method() {
        let client = ApiClient::new("https://slack.com");
        assert_eq!(
            client.method_url("auth.test"),
            "https://slack.com/api/auth.test"
        );
    }

    #[test]
    fn set_host_changes_subsequent_urls() {
        let client = ApiClient::new(DEFAULT_PROD_HOST);
        client.set_host("https://dev1234.slack.com");
        assert_eq!(
            client.method_url("auth.revoke"),
            "https://dev1234.slack.com/api/auth.revoke"
        );
    }

    #[test]
    fn envelope_decodes_error_fields() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"ok":false,"error":"invalid_auth"}"#).expect("decode");
        assert!(!envelope.ok);
        assert_eq!(envelope.error.as_deref(), Some("invalid_auth"));
    }

    #[test]
    fn rotate_result_decodes_exp_field() {
        let result: RotateTokenResult = serde_json::from_str(
            r#"{"token":"xoxe.xoxp-new","refresh_token":"xoxe-refresh","exp":1700000000}"#,
        )
        .expect("decode");
        assert_eq!(result.expires_at, 1_700_000_000);
        assert_eq!(result.token, "xoxe.xoxp-new");
    }

    #[test]
    fn session_decodes_renamed_fields() {
        let session: AuthSession = serde_json::from_str(
            r#"{"user":"dev","user_id":"U1","team":"acme","team_id":"T12345678","url":"https://acme.slack.com/"}"#,
        )
        .expect("decode");
        assert_eq!(session.user_name.as_deref(), Some("dev"));
        assert_eq!(session.team_name.as_deref(), Some("acme"));
        assert_eq!(session.team_id.as_deref(), Some("T12345678"));
    }
}
