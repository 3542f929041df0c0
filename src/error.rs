//! error
//!
//! Tagged error model shared across the CLI.
//!
//! # Design
//!
//! Every failure carries a machine-readable code, a human message, and an
//! optional remediation hint. Remote API error codes are mapped through a
//! fixed catalog so users see actionable text instead of raw codes.
//!
//! Some authentication codes are intentionally non-fatal: an already
//! revoked or expired token should not stop `logout` from removing the
//! local record. [`Error::is_known_auth_error`] identifies those.

use std::fmt;

/// Known error codes, shared between the remote API and the CLI itself.
pub mod codes {
    pub const ALREADY_LOGGED_OUT: &str = "already_logged_out";
    pub const CLI_AUTOUPDATE: &str = "cli_autoupdate_error";
    pub const CREDENTIALS_NOT_FOUND: &str = "credentials_not_found";
    pub const HOME_DIRECTORY_ACCESS_FAILED: &str = "home_directory_access_failed";
    pub const HTTP_REQUEST_FAILED: &str = "http_request_failed";
    pub const HTTP_RESPONSE_INVALID: &str = "http_response_invalid";
    pub const INVALID_APP_DIRECTORY: &str = "invalid_app_directory";
    pub const INVALID_AUTH: &str = "invalid_auth";
    pub const INVALID_SEMVER: &str = "invalid_semver";
    pub const PROJECT_CONFIG_MANIFEST_SOURCE: &str = "project_config_manifest_source_error";
    pub const SDK_HOOK_INVOCATION_FAILED: &str = "sdk_hook_invocation_failed";
    pub const SDK_HOOK_NOT_FOUND: &str = "sdk_hook_not_found";
    pub const SURVEY_CONFIG_NOT_FOUND: &str = "survey_config_not_found";
    pub const TEAM_NOT_FOUND: &str = "team_not_found";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const TOKEN_REVOKED: &str = "token_revoked";
    pub const UNABLE_TO_PARSE_JSON: &str = "unable_to_parse_json";
}

/// Remediation text for codes with a known fix.
///
/// Codes without an entry surface with their message alone.
pub fn remediation_for(code: &str) -> Option<&'static str> {
    match code {
        codes::INVALID_AUTH => Some("Run `slack login` to authenticate again"),
        codes::TOKEN_EXPIRED => Some("Run `slack login` to refresh your credentials"),
        codes::TOKEN_REVOKED => Some("Run `slack login` to authenticate with a new token"),
        codes::CREDENTIALS_NOT_FOUND => Some("Run `slack login` to create a credential"),
        codes::INVALID_APP_DIRECTORY => {
            Some("Run this command from a project directory containing .slack/hooks.json")
        }
        codes::SDK_HOOK_NOT_FOUND => {
            Some("Add the missing hook to your project's .slack/hooks.json")
        }
        codes::HOME_DIRECTORY_ACCESS_FAILED => {
            Some("Set SLACK_CONFIG_DIR to a writable directory and try again")
        }
        _ => None,
    }
}

/// A tagged error: code, message, optional remediation, optional cause.
#[derive(Debug)]
pub struct Error {
    code: String,
    message: String,
    remediation: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Result alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with a code from the catalog.
    ///
    /// The message defaults to the code itself and the remediation to the
    /// catalog entry; both can be overridden with the builder methods.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let remediation = remediation_for(&code).map(String::from);
        Self {
            message: code.clone(),
            code,
            remediation,
            source: None,
        }
    }

    /// Replace the human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the remediation hint.
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Attach a root cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The machine-readable code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The remediation hint, if any.
    pub fn remediation(&self) -> Option<&str> {
        self.remediation.as_deref()
    }

    /// True for auth codes that are safe to swallow as warnings.
    ///
    /// Commands like `logout` proceed past these: the remote credential is
    /// already unusable, so only the local record needs cleanup.
    pub fn is_known_auth_error(&self) -> bool {
        matches!(
            self.code.as_str(),
            codes::ALREADY_LOGGED_OUT
                | codes::INVALID_AUTH
                | codes::TOKEN_EXPIRED
                | codes::TOKEN_REVOKED
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if let Some(ref remediation) = self.remediation {
            write!(f, "\nSuggestion: {}", remediation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new("io_error")
            .with_message(err.to_string())
            .with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(codes::UNABLE_TO_PARSE_JSON)
            .with_message("Failed to parse JSON")
            .with_source(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::new(codes::HTTP_REQUEST_FAILED)
            .with_message(err.to_string())
            .with_source(err)
    }
}
