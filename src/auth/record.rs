//! auth::record
//!
//! A single saved login for a workspace or enterprise org.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a token becomes eligible for rotation.
const ROTATION_WINDOW_SECS: i64 = 5 * 60;

/// One saved credential, keyed in the store by team ID.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Auth {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub team_domain: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_enterprise_install: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_id: Option<String>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl Auth {
    /// True when the token's expiry timestamp has passed.
    ///
    /// Tokens without an expiry (`expires_at == 0`) never expire.
    pub fn token_is_expired(&self, now: i64) -> bool {
        self.expires_at > 0 && self.expires_at <= now
    }

    /// True when this record should be rotated before use.
    ///
    /// Rotation needs a refresh token, and only happens once the token is
    /// expired or within five minutes of expiring.
    pub fn should_rotate_token(&self, now: i64) -> bool {
        !self.refresh_token.is_empty()
            && self.expires_at > 0
            && self.expires_at - now <= ROTATION_WINDOW_SECS
    }
}

// Tokens never appear in debug output.
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("token", &redact(&self.token))
            .field("team_domain", &self.team_domain)
            .field("team_id", &self.team_id)
            .field("user_id", &self.user_id)
            .field("last_updated", &self.last_updated)
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("api_host", &self.api_host)
            .finish()
    }
}

fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

/// True when `key` has the shape of a team or enterprise ID.
///
/// IDs start with `T` or `E` followed by at least eight uppercase
/// alphanumerics. Anything else is treated as a legacy team-domain key.
pub fn is_team_id(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some('T') | Some('E') => {}
        _ => return false,
    }
    let rest = chars.as_str();
    rest.len() >= 8
        && rest
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_expiring_at(expires_at: i64) -> Auth {
        Auth {
            token: "xoxe.xoxp-1-token".into(),
            refresh_token: "xoxe-1-refresh".into(),
            expires_at,
            ..Default::default()
        }
    }

    mod rotation {
        use super::*;

        const NOW: i64 = 1_700_000_000;

        #[test]
        fn rotates_within_five_minutes_of_expiry() {
            assert!(auth_expiring_at(NOW + 60).should_rotate_token(NOW));
            assert!(auth_expiring_at(NOW - 1).should_rotate_token(NOW));
        }

        #[test]
        fn does_not_rotate_a_fresh_token() {
            assert!(!auth_expiring_at(NOW + 3600).should_rotate_token(NOW));
        }

        #[test]
        fn does_not_rotate_without_a_refresh_token() {
            let mut auth = auth_expiring_at(NOW - 1);
            auth.refresh_token.clear();
            assert!(!auth.should_rotate_token(NOW));
        }

        #[test]
        fn does_not_rotate_a_token_without_expiry() {
            let mut auth = auth_expiring_at(0);
            assert!(!auth.should_rotate_token(NOW));
            auth.refresh_token.clear();
            assert!(!auth.token_is_expired(NOW));
        }
    }

    mod team_ids {
        use super::*;

        #[test]
        fn accepts_team_and_enterprise_ids() {
            assert!(is_team_id("T0123456789"));
            assert!(is_team_id("E12345678"));
        }

        #[test]
        fn rejects_domains_and_short_keys() {
            assert!(!is_team_id("acme-workspace"));
            assert!(!is_team_id("T1234"));
            assert!(!is_team_id("t012345678"));
            assert!(!is_team_id("W012345678"));
            assert!(!is_team_id(""));
        }

        #[test]
        fn rejects_lowercase_suffix() {
            assert!(!is_team_id("T0123456a89"));
        }
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let auth = auth_expiring_at(1);
        let text = format!("{:?}", auth);
        assert!(!text.contains("xoxp"));
        assert!(!text.contains("xoxe"));
        assert!(text.contains("<redacted>"));
    }

    #[test]
    fn serialization_omits_empty_optionals() {
        let auth = Auth {
            token: "xoxp-123".into(),
            team_domain: "acme".into(),
            team_id: "T012345678".into(),
            user_id: "U1".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&auth).expect("serialize");
        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("expires_at"));
        assert!(!json.contains("api_host"));
    }
}
