//! update::metadata
//!
//! The published release metadata feed.

use serde::Deserialize;

use crate::error::{codes, Error, Result};
use crate::update::semver;

/// Published metadata describing available CLI releases.
pub const METADATA_URL: &str = "https://api.slack.com/slackcli/metadata.json";

/// One published release. The first entry in the feed is the latest.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Release {
    pub version: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseChannel {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct ReleaseMetadata {
    #[serde(rename = "slack-cli")]
    slack_cli: ReleaseChannel,
}

/// Client for the release metadata feed.
pub struct MetadataClient {
    client: reqwest::Client,
    url: String,
}

impl MetadataClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    /// The latest published release.
    pub async fn latest_release(&self) -> Result<Release> {
        let response = self.client.get(&self.url).send().await.map_err(|err| {
            Error::new(codes::HTTP_REQUEST_FAILED)
                .with_message(format!("Failed to fetch release metadata from {}", self.url))
                .with_source(err)
        })?;
        if !response.status().is_success() {
            return Err(Error::new(codes::HTTP_RESPONSE_INVALID).with_message(format!(
                "Release metadata responded with status {} from {}",
                response.status(),
                self.url
            )));
        }
        let metadata: ReleaseMetadata = response.json().await.map_err(|err| {
            Error::new(codes::HTTP_RESPONSE_INVALID)
                .with_message("Invalid release metadata")
                .with_source(err)
        })?;
        metadata
            .slack_cli
            .releases
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::new(codes::HTTP_RESPONSE_INVALID)
                    .with_message("Release metadata lists no releases")
            })
    }

    /// The latest release when it is newer than `current_version`.
    pub async fn check_for_update(&self, current_version: &str) -> Result<Option<Release>> {
        let release = self.latest_release().await?;
        if semver::greater_than(&release.version, current_version)? {
            Ok(Some(release))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"{
        "slack-cli": {
            "title": "Slack CLI",
            "releases": [
                {"version": "3.2.0", "release_date": "2026-02-01"},
                {"version": "3.1.0", "release_date": "2026-01-01"}
            ]
        }
    }"#;

    async fn serve(body: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn first_listed_release_is_the_latest() {
        let server = serve(FEED, 200).await;
        let release = MetadataClient::new(&server.uri()).latest_release().await.unwrap();
        assert_eq!(release.version, "3.2.0");
    }

    #[tokio::test]
    async fn newer_release_is_an_update() {
        let server = serve(FEED, 200).await;
        let client = MetadataClient::new(&server.uri());
        let release = client.check_for_update("3.1.0").await.unwrap();
        assert_eq!(release.unwrap().version, "3.2.0");
    }

    #[tokio::test]
    async fn current_or_newer_version_is_not_an_update() {
        let server = serve(FEED, 200).await;
        let client = MetadataClient::new(&server.uri());
        assert!(client.check_for_update("3.2.0").await.unwrap().is_none());
        assert!(client.check_for_update("4.0.0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = serve("oops", 500).await;
        let err = MetadataClient::new(&server.uri()).latest_release().await.unwrap_err();
        assert_eq!(err.code(), codes::HTTP_RESPONSE_INVALID);
    }

    #[tokio::test]
    async fn empty_release_list_is_an_error() {
        let server = serve(r#"{"slack-cli":{"releases":[]}}"#, 200).await;
        assert!(MetadataClient::new(&server.uri()).latest_release().await.is_err());
    }
}
