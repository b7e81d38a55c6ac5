//! Upstream release metadata.
//!
//! The releases endpoint answers with a JSON object; only `tag_name` and
//! `html_url` are used. The artifact download URL is derived from the detail
//! page URL, so it must follow the upstream host's layout exactly:
//!
//! ```text
//! https://host/owner/repo/releases/tag/v11.23.1
//! https://host/owner/repo/releases/download/v11.23.1/<artifact>
//! ```

use crate::core::{Result, UpdateError};
use crate::update::fetch::build_client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A resolved upstream release. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag as published, e.g. `v11.23.1`
    pub tag: String,
    /// Human-facing release page
    pub detail_page_url: String,
}

impl ReleaseInfo {
    /// Version string of the release with any leading `v` removed.
    #[must_use]
    pub fn version(&self) -> &str {
        strip_v_prefix(&self.tag)
    }

    /// URL of `artifact_name` within this release.
    ///
    /// Replaces the first `tag` in the detail page URL with `download` and
    /// appends `/<artifact_name>`.
    #[must_use]
    pub fn download_url(&self, artifact_name: &str) -> String {
        format!("{}/{}", self.detail_page_url.replacen("tag", "download", 1), artifact_name)
    }
}

/// Strip a single leading `v` from a version or tag.
pub(crate) fn strip_v_prefix(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: String,
    html_url: String,
}

/// Client for the latest-release endpoint.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: reqwest::Client,
    api_url: String,
}

impl ReleaseClient {
    /// Create a client for `api_url`, sending `user_agent` with a short timeout.
    pub fn new(api_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            api_url: api_url.into(),
        })
    }

    /// The endpoint this client queries.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the latest release with a single GET.
    ///
    /// Transport failures, statuses other than 200, and unparseable bodies are
    /// reported as distinct error kinds.
    pub async fn fetch_latest(&self) -> Result<ReleaseInfo> {
        debug!(url = %self.api_url, "Querying latest release");

        let network = |source| UpdateError::Network {
            operation: "release lookup".to_string(),
            url: self.api_url.clone(),
            source,
        };

        let response = self.client.get(&self.api_url).send().await.map_err(network)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpdateError::HttpStatus {
                url: self.api_url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(network)?;
        let parsed: ReleaseResponse =
            serde_json::from_slice(&body).map_err(|source| UpdateError::InvalidRelease {
                url: self.api_url.clone(),
                source,
            })?;

        debug!(tag = %parsed.tag_name, page = %parsed.html_url, "Latest release resolved");
        Ok(ReleaseInfo {
            tag: parsed.tag_name,
            detail_page_url: parsed.html_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, url: &str) -> ReleaseInfo {
        ReleaseInfo {
            tag: tag.to_string(),
            detail_page_url: url.to_string(),
        }
    }

    #[test]
    fn test_download_url_derivation() {
        let info = release(
            "v11.23.1",
            "https://github.com/Floorp-Projects/Floorp/releases/tag/v11.23.1",
        );
        assert_eq!(
            info.download_url("floorp-win64.installer.exe"),
            "https://github.com/Floorp-Projects/Floorp/releases/download/v11.23.1/floorp-win64.installer.exe"
        );
    }

    #[test]
    fn test_download_url_replaces_only_first_tag() {
        let info = release("tag-1", "https://example.com/r/tag/tag-1");
        assert_eq!(info.download_url("a.7z"), "https://example.com/r/download/tag-1/a.7z");
    }

    #[test]
    fn test_version_strips_v() {
        assert_eq!(release("v11.23.1", "").version(), "11.23.1");
        assert_eq!(release("11.23.1", "").version(), "11.23.1");
        assert_eq!(release("vv1", "").version(), "v1");
    }

    #[test]
    fn test_parse_response_ignores_extra_fields() {
        let body = r#"{"tag_name":"v1.2.3","html_url":"https://x/tag/v1.2.3","assets":[],"draft":false}"#;
        let parsed: ReleaseResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.tag_name, "v1.2.3");
    }

    #[test]
    fn test_parse_response_missing_field_fails() {
        let body = r#"{"tag_name":"v1.2.3"}"#;
        assert!(serde_json::from_str::<ReleaseResponse>(body).is_err());
    }
}
