//! Streaming download of the release artifact.

use crate::core::{Result, UpdateError};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Build an HTTP client with the updater's User-Agent and a total timeout.
pub(crate) fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|source| UpdateError::Network {
            operation: "client setup".to_string(),
            url: String::new(),
            source,
        })
}

/// Downloads release artifacts to local scratch files.
///
/// The whole transfer is bounded by the client timeout. There are no retries:
/// a failed download fails the update and the next launch tries again.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    /// Create a fetcher sending `user_agent` with a `timeout` for the whole transfer.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
        })
    }

    /// Download `url` into `destination`, returning the number of bytes written.
    ///
    /// The body is streamed chunk by chunk, never held in memory as a whole.
    /// `destination` is created or truncated. Any status other than 200 is reported
    /// as [`UpdateError::HttpStatus`], distinct from transport failures.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        info!(url, destination = %destination.display(), "Downloading update");

        let network = |source| UpdateError::Network {
            operation: "download".to_string(),
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpdateError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| UpdateError::fs("create download file", destination, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(network)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::fs("write download file", destination, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| UpdateError::fs("flush download file", destination, e))?;

        debug!(bytes = written, "Download finished");
        Ok(written)
    }
}

/// Check that a downloaded artifact holds data.
///
/// Returns the file size, or [`UpdateError::EmptyArtifact`] for a zero-byte file.
pub async fn ensure_non_empty(path: &Path) -> Result<u64> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| UpdateError::fs("inspect download", path, e))?
        .len();

    if size == 0 {
        return Err(UpdateError::EmptyArtifact {
            path: path.to_path_buf(),
        });
    }
    Ok(size)
}
