//! HTTP client wrapper for index fetches, size probes and resource transfers.
//!
//! The client is created once per run and cloned into each worker task,
//! sharing reqwest's connection pool.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::config::Config;

/// HTTP client shared by discovery, probes and transfers.
///
/// # Example
///
/// ```no_run
/// use index_downloader::{Config, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::from_config(&Config::default())?;
/// let url = url::Url::parse("https://example.com/file.ia.mp4")?;
/// let size = client.probe_size(&url).await;
/// println!("remote size: {size:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client using the configured User-Agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] when reqwest rejects the settings.
    pub fn from_config(config: &Config) -> Result<Self, DownloadError> {
        Self::new(&config.user_agent, config.timeout)
    }

    /// Creates a client with an explicit User-Agent and per-call timeout.
    ///
    /// The timeout bounds connection setup and every individual read, so a
    /// stalled body stream fails without capping the total transfer time.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] when reqwest rejects the settings.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Fetches a document and decodes it as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure, timeout, or a
    /// non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &Url) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;
        debug!(bytes = body.len(), "fetched document");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Asks the server for the declared length of a resource (HEAD request).
    ///
    /// Best effort: transport failures, error statuses and missing or
    /// non-numeric `Content-Length` headers all yield `None`.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn probe_size(&self, url: &Url) -> Option<u64> {
        let response = match self.client.head(url.as_str()).send().await {
            Ok(response) => response,
            Err(error) => {
                debug!(error = %error, "size probe failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "size probe returned error status");
            return None;
        }

        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        debug!(size = ?size, "size probe complete");
        size
    }

    /// Sends a GET for a resource, with `Range: bytes={offset}-` when resuming.
    ///
    /// The status is not interpreted here; the transfer engine decides which
    /// codes are acceptable.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Network`] or [`DownloadError::Timeout`] when
    /// the request cannot be sent or the response headers never arrive.
    pub async fn fetch(&self, url: &Url, offset: u64) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url.as_str());
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        request
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))
    }
}
