//! Loading remote background images.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{DocumentError, DocumentResult};

/// Fetches the raw bytes behind a background URL.
#[async_trait]
pub trait BackgroundFetcher: Send + Sync {
    /// Fetch the content at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be retrieved.
    async fn fetch(&self, url: &Url) -> DocumentResult<Vec<u8>>;
}

/// Fetcher for `http`, `https` and `file` URLs.
///
/// One GET per request: no auth, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Create a fetcher that identifies itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Http`] if the HTTP client fails to build.
    pub fn new(user_agent: &str) -> DocumentResult<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl BackgroundFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> DocumentResult<Vec<u8>> {
        match url.scheme() {
            "http" | "https" => {
                let response = self.http.get(url.clone()).send().await?.error_for_status()?;
                let bytes = response.bytes().await?;
                Ok(bytes.to_vec())
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| DocumentError::Fetch(format!("not a local path: {url}")))?;
                Ok(tokio::fs::read(path).await?)
            }
            other => Err(DocumentError::Fetch(format!("unsupported scheme: {other}"))),
        }
    }
}
