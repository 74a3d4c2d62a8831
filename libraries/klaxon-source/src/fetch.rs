//! Fetching remote sound files.

use crate::error::{Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Downloads a remote sound completely into memory.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing with [`SourceError::Fetch`] on a non-success status.
    async fn fetch(&self, url: &Url) -> Result<Bytes>;
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Create a fetcher with reasonable timeouts.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Klaxon/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    /// Wrap an existing client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        debug!(url = %url, "Fetching remote sound");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Remote sound fetch failed");
            return Err(SourceError::Fetch {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!(url = %url, size = bytes.len(), "Fetched remote sound");
        Ok(bytes)
    }
}
