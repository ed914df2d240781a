use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Bound on the one external fetch a card build may perform.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct ResolvedPhoto {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Binary-resolution capability injected into the card builder. One
/// resolution per build, never overlapping.
#[async_trait]
pub trait PhotoResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<ResolvedPhoto>;
}

/// Fetches photo bytes over HTTP with an explicit timeout around each await.
pub struct HttpPhotoResolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPhotoResolver {
    pub fn new(timeout: Duration) -> Self {
        HttpPhotoResolver {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl PhotoResolver for HttpPhotoResolver {
    async fn resolve(&self, url: &str) -> Result<ResolvedPhoto> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .context("Photo fetch timed out")?
            .with_context(|| format!("Photo fetch failed for {}", url))?
            .error_for_status()
            .context("Photo fetch returned an error status")?;

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = tokio::time::timeout(self.timeout, response.bytes())
            .await
            .context("Photo read timed out")?
            .context("Failed to read photo body")?;

        Ok(ResolvedPhoto {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}
