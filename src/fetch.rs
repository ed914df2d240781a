use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read profile HTML from a local file, or fetch it when the input is a URL.
pub async fn read_input(input: &str) -> Result<String> {
    if is_url(input) {
        fetch_page(input).await
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

/// Fetch a page with bounded retries and exponential backoff on rate limits
/// and server errors.
pub async fn fetch_page(url: &str) -> Result<String> {
    let client = reqwest::Client::new();

    for attempt in 0..=MAX_RETRIES {
        let outcome = client.get(url).send().await;

        match outcome {
            Ok(response) if response.status().is_success() => {
                info!("Fetched {}", url);
                return response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read body of {}", url));
            }
            Ok(response) => {
                let status = response.status();
                let retryable = status.as_u16() == 429 || status.is_server_error();
                if !retryable || attempt == MAX_RETRIES {
                    bail!("Fetch failed for {}: HTTP {}", url, status);
                }
            }
            Err(e) => {
                if attempt == MAX_RETRIES {
                    return Err(e).with_context(|| format!("Fetch failed for {}", url));
                }
            }
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Retrying {} (attempt {}/{}), backing off {:.1}s",
            url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    bail!("Fetch failed for {}: retries exhausted", url)
}

// ── Tests ──
