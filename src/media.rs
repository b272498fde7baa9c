//! # Media Module
//!
//! Fetches the photos attached to the information screens. The rest of the
//! bot only sees the `MediaFetcher` capability: given a URL, it returns the
//! bytes or fails.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RecoveryConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Empty body for {0}")]
    Empty(String),
    #[error("Circuit open, skipping {0}")]
    CircuitOpen(String),
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError>;
}

/// HTTP fetcher with timeout, bounded retries and a circuit breaker
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    recovery: RecoveryConfig,
    circuit_breaker: CircuitBreaker,
}

impl HttpMediaFetcher {
    pub fn new(recovery: RecoveryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(recovery.operation_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            circuit_breaker: CircuitBreaker::new(recovery.clone()),
            recovery,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(MediaError::Empty(url.to_string()));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        if self.circuit_breaker.is_open() {
            return Err(MediaError::CircuitOpen(url.to_string()));
        }

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(bytes) => {
                    self.circuit_breaker.record_success();
                    debug!(url, size = bytes.len(), "Photo downloaded");
                    return Ok(bytes);
                }
                Err(e) if attempt < self.recovery.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(&self.recovery, attempt);
                    warn!(url, attempt, error = %e, delay_ms = delay.as_millis() as u64, "Photo download failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.circuit_breaker.record_failure();
                    return Err(e);
                }
            }
        }
    }
}

/// Exponential backoff with up to 25% random jitter, capped at the maximum delay
pub fn retry_delay(recovery: &RecoveryConfig, attempt: u32) -> Duration {
    let exponential = recovery
        .base_retry_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exponential.min(recovery.max_retry_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped.saturating_sub(jitter))
}

/// Photo bytes, or a marker that the screen falls back to text
#[derive(Debug, PartialEq, Eq)]
pub enum PhotoDelivery {
    Photo(Vec<u8>),
    TextOnly,
}

/// Fetch a photo for an information screen, never failing the screen itself
pub async fn fetch_for_screen(fetcher: &dyn MediaFetcher, url: &str) -> PhotoDelivery {
    match fetcher.fetch(url).await {
        Ok(bytes) => PhotoDelivery::Photo(bytes),
        Err(e) => {
            warn!(url, error = %e, "Photo unavailable, sending text only");
            PhotoDelivery::TextOnly
        }
    }
}
