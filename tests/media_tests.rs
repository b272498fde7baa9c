use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use dance_signup::circuit_breaker::CircuitBreaker;
use dance_signup::config::RecoveryConfig;
use dance_signup::media::{fetch_for_screen, HttpMediaFetcher, MediaError, MediaFetcher, PhotoDelivery};

struct StubFetcher {
    body: Option<Vec<u8>>,
    calls: AtomicUsize,
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.clone().ok_or_else(|| MediaError::Empty(url.to_string()))
    }
}

#[tokio::test]
async fn test_photo_is_delivered() {
    let fetcher = StubFetcher {
        body: Some(vec![0xFF, 0xD8]),
        calls: AtomicUsize::new(0),
    };

    let delivery = fetch_for_screen(&fetcher, "https://example.invalid/a.jpg").await;

    assert_eq!(delivery, PhotoDelivery::Photo(vec![0xFF, 0xD8]));
}

/// A failed fetch degrades the screen to text instead of failing it
#[tokio::test]
async fn test_failed_fetch_falls_back_to_text() {
    let fetcher = StubFetcher {
        body: None,
        calls: AtomicUsize::new(0),
    };

    let delivery = fetch_for_screen(&fetcher, "https://example.invalid/a.jpg").await;

    assert_eq!(delivery, PhotoDelivery::TextOnly);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_circuit_breaker_opens_after_threshold() {
    let config = RecoveryConfig {
        circuit_breaker_threshold: 3,
        ..RecoveryConfig::default()
    };
    let breaker = CircuitBreaker::new(config);

    breaker.record_failure();
    breaker.record_failure();
    assert!(!breaker.is_open());

    breaker.record_failure();
    assert!(breaker.is_open());
    assert_eq!(breaker.failure_count(), 3);

    breaker.record_success();
    assert!(!breaker.is_open());
    assert_eq!(breaker.failure_count(), 0);
}

#[test]
fn test_circuit_breaker_resets_after_timeout() {
    let config = RecoveryConfig {
        circuit_breaker_threshold: 1,
        circuit_breaker_reset_secs: 0,
        ..RecoveryConfig::default()
    };
    let breaker = CircuitBreaker::new(config);

    breaker.record_failure();
    assert!(!breaker.is_open());
    assert_eq!(breaker.failure_count(), 0);
}

/// Unreachable hosts fail without panicking once retries are exhausted
#[tokio::test]
async fn test_http_fetcher_reports_unreachable_host() -> Result<()> {
    let recovery = RecoveryConfig {
        max_retries: 0,
        operation_timeout_secs: 2,
        ..RecoveryConfig::default()
    };
    let fetcher = HttpMediaFetcher::new(recovery)?;

    let result = fetcher.fetch("http://127.0.0.1:9/photo.jpg").await;
    assert!(result.is_err());

    Ok(())
}
