//! Asset Fetcher Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    assets::{AssetFetcher, RetryPolicy},
    error::{BridgeError, Result},
};
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Reqwest-based asset fetcher resolving paths against an HTTP origin
///
/// Provides:
/// - Connection pooling via reqwest
/// - Automatic retry with exponential backoff on transport errors, `5xx` and `429`
/// - TLS via rustls
pub struct ReqwestAssetFetcher {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl ReqwestAssetFetcher {
    /// Create a fetcher with default timeouts and retry policy
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a fetcher with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("soundboard-core/0.1.0")
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Absolute URL for a logical asset path
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Execute a GET with retry logic
    async fn get_with_retry(&self, url: &str) -> Result<Bytes> {
        let policy = &self.policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = max_attempts,
                url = %url,
                "Fetching asset"
            );

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        warn!(
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            "Asset request failed with retryable status"
                        );
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "HTTP {} error",
                            status.as_u16()
                        )));
                    } else if status == StatusCode::NOT_FOUND {
                        return Err(BridgeError::NotFound(url.to_string()));
                    } else if !status.is_success() {
                        return Err(BridgeError::OperationFailed(format!(
                            "HTTP {} error",
                            status.as_u16()
                        )));
                    } else {
                        return response
                            .bytes()
                            .await
                            .map_err(|e| BridgeError::OperationFailed(e.to_string()));
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "Asset request failed"
                    );

                    if e.is_timeout() {
                        last_error = Some(BridgeError::OperationFailed(
                            "Request timed out".to_string(),
                        ));
                    } else if e.is_connect() {
                        last_error = Some(BridgeError::OperationFailed(format!(
                            "Connection failed: {}",
                            e
                        )));
                    } else {
                        last_error = Some(BridgeError::OperationFailed(e.to_string()));
                    }
                }
            }

            attempt += 1;

            if attempt < max_attempts {
                let delay = policy.delay_after(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl AssetFetcher for ReqwestAssetFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes> {
        let url = self.url_for(path);
        self.get_with_retry(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let fetcher = ReqwestAssetFetcher::new("https://cdn.example.com/board/").unwrap();
        assert_eq!(
            fetcher.url_for("/sounds/cow.wav"),
            "https://cdn.example.com/board/sounds/cow.wav"
        );
        assert_eq!(
            fetcher.url_for("sounds/cow.wav"),
            "https://cdn.example.com/board/sounds/cow.wav"
        );
    }

    #[tokio::test]
    async fn test_unreachable_origin_fails() {
        let fetcher = ReqwestAssetFetcher::with_timeout("http://127.0.0.1:1", Duration::from_secs(2))
            .unwrap()
            .with_retry_policy(RetryPolicy::none());

        let err = fetcher.fetch("cow.wav").await.unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }
}
