//! Asset Fetching Abstraction
//!
//! Retrieves the raw bytes behind a logical asset path (for example
//! `"sounds/animals/cow.wav"`). Hosts decide where the path resolves: a local
//! asset directory, an HTTP origin, or an embedded bundle.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::Result;

/// Retry policy configuration for fetchers backed by unreliable transports.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if !self.use_exponential_backoff {
            return self.base_delay.min(self.max_delay);
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            use_exponential_backoff: true,
        }
    }
}

/// Source of raw asset bytes.
///
/// Implementations must return the complete payload or an error; partial
/// payloads are never returned as success. An empty payload is allowed and
/// left to the decoder to reject.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::assets::AssetFetcher;
///
/// async fn load(fetcher: &dyn AssetFetcher) -> bridge_traits::error::Result<usize> {
///     let bytes = fetcher.fetch("sounds/animals/cow.wav").await?;
///     Ok(bytes.len())
/// }
/// ```
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch all bytes stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not resolve to an asset
    /// - The transport fails (I/O error, network error, timeout)
    async fn fetch(&self, path: &str) -> Result<Bytes>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            use_exponential_backoff: true,
        };

        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(350));
    }

    #[test]
    fn linear_backoff_uses_base_delay() {
        let policy = RetryPolicy {
            use_exponential_backoff: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(4), policy.base_delay);
    }

    #[test]
    fn none_policy_makes_single_attempt() {
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }
}
