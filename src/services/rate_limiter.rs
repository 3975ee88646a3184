use crate::models::errors::AppError;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed in the time window
    pub max_requests: usize,
    /// Length of the sliding window
    pub window_duration: Duration,
}

/// Timestamps of the requests a client made inside the window, oldest first
#[derive(Debug, Default)]
struct Window {
    hits: VecDeque<Instant>,
}

impl Window {
    fn evict_older_than(&mut self, window: Duration, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.duration_since(oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window limiter keyed by client identifier
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Records a request and fails once the client is over its budget.
    /// Rejected requests are not counted.
    pub async fn check_rate_limit(&self, identifier: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut windows = self.windows.write().await;

        let window = windows.entry(identifier.to_string()).or_default();
        window.evict_older_than(self.config.window_duration, now);

        if window.hits.len() >= self.config.max_requests {
            return Err(AppError::rate_limited(format!(
                "{} requests per {} seconds",
                self.config.max_requests,
                self.config.window_duration.as_secs()
            )));
        }

        window.hits.push_back(now);
        Ok(())
    }

    /// Drops clients with no requests left in the window
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let initial_count = windows.len();

        for window in windows.values_mut() {
            window.evict_older_than(self.config.window_duration, now);
        }
        windows.retain(|_, window| !window.hits.is_empty());

        let removed_count = initial_count - windows.len();

        if removed_count > 0 {
            tracing::debug!("Cleaned up {} idle rate limit windows", removed_count);
        }

        removed_count
    }
}

pub fn identifier_from_ip(ip: IpAddr) -> String {
    ip.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: usize, window_duration: Duration) -> RateLimiter {
        RateLimiter::with_config(RateLimitConfig {
            max_requests,
            window_duration,
        })
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_requests() {
        let limiter = limiter(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());

        let denied = limiter.check_rate_limit("10.0.0.1").await;
        assert!(matches!(denied, Err(AppError::RateLimitError { .. })));
    }

    #[tokio::test]
    async fn test_rate_limiter_different_identifiers() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());
        assert!(limiter.check_rate_limit("10.0.0.2").await.is_ok());

        assert!(limiter.check_rate_limit("10.0.0.1").await.is_err());
        assert!(limiter.check_rate_limit("10.0.0.2").await.is_err());
    }

    #[tokio::test]
    async fn test_rate_limiter_window_expiry() {
        let limiter = limiter(2, Duration::from_millis(100));

        limiter.check_rate_limit("10.0.0.1").await.unwrap();
        limiter.check_rate_limit("10.0.0.1").await.unwrap();
        assert!(limiter.check_rate_limit("10.0.0.1").await.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(limiter.check_rate_limit("10.0.0.1").await.is_ok());
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let limiter = limiter(5, Duration::from_millis(100));

        limiter.check_rate_limit("10.0.0.1").await.unwrap();
        limiter.check_rate_limit("10.0.0.2").await.unwrap();
        assert_eq!(limiter.cleanup_expired().await, 0);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(limiter.cleanup_expired().await, 2);
        assert_eq!(limiter.cleanup_expired().await, 0);
    }
}
