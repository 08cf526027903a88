//! Cache configuration
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development. An unset `LECTERN_REDIS_URL` is not an
//! error: the cache layer runs in permanently-absent mode and every
//! read falls through to the primary store.

use std::time::Duration;

/// Settings for the remote cache connection.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Remote cache connection string. `None` disables the remote cache
    /// entirely; nothing else about the read path changes.
    pub redis_url: Option<String>,

    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Timeout for a single command round trip.
    pub response_timeout: Duration,

    /// Reconnect attempts before an operation degrades to absent.
    pub retry_count: usize,

    /// Upper bound on the exponential reconnect backoff.
    pub max_backoff: Duration,

    /// Force-disable the cache even when a URL is configured.
    pub disabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(1),
            retry_count: 3,
            max_backoff: Duration::from_secs(5),
            disabled: false,
        }
    }
}

impl CacheSettings {
    /// Create settings from environment variables.
    ///
    /// Environment variables:
    /// - `LECTERN_REDIS_URL`: remote cache connection string (unset = cache off)
    /// - `LECTERN_CACHE_DISABLED`: "true" forces permanently-absent mode
    /// - `LECTERN_CACHE_CONNECT_TIMEOUT_MS`: connection timeout (default: 2000)
    /// - `LECTERN_CACHE_RESPONSE_TIMEOUT_MS`: per-command timeout (default: 1000)
    /// - `LECTERN_CACHE_RETRIES`: reconnect attempts (default: 3)
    /// - `LECTERN_CACHE_MAX_BACKOFF_MS`: backoff cap (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let redis_url = std::env::var("LECTERN_REDIS_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let disabled = std::env::var("LECTERN_CACHE_DISABLED")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let connect_timeout = env_millis("LECTERN_CACHE_CONNECT_TIMEOUT_MS")
            .unwrap_or(defaults.connect_timeout);

        let response_timeout = env_millis("LECTERN_CACHE_RESPONSE_TIMEOUT_MS")
            .unwrap_or(defaults.response_timeout);

        let retry_count = std::env::var("LECTERN_CACHE_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retry_count);

        let max_backoff =
            env_millis("LECTERN_CACHE_MAX_BACKOFF_MS").unwrap_or(defaults.max_backoff);

        Self {
            redis_url,
            connect_timeout,
            response_timeout,
            retry_count,
            max_backoff,
            disabled,
        }
    }

    /// Whether the remote cache should actually be contacted.
    pub fn is_enabled(&self) -> bool {
        !self.disabled && self.redis_url.is_some()
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CacheSettings::default();
        assert!(settings.redis_url.is_none());
        assert_eq!(settings.connect_timeout, Duration::from_secs(2));
        assert_eq!(settings.response_timeout, Duration::from_secs(1));
        assert_eq!(settings.retry_count, 3);
        assert!(!settings.disabled);
    }

    #[test]
    fn test_unset_url_means_disabled() {
        let settings = CacheSettings::default();
        assert!(!settings.is_enabled());
    }

    #[test]
    fn test_explicit_disable_wins_over_url() {
        let settings = CacheSettings {
            redis_url: Some("redis://localhost:6379".to_string()),
            disabled: true,
            ..CacheSettings::default()
        };
        assert!(!settings.is_enabled());
    }

    #[test]
    fn test_url_enables_cache() {
        let settings = CacheSettings {
            redis_url: Some("redis://localhost:6379".to_string()),
            ..CacheSettings::default()
        };
        assert!(settings.is_enabled());
    }
}
