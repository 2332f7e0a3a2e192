// ABOUTME: Environment configuration for provider credentials, budgets, timeouts and cache TTLs
// ABOUTME: Missing variables fall back to defaults, malformed numeric values are rejected
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Environment-based configuration for the vitals engine

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use vitals_core::constants::{cache, env_config, http, oauth, rate_limit};
use vitals_core::errors::{AppError, AppResult};

/// OAuth2 and REST settings for the connected provider
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Callback registered with the provider
    pub redirect_uri: String,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token exchange and refresh endpoint
    pub token_url: String,
    /// Base URL prepended to registry paths
    pub api_base_url: String,
    /// Token revocation endpoint
    pub revoke_url: String,
    /// Scopes requested on the authorize call
    pub scopes: Vec<String>,
    /// `expires_in` parameter sent on the authorize call
    pub authorization_expires_in: u64,
    /// Lifetime assumed when a token response omits `expires_in`
    pub default_token_lifetime_secs: i64,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("revoke_url", &self.revoke_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            auth_url: oauth::FITBIT_AUTH_URL.to_owned(),
            token_url: oauth::FITBIT_TOKEN_URL.to_owned(),
            api_base_url: oauth::FITBIT_API_BASE_URL.to_owned(),
            revoke_url: oauth::FITBIT_REVOKE_URL.to_owned(),
            scopes: parse_scopes(oauth::FITBIT_DEFAULT_SCOPES),
            authorization_expires_in: oauth::FITBIT_AUTHORIZATION_EXPIRES_IN,
            default_token_lifetime_secs: oauth::FITBIT_MAX_TOKEN_LIFETIME_SECS,
        }
    }
}

/// Provider-wide call budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Calls allowed per hourly window
    pub hourly_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            hourly_limit: rate_limit::DEFAULT_HOURLY_LIMIT,
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// `Accept-Language` sent on data requests
    pub accept_language: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: http::DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: http::DEFAULT_CONNECT_TIMEOUT_SECS,
            accept_language: http::DEFAULT_ACCEPT_LANGUAGE.to_owned(),
        }
    }
}

/// TTL tiers chosen from the age of the requested range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// Default TTL
    pub base: Duration,
    /// Ranges that include today and span at most two days
    pub live: Duration,
    /// Ranges ending 7 to 30 days ago
    pub recent: Duration,
    /// Ranges ending more than 30 days ago
    pub historical: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(cache::TTL_BASE_SECS),
            live: Duration::from_secs(cache::TTL_LIVE_SECS),
            recent: Duration::from_secs(cache::TTL_RECENT_SECS),
            historical: Duration::from_secs(cache::TTL_HISTORICAL_SECS),
        }
    }
}

impl TtlPolicy {
    /// Same TTL for every tier (useful for tests and tooling)
    #[must_use]
    pub const fn uniform(ttl: Duration) -> Self {
        Self {
            base: ttl,
            live: ttl,
            recent: ttl,
            historical: ttl,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries before LRU eviction
    pub max_entries: usize,
    /// TTL tiers
    pub ttl: TtlPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            ttl: TtlPolicy::default(),
        }
    }
}

/// Token refresh settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Refresh when the token expires within this many seconds
    pub refresh_buffer_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_buffer_secs: oauth::TOKEN_REFRESH_BUFFER_SECS,
        }
    }
}

/// Connection link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hours a connection link stays valid
    pub link_ttl_hours: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            link_ttl_hours: oauth::CONNECTION_LINK_TTL_HOURS,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider OAuth and REST endpoints
    pub provider: ProviderConfig,
    /// Hourly call budget
    pub rate_limit: RateLimitConfig,
    /// Outbound HTTP settings
    pub http: HttpClientConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Token refresh settings
    pub tokens: TokenConfig,
    /// Connection link settings
    pub connections: ConnectionConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a numeric variable does not parse
    /// or the resulting configuration fails validation
    pub fn from_env() -> AppResult<Self> {
        info!("Loading vitals engine configuration from environment variables");

        let defaults = Self::default();
        let config = Self {
            provider: ProviderConfig {
                client_id: env_var_or(env_config::FITBIT_CLIENT_ID, ""),
                client_secret: env_var_or(env_config::FITBIT_CLIENT_SECRET, ""),
                redirect_uri: env_var_or(env_config::FITBIT_REDIRECT_URI, ""),
                auth_url: env_var_or(env_config::FITBIT_AUTH_URL, oauth::FITBIT_AUTH_URL),
                token_url: env_var_or(env_config::FITBIT_TOKEN_URL, oauth::FITBIT_TOKEN_URL),
                api_base_url: env_var_or(
                    env_config::FITBIT_API_BASE_URL,
                    oauth::FITBIT_API_BASE_URL,
                ),
                revoke_url: env_var_or(env_config::FITBIT_REVOKE_URL, oauth::FITBIT_REVOKE_URL),
                scopes: parse_scopes(&env_var_or(
                    env_config::FITBIT_SCOPES,
                    oauth::FITBIT_DEFAULT_SCOPES,
                )),
                ..defaults.provider
            },
            rate_limit: RateLimitConfig {
                hourly_limit: parse_env_or(
                    env_config::RATE_LIMIT_PER_HOUR,
                    defaults.rate_limit.hourly_limit,
                )?,
            },
            http: HttpClientConfig {
                timeout_secs: parse_env_or(
                    env_config::HTTP_TIMEOUT_SECS,
                    defaults.http.timeout_secs,
                )?,
                connect_timeout_secs: parse_env_or(
                    env_config::HTTP_CONNECT_TIMEOUT_SECS,
                    defaults.http.connect_timeout_secs,
                )?,
                accept_language: env_var_or(
                    env_config::ACCEPT_LANGUAGE,
                    http::DEFAULT_ACCEPT_LANGUAGE,
                ),
            },
            cache: CacheConfig {
                max_entries: parse_env_or(
                    env_config::CACHE_MAX_ENTRIES,
                    defaults.cache.max_entries,
                )?,
                ttl: TtlPolicy {
                    base: parse_secs_or(env_config::CACHE_TTL_BASE_SECS, defaults.cache.ttl.base)?,
                    live: parse_secs_or(env_config::CACHE_TTL_LIVE_SECS, defaults.cache.ttl.live)?,
                    recent: parse_secs_or(
                        env_config::CACHE_TTL_RECENT_SECS,
                        defaults.cache.ttl.recent,
                    )?,
                    historical: parse_secs_or(
                        env_config::CACHE_TTL_HISTORICAL_SECS,
                        defaults.cache.ttl.historical,
                    )?,
                },
            },
            tokens: TokenConfig {
                refresh_buffer_secs: parse_env_or(
                    env_config::TOKEN_REFRESH_BUFFER_SECS,
                    defaults.tokens.refresh_buffer_secs,
                )?,
            },
            connections: ConnectionConfig {
                link_ttl_hours: parse_env_or(
                    env_config::CONNECTION_LINK_TTL_HOURS,
                    defaults.connections.link_ttl_hours,
                )?,
            },
        };

        config.validate()?;
        info!("Vitals engine configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero budget, a zero cache size,
    /// negative durations or unparseable provider URLs
    pub fn validate(&self) -> AppResult<()> {
        if self.rate_limit.hourly_limit == 0 {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_config::RATE_LIMIT_PER_HOUR
            )));
        }

        if self.cache.max_entries == 0 {
            return Err(AppError::config(format!(
                "{} must be greater than zero",
                env_config::CACHE_MAX_ENTRIES
            )));
        }

        if self.tokens.refresh_buffer_secs < 0 || self.connections.link_ttl_hours <= 0 {
            return Err(AppError::config(
                "token refresh buffer and connection link TTL must be positive",
            ));
        }

        for (name, value) in [
            ("auth_url", &self.provider.auth_url),
            ("token_url", &self.provider.token_url),
            ("api_base_url", &self.provider.api_base_url),
            ("revoke_url", &self.provider.revoke_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::config(format!("invalid provider {name} '{value}': {e}")))?;
        }

        if self.provider.client_id.is_empty() || self.provider.client_secret.is_empty() {
            warn!("Fitbit client_id or client_secret is not configured; token calls will fail");
        }

        Ok(())
    }

    /// Summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Vitals Engine Configuration:\n\
             - API Base URL: {}\n\
             - Hourly Call Budget: {}\n\
             - HTTP Timeout: {}s (connect {}s)\n\
             - Cache Capacity: {}\n\
             - Cache TTL base/live/recent/historical: {}s/{}s/{}s/{}s\n\
             - Token Refresh Buffer: {}s\n\
             - Connection Link TTL: {}h",
            self.provider.api_base_url,
            self.rate_limit.hourly_limit,
            self.http.timeout_secs,
            self.http.connect_timeout_secs,
            self.cache.max_entries,
            self.cache.ttl.base.as_secs(),
            self.cache.ttl.live.as_secs(),
            self.cache.ttl.recent.as_secs(),
            self.cache.ttl.historical.as_secs(),
            self.tokens.refresh_buffer_secs,
            self.connections.link_ttl_hours,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env_or<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_secs_or(key: &str, default: Duration) -> AppResult<Duration> {
    parse_env_or(key, default.as_secs()).map(Duration::from_secs)
}

/// Parse comma or space separated scopes
fn parse_scopes(scopes_str: &str) -> Vec<String> {
    scopes_str
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        assert_eq!(
            parse_scopes("activity,heartrate sleep"),
            vec!["activity", "heartrate", "sleep"]
        );
        assert_eq!(parse_scopes(" activity , sleep "), vec!["activity", "sleep"]);
        assert_eq!(parse_scopes(""), Vec::<String>::new());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.hourly_limit, 150);
        assert_eq!(config.cache.ttl.live, Duration::from_secs(120));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = EngineConfig::default();
        config.rate_limit.hourly_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let config = ProviderConfig {
            client_secret: "super-secret".to_owned(),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
