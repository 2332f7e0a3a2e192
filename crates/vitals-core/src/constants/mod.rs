// ABOUTME: Engine-wide constants organized by domain (cache, rate limits, OAuth, HTTP)
// ABOUTME: Defaults for every tunable value read by the environment configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Values here are defaults; most of them can be overridden through
//! environment variables (see [`env_config`]).

/// Response cache TTLs and capacity
pub mod cache;
/// Environment variable names
pub mod env_config;
/// OAuth and provider endpoint defaults
pub mod oauth;

/// Shared provider call budget
pub mod rate_limit {
    /// Calls allowed per hourly window (Fitbit: 150 per user per hour)
    pub const DEFAULT_HOURLY_LIMIT: u32 = 150;

    /// Length of the rate-limit window in seconds
    pub const WINDOW_SECS: i64 = 3_600;

    /// Backoff applied when a 429 carries no parseable `Retry-After`
    pub const FALLBACK_RETRY_AFTER_SECS: u64 = 3_600;

    /// Longest backoff honoured from a `Retry-After` header (one day)
    pub const MAX_RETRY_AFTER_SECS: u64 = 86_400;
}

/// Outbound HTTP client defaults
pub mod http {
    /// Request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Locale hint sent as `Accept-Language`
    pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en_US";
}

/// Vitals query defaults
pub mod vitals {
    /// Trailing window (days before today) used when the caller omits dates
    pub const DEFAULT_WINDOW_DAYS: i64 = 7;

    /// Date format accepted for start/end dates
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Service identification used in structured logs
pub mod service_names {
    /// Service name for the engine
    pub const VITALS_BRIDGE: &str = "vitals-bridge";
}
