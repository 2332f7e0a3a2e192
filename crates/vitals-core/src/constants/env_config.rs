// ABOUTME: Environment variable names read by the engine configuration
// ABOUTME: Single place to look up every VITALS_* setting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// OAuth client identifier
pub const FITBIT_CLIENT_ID: &str = "VITALS_FITBIT_CLIENT_ID";
/// OAuth client secret
pub const FITBIT_CLIENT_SECRET: &str = "VITALS_FITBIT_CLIENT_SECRET";
/// OAuth redirect URI registered with the provider
pub const FITBIT_REDIRECT_URI: &str = "VITALS_FITBIT_REDIRECT_URI";
/// Authorization endpoint override
pub const FITBIT_AUTH_URL: &str = "VITALS_FITBIT_AUTH_URL";
/// Token endpoint override
pub const FITBIT_TOKEN_URL: &str = "VITALS_FITBIT_TOKEN_URL";
/// API base URL override
pub const FITBIT_API_BASE_URL: &str = "VITALS_FITBIT_API_BASE_URL";
/// Revocation endpoint override
pub const FITBIT_REVOKE_URL: &str = "VITALS_FITBIT_REVOKE_URL";
/// Space separated scopes override
pub const FITBIT_SCOPES: &str = "VITALS_FITBIT_SCOPES";

/// Hourly provider call budget
pub const RATE_LIMIT_PER_HOUR: &str = "VITALS_RATE_LIMIT_PER_HOUR";

/// Outbound request timeout
pub const HTTP_TIMEOUT_SECS: &str = "VITALS_HTTP_TIMEOUT_SECS";
/// Outbound connect timeout
pub const HTTP_CONNECT_TIMEOUT_SECS: &str = "VITALS_HTTP_CONNECT_TIMEOUT_SECS";
/// `Accept-Language` header value
pub const ACCEPT_LANGUAGE: &str = "VITALS_ACCEPT_LANGUAGE";

/// In-memory cache capacity
pub const CACHE_MAX_ENTRIES: &str = "VITALS_CACHE_MAX_ENTRIES";
/// Base cache TTL
pub const CACHE_TTL_BASE_SECS: &str = "VITALS_CACHE_TTL_BASE_SECS";
/// Cache TTL for live ranges
pub const CACHE_TTL_LIVE_SECS: &str = "VITALS_CACHE_TTL_LIVE_SECS";
/// Cache TTL for ranges ended 7-30 days ago
pub const CACHE_TTL_RECENT_SECS: &str = "VITALS_CACHE_TTL_RECENT_SECS";
/// Cache TTL for ranges ended over 30 days ago
pub const CACHE_TTL_HISTORICAL_SECS: &str = "VITALS_CACHE_TTL_HISTORICAL_SECS";

/// Seconds before expiry at which tokens are refreshed
pub const TOKEN_REFRESH_BUFFER_SECS: &str = "VITALS_TOKEN_REFRESH_BUFFER_SECS";
/// Connection link lifetime in hours
pub const CONNECTION_LINK_TTL_HOURS: &str = "VITALS_CONNECTION_LINK_TTL_HOURS";
