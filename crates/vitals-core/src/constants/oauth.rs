// ABOUTME: OAuth2 and REST endpoint defaults for the Fitbit Web API
// ABOUTME: Token lifetimes, connection-link lifetime, and default scopes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Provider identifier used in logs and serialized links
pub const FITBIT: &str = "fitbit";

/// Fitbit authorization endpoint
pub const FITBIT_AUTH_URL: &str = "https://www.fitbit.com/oauth2/authorize";

/// Fitbit token endpoint (code exchange and refresh)
pub const FITBIT_TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";

/// Fitbit token revocation endpoint
pub const FITBIT_REVOKE_URL: &str = "https://api.fitbit.com/oauth2/revoke";

/// Fitbit Web API base URL (paths in the registry carry their own version prefix)
pub const FITBIT_API_BASE_URL: &str = "https://api.fitbit.com";

/// Default scopes requested for vitals access
pub const FITBIT_DEFAULT_SCOPES: &str =
    "activity heartrate sleep weight oxygen_saturation respiratory_rate temperature";

/// Maximum access-token lifetime Fitbit issues (8 hours); used when `expires_in` is absent
pub const FITBIT_MAX_TOKEN_LIFETIME_SECS: i64 = 28_800;

/// `expires_in` value sent on the authorize request (one week)
pub const FITBIT_AUTHORIZATION_EXPIRES_IN: u64 = 604_800;

/// Access tokens expiring within this many seconds are refreshed before use
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Lifetime of a connection link in hours
pub const CONNECTION_LINK_TTL_HOURS: i64 = 24;
