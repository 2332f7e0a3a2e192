// ABOUTME: Domain error taxonomy for the wearable vitals integration engine
// ABOUTME: Distinguishes expected unavailability (not connected, rate limited) from hard failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the token store, rate limiter, dispatcher and connection flows.
///
/// Most variants describe *expected* outcomes in a clinical UI: a patient without a
/// connected wearable, or a provider quota that ran out, is routine. Callers usually
/// collapse them into an [`UnavailableReason`] and show "no data available".
#[derive(Debug, Error)]
pub enum VitalsError {
    /// Patient has no token data for the provider (or a different provider is linked)
    #[error("patient {patient_id} is not connected to {provider}")]
    NotConnected {
        /// Patient whose link was inspected
        patient_id: Uuid,
        /// Provider that was requested
        provider: Provider,
    },

    /// Access token was near expiry and the single refresh attempt failed
    #[error("{provider} token refresh failed: {reason}")]
    RefreshFailed {
        /// Provider whose token endpoint failed
        provider: Provider,
        /// Failure detail (status or transport error)
        reason: String,
    },

    /// Shared hourly budget exhausted or provider answered 429
    #[error("provider rate limit reached{}", retry_hint(.retry_after_secs))]
    RateLimited {
        /// Seconds until the provider accepts calls again, when known
        retry_after_secs: Option<u64>,
    },

    /// Metric identifier is not present in the endpoint registry
    #[error("unsupported metric: {metric}")]
    UnsupportedMetric {
        /// Identifier as supplied by the caller
        metric: String,
    },

    /// Provider identifier is unknown to the engine
    #[error("unsupported provider: {provider}")]
    UnsupportedProvider {
        /// Identifier as supplied by the caller
        provider: String,
    },

    /// Non-2xx provider response, transport failure or timeout (`status` is `None` without a response)
    #[error("provider request failed{}: {body}", status_hint(.status))]
    Http {
        /// HTTP status when a response was received
        status: Option<u16>,
        /// Response body or transport error description
        body: String,
    },

    /// Whole response body could not be decoded as JSON
    #[error("malformed provider response: {details}")]
    MalformedResponse {
        /// Decoder error
        details: String,
    },

    /// Start/end dates are not `YYYY-MM-DD` or start is after end
    #[error("invalid date range: {details}")]
    InvalidDateRange {
        /// What was wrong with the range
        details: String,
    },

    /// Connection link is unknown, already used or expired
    #[error("connection link {link_id} rejected: {reason}")]
    InvalidConnectionLink {
        /// Link identifier presented by the OAuth callback
        link_id: Uuid,
        /// Why the link was rejected
        reason: String,
    },

    /// Link repository failure
    #[error("link storage error: {details}")]
    Storage {
        /// Storage failure detail
        details: String,
    },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs.map_or_else(String::new, |secs| format!(" (retry after {secs}s)"))
}

fn status_hint(status: &Option<u16>) -> String {
    status.map_or_else(
        || " without response".to_owned(),
        |code| format!(" with status {code}"),
    )
}

/// Result alias for engine operations
pub type VitalsResult<T> = Result<T, VitalsError>;

/// Machine-readable reason attached to an empty vitals result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No platform connection for the patient
    NotConnected,
    /// Token refresh failed; reconnect required
    RefreshFailed,
    /// Budget exhausted or provider backoff in effect
    RateLimited,
    /// Metric is not supported
    UnsupportedMetric,
    /// Provider returned an error or could not be reached
    HttpError,
    /// Provider payload could not be decoded
    MalformedResponse,
    /// Request parameters were invalid
    InvalidRequest,
    /// Link storage failed
    StorageError,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotConnected => "not_connected",
            Self::RefreshFailed => "refresh_failed",
            Self::RateLimited => "rate_limited",
            Self::UnsupportedMetric => "unsupported_metric",
            Self::HttpError => "http_error",
            Self::MalformedResponse => "malformed_response",
            Self::InvalidRequest => "invalid_request",
            Self::StorageError => "storage_error",
        };
        f.write_str(text)
    }
}

impl VitalsError {
    /// Whether a later identical call could succeed without operator action
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Http { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500,
            },
            Self::NotConnected { .. }
            | Self::RefreshFailed { .. }
            | Self::UnsupportedMetric { .. }
            | Self::UnsupportedProvider { .. }
            | Self::MalformedResponse { .. }
            | Self::InvalidDateRange { .. }
            | Self::InvalidConnectionLink { .. }
            | Self::Storage { .. } => false,
        }
    }

    /// Reason to surface next to an empty result
    #[must_use]
    pub const fn unavailable_reason(&self) -> UnavailableReason {
        match self {
            Self::NotConnected { .. } => UnavailableReason::NotConnected,
            Self::RefreshFailed { .. } => UnavailableReason::RefreshFailed,
            Self::RateLimited { .. } => UnavailableReason::RateLimited,
            Self::UnsupportedMetric { .. } => UnavailableReason::UnsupportedMetric,
            Self::Http { .. } => UnavailableReason::HttpError,
            Self::MalformedResponse { .. } => UnavailableReason::MalformedResponse,
            Self::UnsupportedProvider { .. }
            | Self::InvalidDateRange { .. }
            | Self::InvalidConnectionLink { .. } => UnavailableReason::InvalidRequest,
            Self::Storage { .. } => UnavailableReason::StorageError,
        }
    }
}

#[cfg(feature = "provider-errors")]
impl From<reqwest::Error> for VitalsError {
    fn from(error: reqwest::Error) -> Self {
        let body = if error.is_timeout() {
            "request timed out".to_owned()
        } else {
            error.to_string()
        };
        Self::Http {
            status: error.status().map(|status| status.as_u16()),
            body,
        }
    }
}
