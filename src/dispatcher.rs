// ABOUTME: Builds provider endpoints for a metric and date range and issues authenticated calls
// ABOUTME: Clamps over-long ranges, spends the shared call budget and maps provider responses to errors
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::logging::VitalsLogger;
use crate::rate_limiting::{parse_retry_after, RateLimiter, TOO_MANY_REQUESTS};
use crate::registry::{self, EndpointDescriptor};
use crate::tokens::TokenStore;
use chrono::{Duration, NaiveDate};
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, RETRY_AFTER};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use vitals_core::constants::vitals::DATE_FORMAT;
use vitals_core::errors::{VitalsError, VitalsResult};
use vitals_core::models::{Metric, Provider};

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// Range from two dates
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when `start` is after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> VitalsResult<Self> {
        if start > end {
            return Err(VitalsError::InvalidDateRange {
                details: format!("start {start} is after end {end}"),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` strings
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` for malformed dates or a reversed range
    pub fn parse(start: &str, end: &str) -> VitalsResult<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Number of days, counting both ends
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Trailing window of at most `max_days` ending at `end`
    #[must_use]
    pub fn clamp_to(self, max_days: i64) -> Self {
        if self.days() <= max_days {
            return self;
        }
        Self {
            start: self.end - Duration::days(max_days - 1),
            end: self.end,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parse a `YYYY-MM-DD` date
///
/// # Errors
///
/// Returns `InvalidDateRange` when the string is not a valid date
pub fn parse_date(value: &str) -> VitalsResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        VitalsError::InvalidDateRange {
            details: format!("'{value}' is not a YYYY-MM-DD date: {e}"),
        }
    })
}

/// Request path and the range it actually covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRequest {
    /// Path appended to the API base URL
    pub path: String,
    /// Range after clamping, `None` for the default endpoint
    pub range: Option<DateRange>,
    /// Whether the requested range was narrowed
    pub clamped: bool,
}

/// Choose the endpoint for `descriptor` and an optional range
///
/// Over-long ranges are narrowed to the most recent `max_range_days` ending at
/// the requested end date, never rejected.
#[must_use]
pub fn plan_request(descriptor: &EndpointDescriptor, range: Option<DateRange>) -> PlannedRequest {
    let Some(requested) = range else {
        return PlannedRequest {
            path: descriptor.default_path.to_owned(),
            range: None,
            clamped: false,
        };
    };

    let effective = requested.clamp_to(descriptor.max_range_days);
    let clamped = effective != requested;
    if clamped {
        info!(
            metric = %descriptor.metric,
            requested = %requested,
            effective = %effective,
            max_range_days = descriptor.max_range_days,
            "Requested range exceeds provider limit, truncated to most recent window"
        );
    }

    let start = effective.start.format(DATE_FORMAT).to_string();
    let end = effective.end.format(DATE_FORMAT).to_string();
    let path = if effective.start == effective.end {
        descriptor
            .daily(&start)
            .unwrap_or_else(|| descriptor.range(&start, &end))
    } else {
        descriptor.range(&start, &end)
    };

    PlannedRequest {
        path,
        range: Some(effective),
        clamped,
    }
}

/// Raw provider payload with the request that produced it
#[derive(Debug, Clone)]
pub struct FetchedPayload {
    /// Decoded JSON body
    pub payload: Value,
    /// Request that was issued
    pub request: PlannedRequest,
}

/// Issues authenticated provider calls within the shared budget
pub struct RequestDispatcher {
    client: reqwest::Client,
    api_base_url: String,
    accept_language: String,
    provider: Provider,
    tokens: Arc<TokenStore>,
    rate_limiter: Arc<RateLimiter>,
}

impl RequestDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        api_base_url: impl Into<String>,
        accept_language: impl Into<String>,
        tokens: Arc<TokenStore>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            accept_language: accept_language.into(),
            provider: Provider::Fitbit,
            tokens,
            rate_limiter,
        }
    }

    /// Fetch using a caller-supplied metric identifier
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMetric` for unknown identifiers, otherwise as [`fetch`](Self::fetch)
    pub async fn fetch_identifier(
        &self,
        patient_id: Uuid,
        metric: &str,
        range: Option<DateRange>,
    ) -> VitalsResult<FetchedPayload> {
        let descriptor = registry::lookup(metric)?;
        self.fetch(patient_id, descriptor.metric, range).await
    }

    /// Fetch the raw payload for `metric` over `range`
    ///
    /// # Errors
    ///
    /// - `RateLimited` when the budget is exhausted, a backoff is active or the provider answers 429
    /// - `NotConnected` / `RefreshFailed` from the token store
    /// - `Http` for other non-2xx statuses (with status) and transport failures (without)
    /// - `MalformedResponse` when a 2xx body is not JSON
    #[instrument(skip(self), fields(patient_id = %patient_id, metric = %metric))]
    pub async fn fetch(
        &self,
        patient_id: Uuid,
        metric: Metric,
        range: Option<DateRange>,
    ) -> VitalsResult<FetchedPayload> {
        let descriptor = registry::descriptor(metric);

        // Reservation is released without counting if anything below bails out early
        let permit = self.rate_limiter.try_acquire()?;

        let access_token = self
            .tokens
            .get_valid_access_token(patient_id, self.provider)
            .await?;

        let request = plan_request(descriptor, range);
        let url = format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            request.path
        );
        debug!(%url, "Calling provider API");

        let started = Instant::now();
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await
            .map_err(|e| {
                VitalsLogger::log_provider_call(metric.as_str(), &request.path, None, elapsed_ms(started));
                VitalsError::from(e)
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        permit.complete(status, retry_after.as_deref());
        VitalsLogger::log_provider_call(metric.as_str(), &request.path, Some(status), elapsed_ms(started));

        if status == TOO_MANY_REQUESTS {
            return Err(VitalsError::RateLimited {
                retry_after_secs: Some(parse_retry_after(retry_after.as_deref())),
            });
        }

        let body = response.text().await;
        if !response_ok(status) {
            return Err(VitalsError::Http {
                status: Some(status),
                body: body.unwrap_or_else(|e| {
                    warn!(status, error = %e, "Failed to read provider error body");
                    String::new()
                }),
            });
        }

        // 204 and other empty success bodies carry no series
        let body = body?;
        let payload = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| VitalsError::MalformedResponse {
                details: format!("{metric} response: {e}"),
            })?
        };

        Ok(FetchedPayload { payload, request })
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
