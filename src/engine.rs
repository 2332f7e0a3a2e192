// ABOUTME: VitalsEngine facade: normalized vitals for a patient, metric and date range
// ABOUTME: Cache lookup, token, budget, dispatch, normalization and cache fill in one call
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Vitals Engine
//!
//! [`VitalsEngine::get_vitals`] is the single entry point for the clinical
//! layer. Expected unavailability (no connected wearable, budget spent,
//! provider errors) comes back as an empty [`VitalsOutcome`] with an
//! [`UnavailableReason`], never as stale or substituted data.

use crate::cache::{CacheKey, CacheStore, CachedVitals};
use crate::config::EngineConfig;
use crate::connections::ConnectionManager;
use crate::dispatcher::{parse_date, DateRange, RequestDispatcher};
use crate::http_client;
use crate::normalizer;
use crate::oauth2_client::OAuth2Client;
use crate::rate_limiting::RateLimiter;
use crate::registry;
use crate::storage::LinkRepository;
use crate::tokens::TokenStore;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use vitals_core::constants::vitals::{DATE_FORMAT, DEFAULT_WINDOW_DAYS};
use vitals_core::errors::{UnavailableReason, VitalsError, VitalsResult};
use vitals_core::models::{Provider, VitalRecord, VitalsSummary};

/// Result of a vitals request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalsOutcome {
    /// Normalized records, empty when unavailable
    pub records: Vec<VitalRecord>,
    /// Statistics over `records`
    pub summary: VitalsSummary,
    /// Why there is no data, when there is none because of a failure
    pub unavailable: Option<UnavailableReason>,
    /// Whether the records came from the cache
    pub from_cache: bool,
    /// First day actually covered (after defaulting and clamping)
    pub effective_start: Option<String>,
    /// Last day actually covered
    pub effective_end: Option<String>,
}

impl VitalsOutcome {
    fn unavailable(reason: UnavailableReason, unit: &str) -> Self {
        Self {
            records: Vec::new(),
            summary: VitalsSummary::from_records(&[], unit),
            unavailable: Some(reason),
            from_cache: false,
            effective_start: None,
            effective_end: None,
        }
    }
}

/// Wires every component behind the consumed-by contract
pub struct VitalsEngine {
    config: EngineConfig,
    provider: Provider,
    cache: Arc<dyn CacheStore>,
    rate_limiter: Arc<RateLimiter>,
    dispatcher: RequestDispatcher,
    connections: ConnectionManager,
}

impl VitalsEngine {
    /// Build an engine with an HTTP client honouring `config.http`
    #[must_use]
    pub fn new(
        config: EngineConfig,
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheStore>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        let client = http_client::client_for(&config.http);
        Self::with_http_client(config, links, cache, rate_limiter, client)
    }

    /// Build an engine over an existing HTTP client
    #[must_use]
    pub fn with_http_client(
        config: EngineConfig,
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheStore>,
        rate_limiter: Arc<RateLimiter>,
        client: reqwest::Client,
    ) -> Self {
        let oauth = OAuth2Client::new(config.provider.clone(), client.clone());
        let tokens = Arc::new(TokenStore::new(
            Arc::clone(&links),
            oauth.clone(),
            config.tokens.refresh_buffer_secs,
        ));
        let dispatcher = RequestDispatcher::new(
            client,
            config.provider.api_base_url.clone(),
            config.http.accept_language.clone(),
            tokens,
            Arc::clone(&rate_limiter),
        );
        let connections = ConnectionManager::new(
            links,
            Arc::clone(&cache),
            oauth,
            config.connections.link_ttl_hours,
        );

        Self {
            config,
            provider: Provider::Fitbit,
            cache,
            rate_limiter,
            dispatcher,
            connections,
        }
    }

    /// Connection link operations
    #[must_use]
    pub const fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Shared call budget
    #[must_use]
    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalized vitals, with failures folded into `unavailable`
    ///
    /// `metric` is case-insensitive; dates are `YYYY-MM-DD` and default to
    /// `[today - 7, today]`.
    pub async fn get_vitals(
        &self,
        patient_id: Uuid,
        metric: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> VitalsOutcome {
        match self.try_get_vitals(patient_id, metric, start, end).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.unavailable_reason();
                match &e {
                    VitalsError::NotConnected { .. } | VitalsError::RateLimited { .. } => {
                        info!(%patient_id, metric, %reason, "No vitals available: {e}");
                    }
                    _ => warn!(%patient_id, metric, %reason, "Vitals request failed: {e}"),
                }
                let unit = registry::lookup(metric).map_or("", |descriptor| descriptor.unit);
                VitalsOutcome::unavailable(reason, unit)
            }
        }
    }

    /// Normalized vitals, returning the underlying error on failure
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMetric`, `InvalidDateRange`, or any dispatcher error
    #[instrument(skip(self), fields(patient_id = %patient_id))]
    pub async fn try_get_vitals(
        &self,
        patient_id: Uuid,
        metric: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> VitalsResult<VitalsOutcome> {
        let descriptor = registry::lookup(metric)?;
        let today = Utc::now().date_naive();
        let (start_key, end_key, range) = resolve_range(start, end, today)?;
        let effective = range.clamp_to(descriptor.max_range_days);

        let key = CacheKey::new(patient_id, descriptor.metric, start_key, end_key);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => {
                debug!(cache_key = %key, "Serving vitals from cache");
                return Ok(outcome(cached.records, cached.summary, true, effective));
            }
            Ok(None) => {}
            Err(e) => warn!(cache_key = %key, error = %e, "Cache read failed, fetching from provider"),
        }

        let fetched = self
            .dispatcher
            .fetch(patient_id, descriptor.metric, Some(range))
            .await?;
        let records = normalizer::normalize(&fetched.payload, descriptor);
        let summary = VitalsSummary::from_records(&records, descriptor.unit);

        let ttl = self.config.cache.ttl.ttl_for(effective.start, effective.end, today);
        let entry = CachedVitals {
            records,
            summary,
            provider: self.provider,
            cached_at: Utc::now(),
        };
        if let Err(e) = self.cache.put(&key, &entry, ttl).await {
            warn!(cache_key = %key, error = %e, "Failed to cache vitals");
        }

        Ok(outcome(entry.records, entry.summary, false, effective))
    }
}

fn outcome(
    records: Vec<VitalRecord>,
    summary: VitalsSummary,
    from_cache: bool,
    effective: DateRange,
) -> VitalsOutcome {
    VitalsOutcome {
        records,
        summary,
        unavailable: None,
        from_cache,
        effective_start: Some(effective.start.format(DATE_FORMAT).to_string()),
        effective_end: Some(effective.end.format(DATE_FORMAT).to_string()),
    }
}

/// Apply defaults and parse; returns the key strings and the parsed range
///
/// Key strings are the caller's own text when supplied, so differently
/// formatted but equal dates map to different cache entries.
fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> VitalsResult<(String, String, DateRange)> {
    let end_date = end.map(parse_date).transpose()?.unwrap_or(today);
    let start_date = start
        .map(parse_date)
        .transpose()?
        .unwrap_or(end_date - Duration::days(DEFAULT_WINDOW_DAYS));
    let range = DateRange::new(start_date, end_date)?;

    let start_key = start.map_or_else(|| start_date.format(DATE_FORMAT).to_string(), str::to_owned);
    let end_key = end.map_or_else(|| end_date.format(DATE_FORMAT).to_string(), str::to_owned);
    Ok((start_key, end_key, range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_default_window_is_trailing_seven_days() {
        let (start, end, range) = resolve_range(None, None, date("2024-06-30")).unwrap();
        assert_eq!(start, "2024-06-23");
        assert_eq!(end, "2024-06-30");
        assert_eq!(range.days(), 8);
    }

    #[test]
    fn test_only_end_given() {
        let (start, _, _) = resolve_range(None, Some("2024-02-10"), date("2024-06-30")).unwrap();
        assert_eq!(start, "2024-02-03");
    }

    #[test]
    fn test_key_keeps_caller_text() {
        let (start, _, range) =
            resolve_range(Some(" 2024-06-01"), Some("2024-06-07"), date("2024-06-30")).unwrap();
        assert_eq!(start, " 2024-06-01");
        assert_eq!(range.start, date("2024-06-01"));
    }
}
