// ABOUTME: Response cache abstraction for normalized vitals keyed by patient, metric and range
// ABOUTME: Adaptive TTL policy based on how far in the past the requested range lies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// In-memory cache implementation
pub mod memory;

pub use crate::config::{CacheConfig, TtlPolicy};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;
use vitals_core::constants::cache::{HISTORICAL_AGE_DAYS, LIVE_RANGE_MAX_DAYS, RECENT_AGE_DAYS};
use vitals_core::errors::AppResult;
use vitals_core::models::{Metric, Provider, VitalRecord, VitalsSummary};

/// Cache store for normalized vitals
///
/// Implementations must treat an entry whose age has reached its TTL as absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry
    ///
    /// # Errors
    ///
    /// Returns an error if the stored entry cannot be decoded
    async fn get(&self, key: &CacheKey) -> AppResult<Option<CachedVitals>>;

    /// Store or overwrite an entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be encoded
    async fn put(&self, key: &CacheKey, value: &CachedVitals, ttl: Duration) -> AppResult<()>;

    /// Remove one entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Remove every entry for a patient, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn invalidate_patient(&self, patient_id: Uuid) -> AppResult<u64>;

    /// Remove everything
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Cache key: patient, canonical metric identifier and the exact date strings requested
///
/// Equivalent ranges written differently are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Patient the data belongs to
    pub patient_id: Uuid,
    /// Metric
    pub metric: Metric,
    /// Start date string as requested
    pub start: String,
    /// End date string as requested
    pub end: String,
}

impl CacheKey {
    /// Create a new cache key
    #[must_use]
    pub fn new(
        patient_id: Uuid,
        metric: Metric,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            patient_id,
            metric,
            start: start.into(),
            end: end.into(),
        }
    }

    /// Prefix shared by every key of one patient
    #[must_use]
    pub fn patient_prefix(patient_id: Uuid) -> String {
        format!("vitals:{patient_id}:")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vitals:{}:{}:{}:{}",
            self.patient_id,
            self.metric.as_str(),
            self.start,
            self.end
        )
    }
}

/// Cached result of one successful fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedVitals {
    /// Normalized records (already transformed)
    pub records: Vec<VitalRecord>,
    /// Statistics over `records`
    pub summary: VitalsSummary,
    /// Provider the data came from
    pub provider: Provider,
    /// When the entry was written
    pub cached_at: DateTime<Utc>,
}

impl TtlPolicy {
    /// TTL for a range `[start, end]` evaluated on `today`
    ///
    /// - includes today and spans at most two days: `live`
    /// - ends more than 30 days ago: `historical`
    /// - ends 7 to 30 days ago: `recent`
    /// - otherwise: `base`
    #[must_use]
    pub fn ttl_for(&self, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Duration {
        let span_days = (end - start).num_days() + 1;
        if start <= today && today <= end && span_days <= LIVE_RANGE_MAX_DAYS {
            return self.live;
        }

        let age_days = (today - end).num_days();
        if age_days > HISTORICAL_AGE_DAYS {
            self.historical
        } else if age_days >= RECENT_AGE_DAYS {
            self.recent
        } else {
            self.base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_ttl_tiers() {
        let policy = TtlPolicy::default();
        let today = date("2024-06-30");

        assert_eq!(
            policy.ttl_for(date("2024-06-29"), today, today),
            Duration::from_secs(120)
        );
        assert_eq!(
            policy.ttl_for(date("2024-06-23"), today, today),
            Duration::from_secs(300)
        );
        assert_eq!(
            policy.ttl_for(date("2024-06-01"), date("2024-06-20"), today),
            Duration::from_secs(3_600)
        );
        assert_eq!(
            policy.ttl_for(date("2024-01-01"), date("2024-05-01"), today),
            Duration::from_secs(43_200)
        );
    }

    #[test]
    fn test_cache_key_uses_exact_strings() {
        let patient = Uuid::new_v4();
        let a = CacheKey::new(patient, Metric::Steps, "2024-06-01", "2024-06-07");
        let b = CacheKey::new(patient, Metric::Steps, "2024-6-1", "2024-06-07");
        assert_ne!(a.to_string(), b.to_string());
        assert!(a.to_string().starts_with(&CacheKey::patient_prefix(patient)));
        assert!(a.to_string().contains(":steps:"));
    }
}
