// ABOUTME: Standardized vital-sign record shape returned to consumers
// ABOUTME: Includes the summary statistics stored next to cached results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// How a value was derived when the provider offers more than one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTag {
    /// Provider-reported resting heart rate
    Resting,
    /// Mean of heart-rate zone midpoints
    ZoneAvg,
}

/// One normalized data point
///
/// `recorded_at` always equals `timestamp`; it is kept for consumers that
/// still read the older field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalRecord {
    /// Provider timestamp string (usually `YYYY-MM-DD`)
    pub timestamp: String,
    /// Duplicate of `timestamp`
    pub recorded_at: String,
    /// Value after the descriptor transform
    pub value: f64,
    /// Display unit from the endpoint descriptor
    pub unit: String,
    /// Derivation tag, set for heart rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ValueTag>,
}

impl VitalRecord {
    /// Create a record, duplicating the timestamp into `recorded_at`
    #[must_use]
    pub fn new(timestamp: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            recorded_at: timestamp.clone(),
            timestamp,
            value,
            unit: unit.into(),
            tag: None,
        }
    }

    /// Attach a derivation tag
    #[must_use]
    pub const fn with_tag(mut self, tag: ValueTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Count/min/max/avg over a set of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsSummary {
    /// Number of records
    pub count: usize,
    /// Smallest value, `None` when empty
    pub min: Option<f64>,
    /// Largest value, `None` when empty
    pub max: Option<f64>,
    /// Arithmetic mean, `None` when empty
    pub avg: Option<f64>,
    /// Unit shared by the records
    pub unit: String,
}

impl VitalsSummary {
    /// Summarize `records`, all expressed in `unit`
    #[must_use]
    pub fn from_records(records: &[VitalRecord], unit: &str) -> Self {
        let count = records.len();
        let (min, max, sum) = records.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), record| (min.min(record.value), max.max(record.value), sum + record.value),
        );

        if count == 0 {
            return Self {
                count,
                min: None,
                max: None,
                avg: None,
                unit: unit.to_owned(),
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let avg = sum / count as f64;

        Self {
            count,
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
            unit: unit.to_owned(),
        }
    }
}
