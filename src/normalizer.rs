// ABOUTME: Converts raw provider JSON into standardized vital records
// ABOUTME: Flat and dotted value paths, heart-rate resting/zone rule, per-entry error tolerance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Response normalization
//!
//! One payload in, a list of [`VitalRecord`]s out. Problems with a single
//! entry never abort the batch: the entry is logged and skipped.

use crate::registry::{EndpointDescriptor, SeriesLocation};
use serde_json::Value;
use tracing::{debug, warn};
use vitals_core::models::{Metric, ValueTag, VitalRecord};

const RESTING_HEART_RATE_PATH: &str = "value.restingHeartRate";
const HEART_RATE_ZONES_PATH: &str = "value.heartRateZones";

/// Normalize a provider payload using `descriptor`
#[must_use]
pub fn normalize(payload: &Value, descriptor: &EndpointDescriptor) -> Vec<VitalRecord> {
    let entries = series(payload, descriptor.series);
    let total = entries.len();

    let records: Vec<VitalRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| normalize_entry(entry, index, descriptor))
        .collect();

    debug!(
        metric = %descriptor.metric,
        entries = total,
        records = records.len(),
        "Normalized provider payload"
    );
    records
}

/// Entries of the series; a missing key yields no entries
fn series(payload: &Value, location: SeriesLocation) -> Vec<&Value> {
    let node = match location {
        SeriesLocation::Root => Some(payload),
        SeriesLocation::Key(key) => payload.get(key),
    };

    match node {
        Some(Value::Array(items)) => items.iter().collect(),
        // single-day responses deliver one object instead of an array
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(object @ Value::Object(_)) => vec![object],
        Some(Value::Null) | None => {
            debug!(?location, "Series not present in payload");
            Vec::new()
        }
        Some(other) => {
            warn!(?location, kind = json_kind(other), "Series is not an array, ignoring");
            Vec::new()
        }
    }
}

fn normalize_entry(entry: &Value, index: usize, descriptor: &EndpointDescriptor) -> Option<VitalRecord> {
    let Some(timestamp) = entry.get(descriptor.timestamp_key).and_then(Value::as_str) else {
        warn!(
            metric = %descriptor.metric,
            index,
            timestamp_key = descriptor.timestamp_key,
            "Skipping entry without timestamp"
        );
        return None;
    };

    let (raw, tag) = if descriptor.metric == Metric::HeartRate {
        heart_rate_value(entry, timestamp)?
    } else {
        (extract_value(entry, descriptor.value_path, descriptor.metric, timestamp)?, None)
    };

    let value = descriptor.transform.apply(raw);
    let record = VitalRecord::new(timestamp, value, descriptor.unit);
    Some(match tag {
        Some(tag) => record.with_tag(tag),
        None => record,
    })
}

fn extract_value(entry: &Value, path: &str, metric: Metric, timestamp: &str) -> Option<f64> {
    let Some(node) = resolve_path(entry, path) else {
        debug!(%metric, timestamp, path, "Value path missing, skipping entry");
        return None;
    };

    let parsed = numeric(node);
    if parsed.is_none() {
        warn!(
            %metric,
            timestamp,
            path,
            kind = json_kind(node),
            "Skipping entry with non-numeric value"
        );
    }
    parsed
}

/// Resting heart rate when present, otherwise the mean of zone midpoints
fn heart_rate_value(entry: &Value, timestamp: &str) -> Option<(f64, Option<ValueTag>)> {
    if let Some(node) = resolve_path(entry, RESTING_HEART_RATE_PATH) {
        if let Some(resting) = numeric(node) {
            return Some((resting, Some(ValueTag::Resting)));
        }
        warn!(timestamp, "Non-numeric restingHeartRate, trying heart rate zones");
    }

    let zones = resolve_path(entry, HEART_RATE_ZONES_PATH)
        .and_then(Value::as_array)
        .filter(|zones| !zones.is_empty());
    let Some(zones) = zones else {
        debug!(timestamp, "No resting heart rate or zones, skipping entry");
        return None;
    };

    let midpoints: Vec<f64> = zones
        .iter()
        .filter_map(|zone| {
            let min = zone.get("min").and_then(numeric)?;
            let max = zone.get("max").and_then(numeric)?;
            Some((min + max) / 2.0)
        })
        .collect();

    if midpoints.is_empty() {
        warn!(timestamp, "Heart rate zones without numeric bounds, skipping entry");
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = midpoints.iter().sum::<f64>() / midpoints.len() as f64;
    Some((mean, Some(ValueTag::ZoneAvg)))
}

/// Resolve a flat key or dotted path by descending through nested objects
#[must_use]
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => value.get(path).filter(|node| !node.is_null()),
        Some((head, rest)) => resolve_path(value.get(head)?, rest),
    }
}

/// Numeric value of a JSON number or numeric string
#[must_use]
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_path_descends_nested_objects() {
        let entry = json!({"value": {"avg": 95.5, "inner": {"deep": 1}}});
        assert_eq!(resolve_path(&entry, "value.avg"), Some(&json!(95.5)));
        assert_eq!(resolve_path(&entry, "value.inner.deep"), Some(&json!(1)));
        assert!(resolve_path(&entry, "value.missing").is_none());
        assert!(resolve_path(&entry, "value.avg.too_deep").is_none());
    }

    #[test]
    fn test_numeric_accepts_strings() {
        assert_eq!(numeric(&json!("8432")), Some(8432.0));
        assert_eq!(numeric(&json!(7.5)), Some(7.5));
        assert_eq!(numeric(&json!("n/a")), None);
        assert_eq!(numeric(&json!(true)), None);
    }
}
