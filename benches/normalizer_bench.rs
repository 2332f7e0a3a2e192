// ABOUTME: Criterion benchmarks for payload normalization and the in-memory vitals cache
// ABOUTME: Measures heart-rate and sleep normalization over growing ranges plus cache get/put
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the vitals hot path.
//!
//! Normalization runs on every provider fetch; the cache sits in front of
//! every request.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::runtime::Runtime;
use uuid::Uuid;
use vitals_bridge::cache::memory::InMemoryCache;
use vitals_bridge::cache::{CacheConfig, CacheKey, CacheStore, CachedVitals};
use vitals_bridge::normalizer::normalize;
use vitals_bridge::registry::descriptor;
use vitals_core::models::{Metric, Provider, VitalsSummary};

const RANGE_SIZES: [usize; 3] = [7, 90, 365];

fn day(index: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    #[allow(clippy::cast_possible_wrap)]
    let date = start + ChronoDuration::days(index as i64);
    date.format("%Y-%m-%d").to_string()
}

/// Heart-rate payload alternating resting values and zone-only entries
fn heart_rate_payload(days: usize) -> Value {
    let entries: Vec<Value> = (0..days)
        .map(|i| {
            if i % 3 == 0 {
                json!({
                    "dateTime": day(i),
                    "value": {"heartRateZones": [
                        {"name": "Out of Range", "min": 30, "max": 96},
                        {"name": "Fat Burn", "min": 96, "max": 134},
                        {"name": "Cardio", "min": 134, "max": 163},
                        {"name": "Peak", "min": 163, "max": 220}
                    ]}
                })
            } else {
                json!({"dateTime": day(i), "value": {"restingHeartRate": 55 + i % 10}})
            }
        })
        .collect();
    json!({ "activities-heart": entries })
}

fn sleep_payload(days: usize) -> Value {
    let entries: Vec<Value> = (0..days)
        .map(|i| json!({"dateOfSleep": day(i), "minutesAsleep": 360 + i % 120}))
        .collect();
    json!({ "sleep": entries })
}

#[allow(clippy::cast_possible_truncation)]
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for days in RANGE_SIZES {
        group.throughput(Throughput::Elements(days as u64));

        let payload = heart_rate_payload(days);
        group.bench_with_input(BenchmarkId::new("heart_rate", days), &payload, |b, payload| {
            b.iter(|| normalize(black_box(payload), descriptor(Metric::HeartRate)));
        });

        let payload = sleep_payload(days);
        group.bench_with_input(BenchmarkId::new("sleep_duration", days), &payload, |b, payload| {
            b.iter(|| normalize(black_box(payload), descriptor(Metric::SleepDuration)));
        });
    }

    group.finish();
}

fn cached_entry(days: usize) -> CachedVitals {
    let records = normalize(&heart_rate_payload(days), descriptor(Metric::HeartRate));
    let summary = VitalsSummary::from_records(&records, "bpm");
    CachedVitals {
        records,
        summary,
        provider: Provider::Fitbit,
        cached_at: Utc::now(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bench_cache(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("vitals_cache");
    let patient = Uuid::from_u128(42);

    for days in RANGE_SIZES {
        let cache = InMemoryCache::new(&CacheConfig::default());
        let entry = cached_entry(days);
        let key = CacheKey::new(patient, Metric::HeartRate, day(0), day(days - 1));
        rt.block_on(cache.put(&key, &entry, Duration::from_secs(3600)))
            .unwrap();

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("get_hit", days), &key, |b, key| {
            b.iter(|| rt.block_on(async { cache.get(black_box(key)).await }));
        });
        group.bench_with_input(BenchmarkId::new("put", days), &entry, |b, entry| {
            b.iter(|| {
                rt.block_on(async {
                    cache
                        .put(black_box(&key), black_box(entry), Duration::from_secs(3600))
                        .await
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_cache);
criterion_main!(benches);
