// ABOUTME: Cache-related constants for adaptive TTLs and in-memory capacity
// ABOUTME: TTL tiers follow how likely the provider is to still be mutating the data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default maximum cache entries for the in-memory store
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Base TTL (5 minutes) for ranges ending within the last week
pub const TTL_BASE_SECS: u64 = 300;

/// TTL (2 minutes) for short ranges that include today - still mutating at the source
pub const TTL_LIVE_SECS: u64 = 120;

/// TTL (1 hour) for ranges that ended 7-30 days ago
pub const TTL_RECENT_SECS: u64 = 3_600;

/// TTL (12 hours) for ranges that ended more than 30 days ago
pub const TTL_HISTORICAL_SECS: u64 = 43_200;

/// Longest span (days, inclusive) that still counts as a "live" range when it includes today
pub const LIVE_RANGE_MAX_DAYS: i64 = 2;

/// Age (days since range end) from which the recent TTL applies
pub const RECENT_AGE_DAYS: i64 = 7;

/// Age (days since range end) beyond which the historical TTL applies
pub const HISTORICAL_AGE_DAYS: i64 = 30;
