// ABOUTME: Core data models for wearable integration (providers, metrics, vitals, links)
// ABOUTME: Shared by the engine components and by consumers of the vitals contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Patient platform links, connection links and token sets
pub mod link;
/// Closed set of supported metrics
pub mod metric;
/// Supported health platforms
pub mod provider;
/// Normalized vital-sign records and summaries
pub mod vital;

pub use link::{ConnectionLink, PlatformLink, TokenSet};
pub use metric::Metric;
pub use provider::Provider;
pub use vital::{ValueTag, VitalRecord, VitalsSummary};
