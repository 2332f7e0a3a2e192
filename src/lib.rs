// ABOUTME: Main library entry point for the wearable vitals integration engine
// ABOUTME: Wires token lifecycle, shared rate limiting, caching, dispatch and normalization
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Vitals Bridge
//!
//! Connects a patient record to a third-party health platform (Fitbit), keeps the
//! OAuth2 grant fresh, spends a single provider-wide hourly call budget, caches
//! normalized results with an age-dependent TTL, and turns heterogeneous provider
//! payloads into one [`VitalRecord`](vitals_core::models::VitalRecord) shape.
//!
//! ## Consumed-by contract
//!
//! - [`engine::VitalsEngine::get_vitals`] - normalized vitals for a patient, metric and range
//! - [`connections::ConnectionManager`] - create/consume connection links, disconnect
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use uuid::Uuid;
//! use vitals_bridge::cache::memory::InMemoryCache;
//! use vitals_bridge::config::environment::EngineConfig;
//! use vitals_bridge::engine::VitalsEngine;
//! use vitals_bridge::rate_limiting::RateLimiter;
//! use vitals_bridge::storage::memory::InMemoryLinkRepository;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let cache = Arc::new(InMemoryCache::new(&config.cache));
//! let links = Arc::new(InMemoryLinkRepository::new());
//! let limiter = Arc::new(RateLimiter::new(config.rate_limit.hourly_limit));
//! let engine = VitalsEngine::new(config, links, cache, limiter);
//!
//! let outcome = engine.get_vitals(Uuid::new_v4(), "steps", None, None).await;
//! println!("{} records", outcome.records.len());
//! # Ok(())
//! # }
//! ```

/// Environment-based configuration
pub mod config;

/// Logging configuration and subscriber setup
pub mod logging;

/// HTTP client construction for provider calls
pub mod http_client;

/// Static metric-to-endpoint table
pub mod registry;

/// OAuth2 authorization, code exchange, refresh and revocation
pub mod oauth2_client;

/// Persistence seam toward the patient record
pub mod storage;

/// Access-token lifecycle with refresh coalescing
pub mod tokens;

/// Provider-wide hourly call budget
pub mod rate_limiting;

/// Normalized result caching with adaptive TTL
pub mod cache;

/// Endpoint selection and authenticated provider calls
pub mod dispatcher;

/// Provider payload to `VitalRecord` conversion
pub mod normalizer;

/// Connection link lifecycle
pub mod connections;

/// `VitalsEngine` facade
pub mod engine;

pub use vitals_core::errors::{AppError, AppResult, UnavailableReason, VitalsError, VitalsResult};
pub use vitals_core::models::{Metric, Provider, VitalRecord, VitalsSummary};
