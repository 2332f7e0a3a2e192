// ABOUTME: Core types and constants for the wearable vitals integration engine
// ABOUTME: Foundation crate with error handling, constants, and data models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Vitals Core
//!
//! Foundation crate providing shared types and constants for the vitals
//! bridge engine. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: `AppError`/`ErrorCode` envelope and the `VitalsError` taxonomy
//! - **constants**: Defaults for cache TTLs, rate limits, OAuth endpoints and env names
//! - **models**: Providers, metrics, normalized vital records, platform and connection links

/// Unified error handling system with standard error codes
pub mod errors;

/// Engine constants organized by domain
pub mod constants;

/// Core data models (Provider, Metric, `VitalRecord`, links)
pub mod models;
