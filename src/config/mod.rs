// ABOUTME: Configuration module for the vitals engine
// ABOUTME: Groups provider, rate limit, HTTP, cache, token and connection settings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Environment variable configuration loading
pub mod environment;

pub use environment::{
    CacheConfig, ConnectionConfig, EngineConfig, HttpClientConfig, ProviderConfig,
    RateLimitConfig, TokenConfig, TtlPolicy,
};
