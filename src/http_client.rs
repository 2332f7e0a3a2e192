// ABOUTME: HTTP client construction for provider API calls
// ABOUTME: Applies request and connect timeouts from the engine configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::HttpClientConfig;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::warn;

/// Build a pooled client that honours `config` timeouts
///
/// One client is shared by the OAuth client and the dispatcher of an engine.
#[must_use]
pub fn client_for(config: &HttpClientConfig) -> Client {
    build_client(config.timeout_secs, config.connect_timeout_secs)
}

fn build_client(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_default_config() {
        let _client = client_for(&HttpClientConfig::default());
    }
}
