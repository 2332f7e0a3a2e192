// ABOUTME: Token refresh tests against a mock OAuth token endpoint
// ABOUTME: Refresh buffer, failure handling, rotation and coalescing of concurrent refreshes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::Duration;
use common::{connect_patient, init_test_logging, stored_tokens, MockProvider, MockResponse};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use vitals_bridge::oauth2_client::OAuth2Client;
use vitals_bridge::storage::memory::InMemoryLinkRepository;
use vitals_bridge::storage::LinkRepository;
use vitals_bridge::tokens::TokenStore;
use vitals_bridge::VitalsError;
use vitals_core::models::{PlatformLink, Provider};

const REFRESH_BUFFER_SECS: i64 = 300;

fn token_store(mock: &MockProvider, links: &Arc<InMemoryLinkRepository>) -> Arc<TokenStore> {
    let oauth = OAuth2Client::new(mock.config().provider, reqwest::Client::new());
    Arc::new(TokenStore::new(
        Arc::clone(links) as Arc<dyn LinkRepository>,
        oauth,
        REFRESH_BUFFER_SECS,
    ))
}

#[tokio::test]
async fn test_token_outside_buffer_is_used_as_is() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(6)).await;
    let store = token_store(&mock, &links);

    let token = store.get_valid_access_token(patient, Provider::Fitbit).await?;

    assert_eq!(token, "stored-access");
    assert_eq!(mock.state.token_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_token_inside_buffer_is_refreshed() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(4)).await;
    let store = token_store(&mock, &links);

    let token = store.get_valid_access_token(patient, Provider::Fitbit).await?;

    assert_eq!(token, "refreshed-access-1");
    assert_eq!(mock.state.token_calls(), 1);

    let call = mock.state.last_token_call();
    assert_eq!(call.params.get("grant_type").map(String::as_str), Some("refresh_token"));
    assert_eq!(call.params.get("refresh_token").map(String::as_str), Some("stored-refresh"));
    assert!(call.authorization.unwrap().starts_with("Basic "));

    let tokens = stored_tokens(&links, patient).await.unwrap();
    assert_eq!(tokens.access_token, "refreshed-access-1");
    assert_eq!(tokens.refresh_token, "refreshed-refresh-1");
    assert!(tokens.expires_at > chrono::Utc::now() + Duration::hours(7));
    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_refreshed() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::hours(-2)).await;
    let store = token_store(&mock, &links);

    let token = store.get_valid_access_token(patient, Provider::Fitbit).await?;
    assert_eq!(token, "refreshed-access-1");
    Ok(())
}

#[tokio::test]
async fn test_refresh_without_new_refresh_token_keeps_previous() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    mock.state.set_token_response(Some(MockResponse::ok(&json!({
        "access_token": "rotated-access",
        "expires_in": 3600
    }))));
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(1)).await;
    let store = token_store(&mock, &links);

    store.get_valid_access_token(patient, Provider::Fitbit).await?;

    let tokens = stored_tokens(&links, patient).await.unwrap();
    assert_eq!(tokens.access_token, "rotated-access");
    assert_eq!(tokens.refresh_token, "stored-refresh");
    Ok(())
}

#[tokio::test]
async fn test_refresh_failure_leaves_tokens_untouched() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    mock.state.set_token_response(Some(MockResponse::json(
        400,
        &json!({"errors": [{"errorType": "invalid_grant"}]}),
    )));
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(2)).await;
    let before = stored_tokens(&links, patient).await.unwrap();
    let store = token_store(&mock, &links);

    let result = store.get_valid_access_token(patient, Provider::Fitbit).await;

    assert!(matches!(
        result,
        Err(VitalsError::RefreshFailed {
            provider: Provider::Fitbit,
            ..
        })
    ));
    assert_eq!(stored_tokens(&links, patient).await.unwrap(), before);
    Ok(())
}

#[tokio::test]
async fn test_missing_tokens_is_not_connected() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    let links = Arc::new(InMemoryLinkRepository::new());
    let store = token_store(&mock, &links);

    let unknown = store
        .get_valid_access_token(Uuid::new_v4(), Provider::Fitbit)
        .await;
    assert!(matches!(unknown, Err(VitalsError::NotConnected { .. })));

    // a link record without tokens (issued but never completed)
    let patient = Uuid::new_v4();
    links.save_platform_link(&PlatformLink::new(patient)).await?;
    let pending = store.get_valid_access_token(patient, Provider::Fitbit).await;
    assert!(matches!(pending, Err(VitalsError::NotConnected { .. })));

    assert_eq!(mock.state.token_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_refreshes_are_coalesced() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    mock.state.set_token_delay(std::time::Duration::from_millis(200));
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(1)).await;
    let store = token_store(&mock, &links);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get_valid_access_token(patient, Provider::Fitbit).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await??, "refreshed-access-1");
    }
    assert_eq!(mock.state.token_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_caller_still_persists_refresh() -> Result<()> {
    init_test_logging();
    let mock = MockProvider::start().await;
    mock.state.set_token_delay(std::time::Duration::from_millis(200));
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient = connect_patient(&links, Duration::minutes(1)).await;
    let store = token_store(&mock, &links);

    let caller = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.get_valid_access_token(patient, Provider::Fitbit).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    caller.abort();

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    let tokens = stored_tokens(&links, patient).await.unwrap();
    assert_eq!(tokens.access_token, "refreshed-access-1");
    assert_eq!(tokens.refresh_token, "refreshed-refresh-1");

    // the next caller sees the persisted token without another refresh
    let token = store.get_valid_access_token(patient, Provider::Fitbit).await?;
    assert_eq!(token, "refreshed-access-1");
    assert_eq!(mock.state.token_calls(), 1);
    Ok(())
}
