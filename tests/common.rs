// ABOUTME: Shared test utilities: quiet logging, engine wiring and an axum mock provider
// ABOUTME: The mock serves token, revoke and data endpoints with request counters for assertions
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `vitals_bridge`

use axum::{
    body::Body,
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::Response,
    routing::post,
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;
use vitals_bridge::cache::memory::InMemoryCache;
use vitals_bridge::config::{EngineConfig, ProviderConfig, TtlPolicy};
use vitals_bridge::engine::VitalsEngine;
use vitals_bridge::rate_limiting::RateLimiter;
use vitals_bridge::storage::memory::InMemoryLinkRepository;
use vitals_bridge::storage::LinkRepository;
use vitals_core::models::{PlatformLink, Provider, TokenSet};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Canned HTTP response
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub retry_after: Option<String>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            retry_after: None,
            delay: Duration::ZERO,
        }
    }

    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    pub fn with_retry_after(mut self, value: &str) -> Self {
        self.retry_after = Some(value.to_owned());
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn into_response(self) -> Response {
        let mut builder = Response::builder()
            .status(StatusCode::from_u16(self.status).unwrap())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(retry_after) = self.retry_after {
            builder = builder.header(header::RETRY_AFTER, retry_after);
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

/// Request observed by the mock data endpoint
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub accept_language: Option<String>,
}

/// Token endpoint call observed by the mock
#[derive(Debug, Clone)]
pub struct RecordedTokenCall {
    pub authorization: Option<String>,
    pub params: HashMap<String, String>,
}

/// Shared mock state
pub struct MockState {
    pub data_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub revoke_calls: AtomicUsize,
    pub data_response: Mutex<MockResponse>,
    pub token_response: Mutex<Option<MockResponse>>,
    pub revoke_status: Mutex<u16>,
    pub token_delay: Mutex<Duration>,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub token_requests: Mutex<Vec<RecordedTokenCall>>,
}

impl MockState {
    pub fn set_data_response(&self, response: MockResponse) {
        *self.data_response.lock().unwrap() = response;
    }

    /// Fixed token endpoint response; `None` returns a fresh numbered token
    pub fn set_token_response(&self, response: Option<MockResponse>) {
        *self.token_response.lock().unwrap() = response;
    }

    pub fn set_token_delay(&self, delay: Duration) {
        *self.token_delay.lock().unwrap() = delay;
    }

    pub fn set_revoke_status(&self, status: u16) {
        *self.revoke_status.lock().unwrap() = status;
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn last_token_call(&self) -> RecordedTokenCall {
        self.token_requests.lock().unwrap().last().cloned().unwrap()
    }
}

/// Mock provider bound to an ephemeral local port
pub struct MockProvider {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            data_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            data_response: Mutex::new(MockResponse::ok(&json!({}))),
            token_response: Mutex::new(None),
            revoke_status: Mutex::new(200),
            token_delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
            token_requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/oauth2/token", post(token_handler))
            .route("/oauth2/revoke", post(revoke_handler))
            .fallback(data_handler)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Engine configuration pointing every provider URL at this mock
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            provider: ProviderConfig {
                client_id: "test-client".to_owned(),
                client_secret: "test-secret".to_owned(),
                redirect_uri: "https://clinic.example.com/oauth/callback".to_owned(),
                auth_url: format!("{}/oauth2/authorize", self.base_url),
                token_url: format!("{}/oauth2/token", self.base_url),
                api_base_url: self.base_url.clone(),
                revoke_url: format!("{}/oauth2/revoke", self.base_url),
                ..ProviderConfig::default()
            },
            ..EngineConfig::default()
        };
        config.http.timeout_secs = 5;
        config
    }
}

async fn data_handler(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.data_calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_owned(),
        authorization: header_value(&headers, header::AUTHORIZATION),
        accept_language: header_value(&headers, header::ACCEPT_LANGUAGE),
    });

    let response = state.data_response.lock().unwrap().clone();
    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }
    response.into_response()
}

async fn token_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let call = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.token_requests.lock().unwrap().push(RecordedTokenCall {
        authorization: header_value(&headers, header::AUTHORIZATION),
        params,
    });

    let delay = *state.token_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let fixed = state.token_response.lock().unwrap().clone();
    fixed
        .unwrap_or_else(|| {
            MockResponse::ok(&json!({
                "access_token": format!("refreshed-access-{call}"),
                "refresh_token": format!("refreshed-refresh-{call}"),
                "expires_in": 28_800,
                "token_type": "Bearer",
            }))
        })
        .into_response()
}

async fn revoke_handler(State(state): State<Arc<MockState>>) -> Response {
    state.revoke_calls.fetch_add(1, Ordering::SeqCst);
    let status = *state.revoke_status.lock().unwrap();
    MockResponse::json(status, &json!({})).into_response()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Engine plus the collaborators tests inspect
pub struct TestEngine {
    pub engine: VitalsEngine,
    pub links: Arc<InMemoryLinkRepository>,
    pub cache: Arc<InMemoryCache>,
    pub limiter: Arc<RateLimiter>,
}

pub fn build_engine(config: EngineConfig) -> TestEngine {
    let links = Arc::new(InMemoryLinkRepository::new());
    let cache = Arc::new(InMemoryCache::new(&config.cache));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.hourly_limit));
    let engine = VitalsEngine::new(
        config,
        Arc::clone(&links) as Arc<dyn LinkRepository>,
        Arc::clone(&cache) as _,
        Arc::clone(&limiter),
    );
    TestEngine {
        engine,
        links,
        cache,
        limiter,
    }
}

/// Configuration with every cache tier set to `ttl`
pub fn with_uniform_ttl(mut config: EngineConfig, ttl: Duration) -> EngineConfig {
    config.cache.ttl = TtlPolicy::uniform(ttl);
    config
}

/// Store a connected patient whose access token expires in `expires_in`
pub async fn connect_patient(links: &InMemoryLinkRepository, expires_in: ChronoDuration) -> Uuid {
    let patient_id = Uuid::new_v4();
    let now = Utc::now();
    let mut link = PlatformLink::new(patient_id);
    link.connect(
        Provider::Fitbit,
        TokenSet {
            access_token: "stored-access".to_owned(),
            refresh_token: "stored-refresh".to_owned(),
            expires_at: now + expires_in,
        },
        now,
    );
    links.save_platform_link(&link).await.unwrap();
    patient_id
}

/// Current tokens for a patient
pub async fn stored_tokens(links: &InMemoryLinkRepository, patient_id: Uuid) -> Option<TokenSet> {
    links
        .get_platform_link(patient_id)
        .await
        .unwrap()
        .and_then(|link| link.tokens)
}
