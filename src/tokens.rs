// ABOUTME: Access-token lifecycle for patient platform links
// ABOUTME: Refresh-on-demand with a five-minute buffer and one refresh per patient/provider at a time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::logging::VitalsLogger;
use crate::oauth2_client::OAuth2Client;
use crate::storage::LinkRepository;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use vitals_core::errors::{VitalsError, VitalsResult};
use vitals_core::models::{Provider, TokenSet};

type RefreshKey = (Uuid, Provider);

/// Hands out valid access tokens, refreshing them when they are about to expire
///
/// Concurrent callers for the same patient and provider queue on a per-key
/// lock; the first performs the refresh and the rest reuse its result. The
/// refresh itself runs on a spawned task so a cancelled caller cannot leave a
/// rotated refresh token unpersisted.
pub struct TokenStore {
    links: Arc<dyn LinkRepository>,
    oauth: OAuth2Client,
    refresh_buffer: Duration,
    default_lifetime_secs: i64,
    refresh_locks: DashMap<RefreshKey, Arc<Mutex<()>>>,
}

impl TokenStore {
    /// Create a token store
    #[must_use]
    pub fn new(
        links: Arc<dyn LinkRepository>,
        oauth: OAuth2Client,
        refresh_buffer_secs: i64,
    ) -> Self {
        let default_lifetime_secs = oauth.config().default_token_lifetime_secs;
        Self {
            links,
            oauth,
            refresh_buffer: Duration::seconds(refresh_buffer_secs),
            default_lifetime_secs,
            refresh_locks: DashMap::new(),
        }
    }

    /// Valid access token for the patient's provider grant
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when there is no token data for `provider`,
    /// `RefreshFailed` when the token was near expiry and the refresh failed
    #[instrument(skip(self), fields(patient_id = %patient_id, provider = %provider))]
    pub async fn get_valid_access_token(
        &self,
        patient_id: Uuid,
        provider: Provider,
    ) -> VitalsResult<String> {
        let tokens = self.current_tokens(patient_id, provider).await?;
        if tokens.is_fresh(Utc::now(), self.refresh_buffer) {
            return Ok(tokens.access_token);
        }

        let guard = self.refresh_lock(patient_id, provider).lock_owned().await;

        // A concurrent caller may have refreshed while we waited
        let tokens = self.current_tokens(patient_id, provider).await?;
        if tokens.is_fresh(Utc::now(), self.refresh_buffer) {
            debug!("Reusing access token refreshed by a concurrent request");
            return Ok(tokens.access_token);
        }

        self.refresh(patient_id, provider, tokens, guard).await
    }

    async fn current_tokens(&self, patient_id: Uuid, provider: Provider) -> VitalsResult<TokenSet> {
        self.links
            .get_platform_link(patient_id)
            .await?
            .and_then(|link| link.tokens_for(provider).cloned())
            .ok_or(VitalsError::NotConnected {
                patient_id,
                provider,
            })
    }

    fn refresh_lock(&self, patient_id: Uuid, provider: Provider) -> Arc<Mutex<()>> {
        let entry = self.refresh_locks.entry((patient_id, provider)).or_default();
        Arc::clone(entry.value())
    }

    async fn refresh(
        &self,
        patient_id: Uuid,
        provider: Provider,
        stale: TokenSet,
        guard: OwnedMutexGuard<()>,
    ) -> VitalsResult<String> {
        info!(
            expires_at = %stale.expires_at,
            "Refreshing access token"
        );

        let links = Arc::clone(&self.links);
        let oauth = self.oauth.clone();
        let default_lifetime_secs = self.default_lifetime_secs;

        let task = tokio::spawn(async move {
            let _guard = guard;
            let grant = oauth
                .refresh_token(&stale.refresh_token)
                .await
                .map_err(|e| VitalsError::RefreshFailed {
                    provider,
                    reason: e.to_string(),
                })?;

            let tokens =
                grant.into_token_set(Utc::now(), default_lifetime_secs, Some(&stale.refresh_token));
            let access_token = tokens.access_token.clone();
            links.update_tokens(patient_id, provider, tokens).await?;
            Ok::<_, VitalsError>(access_token)
        });

        let result = task.await.unwrap_or_else(|e| {
            Err(VitalsError::RefreshFailed {
                provider,
                reason: format!("refresh task failed: {e}"),
            })
        });

        VitalsLogger::log_oauth_event(
            &patient_id.to_string(),
            provider.as_str(),
            "token_refresh",
            result.is_ok(),
        );
        result
    }
}
