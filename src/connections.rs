// ABOUTME: Connection-link lifecycle: issue, authorize URL, consume on OAuth callback, disconnect
// ABOUTME: Newer links supersede older unused ones; each link is claimed atomically and only once
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::cache::CacheStore;
use crate::logging::VitalsLogger;
use crate::oauth2_client::OAuth2Client;
use crate::storage::LinkRepository;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use vitals_core::errors::VitalsResult;
use vitals_core::models::{ConnectionLink, PlatformLink, Provider};

/// Issues and redeems connection links and tears down platform grants
pub struct ConnectionManager {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheStore>,
    oauth: OAuth2Client,
    link_ttl: Duration,
}

impl ConnectionManager {
    /// Create a connection manager
    #[must_use]
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheStore>,
        oauth: OAuth2Client,
        link_ttl_hours: i64,
    ) -> Self {
        Self {
            links,
            cache,
            oauth,
            link_ttl: Duration::hours(link_ttl_hours),
        }
    }

    /// Issue a connection link, superseding earlier unused links for the same patient and provider
    ///
    /// # Errors
    ///
    /// Returns `Storage` on repository failure
    #[instrument(skip(self), fields(patient_id = %patient_id, provider = %provider))]
    pub async fn create_connection_link(
        &self,
        patient_id: Uuid,
        clinician_id: Uuid,
        provider: Provider,
    ) -> VitalsResult<ConnectionLink> {
        let superseded = self
            .links
            .supersede_connection_links(patient_id, provider)
            .await?;

        let link = ConnectionLink::new(patient_id, clinician_id, provider, Utc::now(), self.link_ttl);
        self.links.insert_connection_link(&link).await?;

        if self.links.get_platform_link(patient_id).await?.is_none() {
            self.links
                .save_platform_link(&PlatformLink::new(patient_id))
                .await?;
        }

        info!(
            link_id = %link.id,
            clinician_id = %clinician_id,
            superseded,
            expires_at = %link.expires_at,
            "Connection link issued"
        );
        Ok(link)
    }

    /// Provider authorize URL for `link`, with the link id as OAuth `state`
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorize URL is invalid
    pub fn authorization_url(&self, link: &ConnectionLink) -> VitalsResult<String> {
        self.oauth.authorization_url(&link.id.to_string())
    }

    /// Redeem a link with the authorization code from the OAuth callback
    ///
    /// The link is claimed before the code exchange and stays used even when
    /// the exchange fails.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConnectionLink` for unknown, used or expired links,
    /// `Http`/`MalformedResponse` when the code exchange fails
    #[instrument(skip(self, auth_code), fields(link_id = %link_id))]
    pub async fn consume_connection_link(
        &self,
        link_id: Uuid,
        auth_code: &str,
    ) -> VitalsResult<PlatformLink> {
        let link = self.links.claim_connection_link(link_id, Utc::now()).await?;
        let patient = link.patient_id.to_string();

        let grant = match self.oauth.exchange_code(auth_code).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Authorization code exchange failed");
                VitalsLogger::log_oauth_event(&patient, link.provider.as_str(), "code_exchange", false);
                return Err(e);
            }
        };

        let now = Utc::now();
        let tokens = grant.into_token_set(
            now,
            self.oauth.config().default_token_lifetime_secs,
            None,
        );

        let mut platform_link = self
            .links
            .get_platform_link(link.patient_id)
            .await?
            .unwrap_or_else(|| PlatformLink::new(link.patient_id));
        platform_link.connect(link.provider, tokens, now);
        self.links.save_platform_link(&platform_link).await?;
        self.invalidate_cached(link.patient_id).await;

        VitalsLogger::log_oauth_event(&patient, link.provider.as_str(), "connected", true);
        Ok(platform_link)
    }

    /// Revoke (best effort) and clear the patient's grant for `provider`
    ///
    /// # Errors
    ///
    /// Returns `Storage` on repository failure; revocation failures are only logged
    #[instrument(skip(self), fields(patient_id = %patient_id, provider = %provider))]
    pub async fn disconnect(&self, patient_id: Uuid, provider: Provider) -> VitalsResult<()> {
        let Some(link) = self.links.get_platform_link(patient_id).await? else {
            info!("No platform link to disconnect");
            return Ok(());
        };

        if link.provider.is_some_and(|connected| connected != provider) {
            info!(connected = ?link.provider, "Patient is connected to a different provider, nothing to disconnect");
            return Ok(());
        }

        if let Some(tokens) = link.tokens_for(provider) {
            if let Err(e) = self.oauth.revoke_token(&tokens.access_token).await {
                warn!(error = %e, "Token revocation failed, clearing local grant anyway");
            }
        }

        self.links.clear_platform_link(patient_id).await?;
        self.invalidate_cached(patient_id).await;

        VitalsLogger::log_oauth_event(&patient_id.to_string(), provider.as_str(), "disconnected", true);
        Ok(())
    }

    async fn invalidate_cached(&self, patient_id: Uuid) {
        match self.cache.invalidate_patient(patient_id).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Dropped cached vitals for patient"),
            Err(e) => warn!(error = %e, "Failed to drop cached vitals for patient"),
        }
    }
}
