// ABOUTME: Persistence seam between the engine and the patient record
// ABOUTME: Platform links (token fields) and connection links behind an async repository trait
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// In-memory repository implementation
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use vitals_core::errors::VitalsResult;
use vitals_core::models::{ConnectionLink, PlatformLink, Provider, TokenSet};

/// Storage for platform links and connection links
///
/// The engine only touches the provider and token fields of a patient record.
/// Implementations must make [`update_tokens`](Self::update_tokens) and
/// [`claim_connection_link`](Self::claim_connection_link) atomic.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Platform link for a patient
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn get_platform_link(&self, patient_id: Uuid) -> VitalsResult<Option<PlatformLink>>;

    /// Create or replace a platform link
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn save_platform_link(&self, link: &PlatformLink) -> VitalsResult<()>;

    /// Replace all three token fields together
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` when the patient is not linked to `provider`,
    /// `Storage` on backend failure
    async fn update_tokens(
        &self,
        patient_id: Uuid,
        provider: Provider,
        tokens: TokenSet,
    ) -> VitalsResult<()>;

    /// Clear provider and token fields
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn clear_platform_link(&self, patient_id: Uuid) -> VitalsResult<()>;

    /// Store a new connection link
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn insert_connection_link(&self, link: &ConnectionLink) -> VitalsResult<()>;

    /// Connection link by id
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn get_connection_link(&self, link_id: Uuid) -> VitalsResult<Option<ConnectionLink>>;

    /// Mark every unused link for `(patient_id, provider)` as used, returning how many changed
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure
    async fn supersede_connection_links(
        &self,
        patient_id: Uuid,
        provider: Provider,
    ) -> VitalsResult<usize>;

    /// Atomically validate and mark a link used, returning it
    ///
    /// # Errors
    ///
    /// Returns `InvalidConnectionLink` when the link is unknown, used or expired
    async fn claim_connection_link(
        &self,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> VitalsResult<ConnectionLink>;
}
