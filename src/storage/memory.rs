// ABOUTME: In-memory LinkRepository backed by concurrent maps
// ABOUTME: Used by tests, the CLI and embedders without their own patient store
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::LinkRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;
use vitals_core::errors::{VitalsError, VitalsResult};
use vitals_core::models::{ConnectionLink, PlatformLink, Provider, TokenSet};

/// Concurrent in-memory link storage
#[derive(Debug, Default)]
pub struct InMemoryLinkRepository {
    platform_links: DashMap<Uuid, PlatformLink>,
    connection_links: DashMap<Uuid, ConnectionLink>,
}

impl InMemoryLinkRepository {
    /// Empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn get_platform_link(&self, patient_id: Uuid) -> VitalsResult<Option<PlatformLink>> {
        Ok(self
            .platform_links
            .get(&patient_id)
            .map(|entry| entry.value().clone()))
    }

    async fn save_platform_link(&self, link: &PlatformLink) -> VitalsResult<()> {
        self.platform_links.insert(link.patient_id, link.clone());
        Ok(())
    }

    async fn update_tokens(
        &self,
        patient_id: Uuid,
        provider: Provider,
        tokens: TokenSet,
    ) -> VitalsResult<()> {
        let mut entry = self
            .platform_links
            .get_mut(&patient_id)
            .ok_or(VitalsError::NotConnected {
                patient_id,
                provider,
            })?;

        if entry.provider != Some(provider) {
            return Err(VitalsError::NotConnected {
                patient_id,
                provider,
            });
        }
        entry.tokens = Some(tokens);
        Ok(())
    }

    async fn clear_platform_link(&self, patient_id: Uuid) -> VitalsResult<()> {
        if let Some(mut entry) = self.platform_links.get_mut(&patient_id) {
            entry.clear();
        }
        Ok(())
    }

    async fn insert_connection_link(&self, link: &ConnectionLink) -> VitalsResult<()> {
        self.connection_links.insert(link.id, link.clone());
        Ok(())
    }

    async fn get_connection_link(&self, link_id: Uuid) -> VitalsResult<Option<ConnectionLink>> {
        Ok(self
            .connection_links
            .get(&link_id)
            .map(|entry| entry.value().clone()))
    }

    async fn supersede_connection_links(
        &self,
        patient_id: Uuid,
        provider: Provider,
    ) -> VitalsResult<usize> {
        let mut superseded = 0;
        for mut entry in self.connection_links.iter_mut() {
            let link = entry.value_mut();
            if link.patient_id == patient_id && link.provider == provider && !link.used {
                link.used = true;
                superseded += 1;
            }
        }
        Ok(superseded)
    }

    async fn claim_connection_link(
        &self,
        link_id: Uuid,
        now: DateTime<Utc>,
    ) -> VitalsResult<ConnectionLink> {
        let mut entry =
            self.connection_links
                .get_mut(&link_id)
                .ok_or_else(|| VitalsError::InvalidConnectionLink {
                    link_id,
                    reason: "unknown link".to_owned(),
                })?;

        if let Some(reason) = entry.rejection_reason(now) {
            return Err(VitalsError::InvalidConnectionLink {
                link_id,
                reason: reason.to_owned(),
            });
        }

        entry.used = true;
        Ok(entry.value().clone())
    }
}
