// ABOUTME: Patient platform link (OAuth grant) and single-use connection link models
// ABOUTME: Token fields are written as one TokenSet so partial updates are never observable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::Provider;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Access token, refresh token and expiry, always stored together
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for data endpoints
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Whether the access token is still valid beyond `buffer` from `now`
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at > now + buffer
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A patient's authorization grant for one provider
///
/// Owned by the patient record; the engine only reads and writes the
/// provider and token fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLink {
    /// Patient the grant belongs to
    pub patient_id: Uuid,
    /// Connected provider, `None` once disconnected
    pub provider: Option<Provider>,
    /// Token data, `None` until the OAuth callback succeeds
    pub tokens: Option<TokenSet>,
    /// When the current grant was completed
    pub connected_at: Option<DateTime<Utc>>,
}

impl PlatformLink {
    /// Link record with no provider and no tokens
    #[must_use]
    pub const fn new(patient_id: Uuid) -> Self {
        Self {
            patient_id,
            provider: None,
            tokens: None,
            connected_at: None,
        }
    }

    /// Tokens for `provider`, or `None` when not connected to it
    #[must_use]
    pub fn tokens_for(&self, provider: Provider) -> Option<&TokenSet> {
        if self.provider == Some(provider) {
            self.tokens.as_ref()
        } else {
            None
        }
    }

    /// Record a completed grant
    pub fn connect(&mut self, provider: Provider, tokens: TokenSet, now: DateTime<Utc>) {
        self.provider = Some(provider);
        self.tokens = Some(tokens);
        self.connected_at = Some(now);
    }

    /// Clear provider and all token fields
    pub fn clear(&mut self) {
        self.provider = None;
        self.tokens = None;
        self.connected_at = None;
    }
}

/// Short-lived, single-use invitation to authorize a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionLink {
    /// Link identifier, also used as the OAuth `state`
    pub id: Uuid,
    /// Patient being connected
    pub patient_id: Uuid,
    /// Clinician who issued the link
    pub clinician_id: Uuid,
    /// Provider to authorize
    pub provider: Provider,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
    /// Set once consumed or superseded
    pub used: bool,
}

impl ConnectionLink {
    /// Issue a new link valid for `ttl`
    #[must_use]
    pub fn new(
        patient_id: Uuid,
        clinician_id: Uuid,
        provider: Provider,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            clinician_id,
            provider,
            created_at: now,
            expires_at: now + ttl,
            used: false,
        }
    }

    /// Whether the link is past its expiry
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Why the link can no longer be used, if it cannot
    #[must_use]
    pub fn rejection_reason(&self, now: DateTime<Utc>) -> Option<&'static str> {
        if self.used {
            Some("link already used")
        } else if self.is_expired(now) {
            Some("link expired")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(expires_at: DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_at,
        }
    }

    #[test]
    fn test_tokens_for_requires_matching_provider() {
        let now = Utc::now();
        let mut link = PlatformLink::new(Uuid::new_v4());
        assert!(link.tokens_for(Provider::Fitbit).is_none());

        link.connect(Provider::Fitbit, tokens(now + Duration::hours(1)), now);
        assert!(link.tokens_for(Provider::Fitbit).is_some());

        link.clear();
        assert!(link.provider.is_none());
        assert!(link.tokens.is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", tokens(Utc::now()));
        assert!(!rendered.contains("access\""));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_connection_link_rejection() {
        let now = Utc::now();
        let mut link = ConnectionLink::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Provider::Fitbit,
            now,
            Duration::hours(24),
        );
        assert_eq!(link.rejection_reason(now), None);
        assert_eq!(
            link.rejection_reason(now + Duration::hours(25)),
            Some("link expired")
        );
        link.used = true;
        assert_eq!(link.rejection_reason(now), Some("link already used"));
    }
}
