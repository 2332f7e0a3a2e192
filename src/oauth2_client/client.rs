// ABOUTME: OAuth2 client for the provider authorization-code grant
// ABOUTME: Builds authorize URLs, exchanges codes, refreshes and revokes tokens with Basic auth
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::config::ProviderConfig;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;
use vitals_core::errors::{VitalsError, VitalsResult};
use vitals_core::models::TokenSet;

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    /// New access token
    pub access_token: String,
    /// New refresh token (some providers omit it on refresh)
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Convert into a complete [`TokenSet`]
    ///
    /// A missing `expires_in` falls back to `default_lifetime_secs`, which is
    /// also the ceiling for a reported lifetime; non-positive lifetimes become
    /// one second. A missing refresh token keeps `previous_refresh`.
    #[must_use]
    pub fn into_token_set(
        self,
        now: DateTime<Utc>,
        default_lifetime_secs: i64,
        previous_refresh: Option<&str>,
    ) -> TokenSet {
        let ceiling = default_lifetime_secs.max(1);
        let lifetime = self.expires_in.unwrap_or(ceiling).clamp(1, ceiling);
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now);
        TokenSet {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_owned))
                .unwrap_or_default(),
            expires_at,
        }
    }
}

/// OAuth 2.0 client for the connected provider
#[derive(Clone)]
pub struct OAuth2Client {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OAuth2Client {
    /// Create a client over `config` using `client` for HTTP
    #[must_use]
    pub const fn new(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Provider configuration
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Build the authorize URL carrying `state`
    ///
    /// # Errors
    ///
    /// Returns `Http` with no status if the configured authorize URL does not parse
    pub fn authorization_url(&self, state: &str) -> VitalsResult<String> {
        let mut url = Url::parse(&self.config.auth_url).map_err(|e| VitalsError::Http {
            status: None,
            body: format!("invalid authorize URL: {e}"),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .append_pair(
                "expires_in",
                &self.config.authorization_expires_in.to_string(),
            );

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    ///
    /// Returns `Http` for transport failures and non-2xx responses, and
    /// `MalformedResponse` when the body is not a token response
    #[instrument(skip(self, code), fields(provider = "fitbit", grant = "authorization_code"))]
    pub async fn exchange_code(&self, code: &str) -> VitalsResult<TokenGrant> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Obtain a new access token from a refresh token
    ///
    /// # Errors
    ///
    /// Returns `Http` for transport failures and non-2xx responses, and
    /// `MalformedResponse` when the body is not a token response
    #[instrument(skip(self, refresh_token), fields(provider = "fitbit", grant = "refresh_token"))]
    pub async fn refresh_token(&self, refresh_token: &str) -> VitalsResult<TokenGrant> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params).await
    }

    /// Revoke an access token
    ///
    /// # Errors
    ///
    /// Returns `Http` for transport failures and non-2xx responses
    #[instrument(skip(self, token), fields(provider = "fitbit"))]
    pub async fn revoke_token(&self, token: &str) -> VitalsResult<()> {
        let response = self
            .client
            .post(&self.config.revoke_url)
            .header("Authorization", self.basic_auth())
            .form(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(VitalsError::Http {
            status: Some(status.as_u16()),
            body,
        })
    }

    // Token endpoint requires Basic auth with the client credentials
    fn basic_auth(&self) -> String {
        let credentials = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));
        format!("Basic {credentials}")
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> VitalsResult<TokenGrant> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header("Authorization", self.basic_auth())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        debug!("Token endpoint responded with status {status}");
        let body = response.text().await?;

        if !status.is_success() {
            return Err(VitalsError::Http {
                status: Some(status.as_u16()),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| VitalsError::MalformedResponse {
            details: format!("token response: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuth2Client {
        OAuth2Client::new(
            ProviderConfig {
                client_id: "client-123".to_owned(),
                client_secret: "secret".to_owned(),
                redirect_uri: "https://clinic.example.com/callback".to_owned(),
                ..ProviderConfig::default()
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_authorization_url_contains_grant_parameters() {
        let url = Url::parse(&client().authorization_url("state-abc").unwrap()).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["state"], "state-abc");
        assert_eq!(pairs["redirect_uri"], "https://clinic.example.com/callback");
        assert_eq!(pairs["expires_in"], "604800");
        assert!(pairs["scope"].contains("heartrate"));
    }

    #[test]
    fn test_basic_auth_encodes_client_credentials() {
        assert_eq!(client().basic_auth(), "Basic Y2xpZW50LTEyMzpzZWNyZXQ=");
    }

    #[test]
    fn test_grant_defaults_lifetime_and_keeps_refresh_token() {
        let now = Utc::now();
        let grant = TokenGrant {
            access_token: "new".to_owned(),
            refresh_token: None,
            expires_in: None,
        };
        let tokens = grant.into_token_set(now, 28_800, Some("old-refresh"));
        assert_eq!(tokens.refresh_token, "old-refresh");
        assert_eq!(tokens.expires_at, now + Duration::seconds(28_800));
    }

    fn grant_expiring_in(expires_in: i64) -> TokenGrant {
        TokenGrant {
            access_token: "new".to_owned(),
            refresh_token: Some("new-refresh".to_owned()),
            expires_in: Some(expires_in),
        }
    }

    #[test]
    fn test_grant_lifetime_is_capped_at_default() {
        let now = Utc::now();
        let tokens = grant_expiring_in(100_000_000_000_000_000).into_token_set(now, 28_800, None);
        assert_eq!(tokens.expires_at, now + Duration::seconds(28_800));

        let tokens = grant_expiring_in(i64::MAX).into_token_set(now, 28_800, None);
        assert_eq!(tokens.expires_at, now + Duration::seconds(28_800));
    }

    #[test]
    fn test_grant_non_positive_lifetime_expires_immediately() {
        let now = Utc::now();
        let tokens = grant_expiring_in(-5).into_token_set(now, 28_800, None);
        assert_eq!(tokens.expires_at, now + Duration::seconds(1));

        let tokens = grant_expiring_in(i64::MIN).into_token_set(now, 28_800, None);
        assert_eq!(tokens.expires_at, now + Duration::seconds(1));
        assert_eq!(tokens.refresh_token, "new-refresh");
    }

    #[test]
    fn test_grant_within_ceiling_is_kept() {
        let now = Utc::now();
        let tokens = grant_expiring_in(3_600).into_token_set(now, 28_800, None);
        assert_eq!(tokens.expires_at, now + Duration::seconds(3_600));
    }

    #[test]
    fn test_unrepresentable_default_lifetime_does_not_panic() {
        let now = Utc::now();
        let tokens = grant_expiring_in(i64::MAX).into_token_set(now, i64::MAX, None);
        assert_eq!(tokens.expires_at, now);
    }
}
