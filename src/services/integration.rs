// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google integration lifecycle: OAuth start/callback, token refresh, and
//! calendar reads on the user's behalf.
//!
//! State machine per user:
//!
//! ```text
//! disconnected ──initiate──▶ pending ──complete(ok)──▶ connected
//!                               │                         │
//!                               └──complete(fail)──▶ error ◀──refresh fails
//! any ──disconnect──▶ disconnected
//! ```

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::integration::{
    AuthorizationStart, GoogleIntegration, IntegrationStatus, PROVIDER_GOOGLE,
};
use crate::models::CalendarEvent;
use crate::services::cipher::TokenCipher;
use crate::services::google::{normalize_events, GoogleClient, GoogleTokenResponse};
use crate::services::google_oidc::GoogleOidcVerifier;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Refresh access tokens this long before Google's stated expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Upper bound applied to a provider-reported `expires_in`.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400 * 365;

/// Outcome of an OAuth callback whose `state` matched a pending flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OAuthCompletion {
    pub user_id: i64,
    pub connected: bool,
}

#[derive(Clone)]
pub struct GoogleIntegrationService {
    db: Database,
    client: GoogleClient,
    cipher: TokenCipher,
    /// Verifies `id_token`s from the token endpoint (absent when OAuth is unconfigured).
    id_verifier: Option<Arc<GoogleOidcVerifier>>,
    calendar_id: String,
}

impl GoogleIntegrationService {
    pub fn new(
        db: Database,
        client: GoogleClient,
        cipher: TokenCipher,
        id_verifier: Option<Arc<GoogleOidcVerifier>>,
        calendar_id: String,
    ) -> Self {
        Self {
            db,
            client,
            cipher,
            id_verifier,
            calendar_id,
        }
    }

    /// Current integration record, created as `disconnected` on first access.
    pub async fn status(&self, user_id: i64) -> Result<GoogleIntegration> {
        self.db.get_or_create_integration(user_id).await
    }

    /// Start an OAuth flow: issue a fresh state token and mark the record pending.
    pub async fn initiate(&self, user_id: i64) -> Result<AuthorizationStart> {
        if !self.client.is_configured() {
            return Err(AppError::ServiceUnavailable(
                "Google OAuth is not configured".to_string(),
            ));
        }

        let state = self.cipher.random_token()?;
        let authorization_url = self.client.authorization_url(&state)?;

        let mut integration = self.db.get_or_create_integration(user_id).await?;
        integration.status = IntegrationStatus::Pending;
        integration.state_token = Some(state.clone());
        integration.provider = PROVIDER_GOOGLE.to_string();
        self.db.save_integration(&mut integration).await?;

        tracing::info!(user_id, "Google OAuth flow started");
        Ok(AuthorizationStart {
            authorization_url,
            state,
        })
    }

    /// Finish an OAuth flow from the provider callback.
    ///
    /// Returns `None` when `state` matches no pending flow (nothing is touched).
    /// Otherwise the state token is consumed and the record ends up either
    /// `connected` or `error`.
    pub async fn complete(&self, state: &str, code: &str) -> Result<Option<OAuthCompletion>> {
        if state.is_empty() {
            return Ok(None);
        }

        let Some(mut integration) = self.db.find_integration_by_state(state).await? else {
            tracing::warn!("OAuth callback with unknown state");
            return Ok(None);
        };
        let user_id = integration.user_id;

        let tokens = match self.client.exchange_code(code).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Google code exchange failed");
                integration.status = IntegrationStatus::Error;
                integration.state_token = None;
                self.db.save_integration(&mut integration).await?;
                return Ok(Some(OAuthCompletion {
                    user_id,
                    connected: false,
                }));
            }
        };

        self.store_tokens(&mut integration, tokens).await?;
        integration.status = IntegrationStatus::Connected;
        integration.state_token = None;
        integration.last_synced_at = None;
        self.db.save_integration(&mut integration).await?;

        tracing::info!(user_id, "Google integration connected");
        Ok(Some(OAuthCompletion {
            user_id,
            connected: true,
        }))
    }

    /// Drop all credentials and return to `disconnected`; the row is kept.
    pub async fn disconnect(&self, user_id: i64) -> Result<GoogleIntegration> {
        let mut integration = self.db.get_or_create_integration(user_id).await?;
        integration.reset();
        self.db.save_integration(&mut integration).await?;

        tracing::info!(user_id, "Google integration disconnected");
        Ok(integration)
    }

    /// Fetch upcoming events from the user's calendar.
    ///
    /// `None` means "no data": not connected, no usable token, refresh failed,
    /// or Google kept failing. A 401 from Google triggers exactly one refresh
    /// and retry.
    pub async fn fetch_events(
        &self,
        user_id: i64,
        max_results: u32,
    ) -> Result<Option<Vec<CalendarEvent>>> {
        let Some(mut integration) = self.db.get_integration(user_id).await? else {
            return Ok(None);
        };
        if !integration.is_connected() {
            return Ok(None);
        }

        let Some(mut access_token) = self
            .cipher
            .decrypt_opt(integration.access_token_encrypted.as_deref(), user_id)
        else {
            tracing::warn!(user_id, "Stored Google access token could not be decrypted");
            return Ok(None);
        };

        let now = Utc::now();
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if integration
            .token_expiry
            .is_some_and(|expiry| now + margin >= expiry)
        {
            match self.refresh(&mut integration).await? {
                Some(token) => access_token = token,
                None => return Ok(None),
            }
        }

        let page = match self
            .client
            .list_events(&access_token, &self.calendar_id, max_results, now)
            .await
        {
            Ok(page) => page,
            Err(AppError::GoogleTokenRejected) => {
                tracing::info!(user_id, "Google rejected access token, refreshing once");
                let Some(token) = self.refresh(&mut integration).await? else {
                    return Ok(None);
                };
                match self
                    .client
                    .list_events(&token, &self.calendar_id, max_results, Utc::now())
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::warn!(user_id, error = %e, "Calendar fetch failed after refresh");
                        return Ok(None);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Calendar fetch failed");
                return Ok(None);
            }
        };

        let events = normalize_events(page.items);
        integration.last_synced_at = Some(Utc::now());
        self.db.save_integration(&mut integration).await?;

        tracing::debug!(user_id, count = events.len(), "Fetched Google Calendar events");
        Ok(Some(events))
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// On any failure the record is marked `error` and `None` is returned.
    async fn refresh(&self, integration: &mut GoogleIntegration) -> Result<Option<String>> {
        let user_id = integration.user_id;

        let Some(refresh_token) = self
            .cipher
            .decrypt_opt(integration.refresh_token_encrypted.as_deref(), user_id)
        else {
            tracing::warn!(user_id, "No usable Google refresh token");
            integration.status = IntegrationStatus::Error;
            self.db.save_integration(integration).await?;
            return Ok(None);
        };

        match self.client.refresh_token(&refresh_token).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.clone();
                self.store_tokens(integration, tokens).await?;
                self.db.save_integration(integration).await?;
                tracing::info!(user_id, "Google access token refreshed");
                Ok(Some(access_token))
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Google token refresh failed");
                integration.status = IntegrationStatus::Error;
                self.db.save_integration(integration).await?;
                Ok(None)
            }
        }
    }

    /// Encrypt and record a token response. A missing refresh token keeps the old one.
    async fn store_tokens(
        &self,
        integration: &mut GoogleIntegration,
        tokens: GoogleTokenResponse,
    ) -> Result<()> {
        let user_id = integration.user_id;

        integration.access_token_encrypted =
            Some(self.cipher.encrypt(&tokens.access_token, user_id)?);
        if let Some(refresh_token) = tokens.refresh_token.as_deref() {
            integration.refresh_token_encrypted = Some(self.cipher.encrypt(refresh_token, user_id)?);
        }
        integration.token_expiry = Some(token_expiry(Utc::now(), tokens.expires_in));
        integration.provider = PROVIDER_GOOGLE.to_string();

        if let Some(id_token) = tokens.id_token.as_deref() {
            if let Some(email) = self.account_email(user_id, id_token).await {
                integration.account_email = Some(email);
            }
        }

        Ok(())
    }

    /// Email from a verified ID token; verification problems are logged and ignored.
    async fn account_email(&self, user_id: i64, id_token: &str) -> Option<String> {
        let verifier = self.id_verifier.as_ref()?;
        match verifier.verify_id_token(id_token).await {
            Ok(identity) => identity.email,
            Err(e) => {
                tracing::warn!(user_id, error = ?e, "Ignoring unverifiable Google ID token");
                None
            }
        }
    }
}

/// Absolute expiry for a token issued at `now`, with `expires_in` clamped to a sane lifetime.
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    now + Duration::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS))
}
