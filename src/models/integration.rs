// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user Google OAuth integration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Provider tag stored before any OAuth flow has started.
pub const PROVIDER_STUB: &str = "stub";
/// Provider tag once a Google flow has started.
pub const PROVIDER_GOOGLE: &str = "google";

/// Connection state of a user's Google integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Disconnected,
    Pending,
    Connected,
    Error,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Disconnected => "disconnected",
            IntegrationStatus::Pending => "pending",
            IntegrationStatus::Connected => "connected",
            IntegrationStatus::Error => "error",
        }
    }

    /// Unknown values read back from storage are treated as disconnected.
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => IntegrationStatus::Pending,
            "connected" => IntegrationStatus::Connected,
            "error" => IntegrationStatus::Error,
            _ => IntegrationStatus::Disconnected,
        }
    }
}

/// Stored integration row. Token fields hold ciphertext only.
#[derive(Debug, Clone)]
pub struct GoogleIntegration {
    pub id: i64,
    pub user_id: i64,
    pub account_email: Option<String>,
    pub access_token_encrypted: Option<String>,
    pub refresh_token_encrypted: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub status: IntegrationStatus,
    pub state_token: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GoogleIntegration {
    pub fn is_connected(&self) -> bool {
        self.status == IntegrationStatus::Connected
    }

    /// Clear every credential and sync field, returning to `disconnected`.
    pub fn reset(&mut self) {
        self.account_email = None;
        self.access_token_encrypted = None;
        self.refresh_token_encrypted = None;
        self.token_expiry = None;
        self.last_synced_at = None;
        self.status = IntegrationStatus::Disconnected;
        self.state_token = None;
        self.provider = PROVIDER_STUB.to_string();
    }
}

/// `GET /integrations/google/status`
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IntegrationStatusResponse {
    pub connected: bool,
    pub status: IntegrationStatus,
    pub account_email: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub provider: String,
}

impl From<&GoogleIntegration> for IntegrationStatusResponse {
    fn from(integration: &GoogleIntegration) -> Self {
        Self {
            connected: integration.is_connected(),
            status: integration.status,
            account_email: integration.account_email.clone(),
            last_synced_at: integration.last_synced_at,
            provider: integration.provider.clone(),
        }
    }
}

/// `POST /integrations/google/start`
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthorizationStart {
    pub authorization_url: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in [
            IntegrationStatus::Disconnected,
            IntegrationStatus::Pending,
            IntegrationStatus::Connected,
            IntegrationStatus::Error,
        ] {
            assert_eq!(IntegrationStatus::parse(status.as_str()), status);
        }
        assert_eq!(
            IntegrationStatus::parse("bogus"),
            IntegrationStatus::Disconnected
        );
    }
}
