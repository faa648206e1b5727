// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google integration persistence (one row per user).

use super::{optional_timestamp_column, timestamp_column, Database};
use crate::error::AppError;
use crate::models::integration::{GoogleIntegration, IntegrationStatus};
use crate::time_utils::{now_utc, to_millis};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const INTEGRATION_COLUMNS: &str = "id, user_id, account_email, access_token_encrypted, \
     refresh_token_encrypted, token_expiry, last_synced_at, status, state_token, provider, \
     created_at, updated_at";

fn parse_integration(row: &SqliteRow) -> Result<GoogleIntegration, sqlx::Error> {
    Ok(GoogleIntegration {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_email: row.try_get("account_email")?,
        access_token_encrypted: row.try_get("access_token_encrypted")?,
        refresh_token_encrypted: row.try_get("refresh_token_encrypted")?,
        token_expiry: optional_timestamp_column(row, "token_expiry")?,
        last_synced_at: optional_timestamp_column(row, "last_synced_at")?,
        status: IntegrationStatus::parse(&row.try_get::<String, _>("status")?),
        state_token: row.try_get("state_token")?,
        provider: row.try_get("provider")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

impl Database {
    // ─── Integration Operations ──────────────────────────────

    pub async fn get_integration(&self, user_id: i64) -> Result<Option<GoogleIntegration>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM google_integrations WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parse_integration).transpose()?)
    }

    /// Return the user's integration row, creating a `disconnected` one if absent.
    ///
    /// Safe to race: the insert is ignored if another request created the row first.
    pub async fn get_or_create_integration(
        &self,
        user_id: i64,
    ) -> Result<GoogleIntegration, AppError> {
        let now = now_utc();
        sqlx::query(
            "INSERT OR IGNORE INTO google_integrations (user_id, created_at, updated_at) \
             VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        self.get_integration(user_id).await?.ok_or_else(|| {
            AppError::Database(format!("Integration row for user {user_id} vanished"))
        })
    }

    /// Find the integration whose pending OAuth flow issued `state`.
    pub async fn find_integration_by_state(
        &self,
        state: &str,
    ) -> Result<Option<GoogleIntegration>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {INTEGRATION_COLUMNS} FROM google_integrations WHERE state_token = ?"
        ))
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parse_integration).transpose()?)
    }

    /// Write back every mutable field and bump `updated_at`.
    pub async fn save_integration(&self, integration: &mut GoogleIntegration) -> Result<(), AppError> {
        let now = now_utc();
        sqlx::query(
            "UPDATE google_integrations SET \
             account_email = ?, access_token_encrypted = ?, refresh_token_encrypted = ?, \
             token_expiry = ?, last_synced_at = ?, status = ?, state_token = ?, provider = ?, \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&integration.account_email)
        .bind(&integration.access_token_encrypted)
        .bind(&integration.refresh_token_encrypted)
        .bind(integration.token_expiry.map(to_millis))
        .bind(integration.last_synced_at.map(to_millis))
        .bind(integration.status.as_str())
        .bind(&integration.state_token)
        .bind(&integration.provider)
        .bind(to_millis(now))
        .bind(integration.id)
        .execute(&self.pool)
        .await?;

        integration.updated_at = now;
        Ok(())
    }
}
