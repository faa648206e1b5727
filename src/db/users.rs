// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User persistence.

use super::{timestamp_column, Database};
use crate::error::AppError;
use crate::models::User;
use crate::time_utils::{now_utc, to_millis};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const USER_COLUMNS: &str = "id, email, hashed_password, is_active, created_at, updated_at";

fn parse_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        hashed_password: row.try_get("hashed_password")?,
        is_active: row.try_get("is_active")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

impl Database {
    // ─── User Operations ─────────────────────────────────────

    /// Insert a new active user. A duplicate email surfaces as `AppError::Conflict`.
    pub async fn create_user(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        let now = now_utc();
        let result = sqlx::query(
            "INSERT INTO users (email, hashed_password, is_active, created_at, updated_at) \
             VALUES (?, ?, 1, ?, ?)",
        )
        .bind(email)
        .bind(hashed_password)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(parse_user).transpose()?)
    }

    /// Look up by email. Callers pass the normalized (lower-case) address.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(parse_user).transpose()?)
    }

    /// Activate or deactivate an account. Returns false if the user does not exist.
    pub async fn set_user_active(&self, user_id: i64, is_active: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(to_millis(now_utc()))
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        db.create_user("ann@example.com", "hash").await.unwrap();

        let err = db
            .create_user("ann@example.com", "other")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deactivate_user() {
        let db = Database::in_memory().await.unwrap();
        let user = db.create_user("bo@example.com", "hash").await.unwrap();

        assert!(db.set_user_active(user.id, false).await.unwrap());
        let stored = db.get_user(user.id).await.unwrap().unwrap();
        assert!(!stored.is_active);

        assert!(!db.set_user_active(9999, false).await.unwrap());
    }
}
