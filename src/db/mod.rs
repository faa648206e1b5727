// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite via SQLx).
//!
//! `Database` wraps a connection pool. Each table gets its own module with an
//! `impl Database` block; every query borrows a pooled connection only for
//! its own duration.

pub mod appointments;
pub mod clients;
pub mod integrations;
pub mod users;

use crate::error::AppError;
use crate::time_utils::from_millis;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;

/// SQLite database handle.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database named by `url` and run pending migrations.
    ///
    /// `sqlite::memory:` URLs get a single-connection in-memory database.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        if url.contains(":memory:") {
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to SQLite: {}", e)))?;

        tracing::info!(url = url, "Connected to SQLite");
        Self::migrate(pool).await
    }

    /// Fresh in-memory database (tests and local experiments).
    ///
    /// An in-memory SQLite database lives only as long as its connection, so
    /// the pool is pinned to exactly one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory SQLite: {}", e)))?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Read an epoch-millis column. Values chrono cannot represent are a decode error.
pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let millis: i64 = row.try_get(column)?;
    decode_millis(column, millis)
}

pub(crate) fn optional_timestamp_column(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    row.try_get::<Option<i64>, _>(column)?
        .map(|millis| decode_millis(column, millis))
        .transpose()
}

fn decode_millis(column: &str, millis: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    from_millis(millis).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("timestamp {millis} out of range").into(),
    })
}

/// Case folding shared by the stored search columns and the search needle.
pub(crate) fn fold_search_text(text: &str) -> String {
    text.to_lowercase()
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn search_folding_handles_non_ascii() {
        assert_eq!(fold_search_text("ÁNGEL Núñez"), "ángel núñez");
        assert_eq!(fold_search_text("ÉMILE"), fold_search_text("émile"));
    }

    #[tokio::test]
    async fn corrupt_timestamp_is_a_decode_error() {
        let db = Database::in_memory().await.unwrap();
        let row = sqlx::query("SELECT ? AS created_at")
            .bind(i64::MAX)
            .fetch_one(db.pool())
            .await
            .unwrap();

        let err = timestamp_column(&row, "created_at").unwrap_err();
        assert!(matches!(err, sqlx::Error::ColumnDecode { .. }));
    }

    #[tokio::test]
    async fn in_memory_database_runs_migrations() {
        let db = Database::in_memory().await.unwrap();
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        let names: Vec<&str> = rows.iter().map(|(n,)| n.as_str()).collect();
        for table in ["users", "clients", "appointments", "google_integrations"] {
            assert!(names.contains(&table), "missing table {table}");
        }
    }
}
