// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client persistence. Every query is filtered by `owner_id`.

use super::{fold_search_text, like_pattern, timestamp_column, Database};
use crate::error::AppError;
use crate::models::Client;
use crate::time_utils::{now_utc, to_millis};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

/// Upper bound on rows returned by a client listing.
pub const CLIENT_LIST_LIMIT: i64 = 100;

const CLIENT_COLUMNS: &str = "id, name, phone, owner_id, created_at, updated_at";

fn parse_client(row: &SqliteRow) -> Result<Client, sqlx::Error> {
    Ok(Client {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        owner_id: row.try_get("owner_id")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

impl Database {
    // ─── Client Operations ───────────────────────────────────

    /// List the owner's clients ordered by name, optionally filtered by a
    /// case-insensitive substring of name or phone.
    pub async fn list_clients(
        &self,
        owner_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Client>, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE owner_id = "
        ));
        query.push_bind(owner_id);

        if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = like_pattern(&fold_search_text(needle));
            query
                .push(" AND (name_search LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR phone_search LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query
            .push(" ORDER BY name, id LIMIT ")
            .push_bind(CLIENT_LIST_LIMIT);

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(parse_client).collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    pub async fn create_client(
        &self,
        owner_id: i64,
        name: &str,
        phone: &str,
    ) -> Result<Client, AppError> {
        let now = now_utc();
        let result = sqlx::query(
            "INSERT INTO clients \
             (name, phone, name_search, phone_search, owner_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(phone)
        .bind(fold_search_text(name))
        .bind(fold_search_text(phone))
        .bind(owner_id)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        Ok(Client {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            phone: phone.to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch one client. Rows owned by someone else are indistinguishable from missing rows.
    pub async fn get_client(&self, owner_id: i64, client_id: i64) -> Result<Option<Client>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ? AND owner_id = ?"
        ))
        .bind(client_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parse_client).transpose()?)
    }

    /// Persist name/phone of an already-loaded client and bump `updated_at`.
    pub async fn update_client(&self, client: &mut Client) -> Result<(), AppError> {
        let now = now_utc();
        let result = sqlx::query(
            "UPDATE clients \
             SET name = ?, phone = ?, name_search = ?, phone_search = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ?",
        )
        .bind(&client.name)
        .bind(&client.phone)
        .bind(fold_search_text(&client.name))
        .bind(fold_search_text(&client.phone))
        .bind(to_millis(now))
        .bind(client.id)
        .bind(client.owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", client.id)));
        }
        client.updated_at = now;
        Ok(())
    }
}
