// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment persistence. Every query is filtered by `owner_id`.

use super::{timestamp_column, Database};
use crate::error::AppError;
use crate::models::Appointment;
use crate::time_utils::{now_utc, to_millis};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

const APPOINTMENT_COLUMNS: &str =
    "id, client_id, owner_id, starts_at, ends_at, notes, created_at, updated_at";

fn parse_appointment(row: &SqliteRow) -> Result<Appointment, sqlx::Error> {
    Ok(Appointment {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        owner_id: row.try_get("owner_id")?,
        starts_at: timestamp_column(row, "starts_at")?,
        ends_at: timestamp_column(row, "ends_at")?,
        notes: row.try_get("notes")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Fields of a new appointment (the owner is passed separately).
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Database {
    // ─── Appointment Operations ──────────────────────────────

    /// List the owner's appointments ordered by start time, with inclusive
    /// optional bounds on `starts_at`.
    pub async fn list_appointments(
        &self,
        owner_id: i64,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE owner_id = "
        ));
        query.push_bind(owner_id);

        if let Some(from) = date_from {
            query.push(" AND starts_at >= ").push_bind(to_millis(from));
        }
        if let Some(to) = date_to {
            query.push(" AND starts_at <= ").push_bind(to_millis(to));
        }
        query.push(" ORDER BY starts_at, id");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(parse_appointment)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    pub async fn create_appointment(
        &self,
        owner_id: i64,
        new: NewAppointment,
    ) -> Result<Appointment, AppError> {
        let now = now_utc();
        let result = sqlx::query(
            "INSERT INTO appointments \
             (client_id, owner_id, starts_at, ends_at, notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.client_id)
        .bind(owner_id)
        .bind(to_millis(new.starts_at))
        .bind(to_millis(new.ends_at))
        .bind(&new.notes)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        Ok(Appointment {
            id: result.last_insert_rowid(),
            client_id: new.client_id,
            owner_id,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_appointment(
        &self,
        owner_id: i64,
        appointment_id: i64,
    ) -> Result<Option<Appointment>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ? AND owner_id = ?"
        ))
        .bind(appointment_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parse_appointment).transpose()?)
    }

    /// Write back every mutable field of an already-loaded appointment.
    pub async fn update_appointment(&self, appointment: &mut Appointment) -> Result<(), AppError> {
        let now = now_utc();
        let result = sqlx::query(
            "UPDATE appointments \
             SET client_id = ?, starts_at = ?, ends_at = ?, notes = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ?",
        )
        .bind(appointment.client_id)
        .bind(to_millis(appointment.starts_at))
        .bind(to_millis(appointment.ends_at))
        .bind(&appointment.notes)
        .bind(to_millis(now))
        .bind(appointment.id)
        .bind(appointment.owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Appointment {} not found",
                appointment.id
            )));
        }
        appointment.updated_at = now;
        Ok(())
    }

    /// Delete one appointment. Returns false when nothing matched.
    pub async fn delete_appointment(
        &self,
        owner_id: i64,
        appointment_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ? AND owner_id = ?")
            .bind(appointment_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
