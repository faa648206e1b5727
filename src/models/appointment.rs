// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Appointment model.

use super::double_option;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const MAX_NOTES_LEN: usize = 5000;

/// A booked time slot with one of the owner's clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Appointment {
    pub id: i64,
    pub client_id: i64,
    #[serde(skip)]
    pub owner_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppointmentCreate {
    #[validate(range(min = 1))]
    pub client_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Partial update. `notes: null` clears the notes; an absent field is left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AppointmentUpdate {
    #[validate(range(min = 1))]
    pub client_id: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

/// `GET /appointments?date_from=...&date_to=...` (inclusive bounds on `starts_at`).
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_null_from_absent_notes() {
        let absent: AppointmentUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert!(absent.notes.is_none());

        let cleared: AppointmentUpdate = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: AppointmentUpdate = serde_json::from_str(r#"{"notes": "bring forms"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("bring forms".to_string())));
    }

    #[test]
    fn create_rejects_non_positive_client_id() {
        let body: AppointmentCreate = serde_json::from_str(
            r#"{"client_id": 0, "starts_at": "2026-05-01T10:00:00Z", "ends_at": "2026-05-01T11:00:00Z"}"#,
        )
        .unwrap();
        assert!(body.validate().is_err());
    }
}
