// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Owner-scoped client and appointment operations.
//!
//! Every method takes the caller's user ID and only ever touches rows owned
//! by that user. A resource owned by someone else is reported as not found.

use crate::db::appointments::NewAppointment;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::appointment::MAX_NOTES_LEN;
use crate::models::{
    Appointment, AppointmentCreate, AppointmentListQuery, AppointmentUpdate, Client, ClientCreate,
    ClientUpdate,
};
use crate::time_utils::truncate_to_millis;
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct SchedulingService {
    db: Database,
}

impl SchedulingService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ─── Clients ─────────────────────────────────────────────

    pub async fn list_clients(&self, owner_id: i64, search: Option<&str>) -> Result<Vec<Client>> {
        self.db.list_clients(owner_id, search).await
    }

    pub async fn create_client(&self, owner_id: i64, input: ClientCreate) -> Result<Client> {
        let client = self
            .db
            .create_client(owner_id, &input.name, &input.phone)
            .await?;
        tracing::info!(user_id = owner_id, client_id = client.id, "Client created");
        Ok(client)
    }

    pub async fn get_client(&self, owner_id: i64, client_id: i64) -> Result<Client> {
        self.db
            .get_client(owner_id, client_id)
            .await?
            .ok_or_else(|| client_not_found(client_id))
    }

    pub async fn update_client(
        &self,
        owner_id: i64,
        client_id: i64,
        input: ClientUpdate,
    ) -> Result<Client> {
        let mut client = self.get_client(owner_id, client_id).await?;

        if let Some(name) = input.name {
            client.name = name;
        }
        if let Some(phone) = input.phone {
            client.phone = phone;
        }

        self.db.update_client(&mut client).await?;
        Ok(client)
    }

    // ─── Appointments ────────────────────────────────────────

    pub async fn list_appointments(
        &self,
        owner_id: i64,
        query: AppointmentListQuery,
    ) -> Result<Vec<Appointment>> {
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if from > to {
                return Err(AppError::BadRequest(
                    "date_from must be before date_to".to_string(),
                ));
            }
        }

        self.db
            .list_appointments(owner_id, query.date_from, query.date_to)
            .await
    }

    /// Book an appointment. The client is checked before the time range, which
    /// is compared at storage (millisecond) precision.
    pub async fn create_appointment(
        &self,
        owner_id: i64,
        input: AppointmentCreate,
    ) -> Result<Appointment> {
        self.ensure_client_owned(owner_id, input.client_id).await?;
        let starts_at = truncate_to_millis(input.starts_at);
        let ends_at = truncate_to_millis(input.ends_at);
        validate_time_range(starts_at, ends_at)?;

        let appointment = self
            .db
            .create_appointment(
                owner_id,
                NewAppointment {
                    client_id: input.client_id,
                    starts_at,
                    ends_at,
                    notes: input.notes,
                },
            )
            .await?;

        tracing::info!(
            user_id = owner_id,
            appointment_id = appointment.id,
            client_id = appointment.client_id,
            "Appointment created"
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, owner_id: i64, appointment_id: i64) -> Result<Appointment> {
        self.db
            .get_appointment(owner_id, appointment_id)
            .await?
            .ok_or_else(|| appointment_not_found(appointment_id))
    }

    /// Apply a partial update, re-validating the resulting client and time range.
    pub async fn update_appointment(
        &self,
        owner_id: i64,
        appointment_id: i64,
        input: AppointmentUpdate,
    ) -> Result<Appointment> {
        let mut appointment = self.get_appointment(owner_id, appointment_id).await?;

        if let Some(Some(notes)) = &input.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(AppError::BadRequest(format!(
                    "notes: must be at most {MAX_NOTES_LEN} characters"
                )));
            }
        }

        let client_id = input.client_id.unwrap_or(appointment.client_id);
        self.ensure_client_owned(owner_id, client_id).await?;

        let starts_at = input.starts_at.map_or(appointment.starts_at, truncate_to_millis);
        let ends_at = input.ends_at.map_or(appointment.ends_at, truncate_to_millis);
        validate_time_range(starts_at, ends_at)?;

        appointment.client_id = client_id;
        appointment.starts_at = starts_at;
        appointment.ends_at = ends_at;
        if let Some(notes) = input.notes {
            appointment.notes = notes;
        }

        self.db.update_appointment(&mut appointment).await?;
        Ok(appointment)
    }

    pub async fn delete_appointment(&self, owner_id: i64, appointment_id: i64) -> Result<()> {
        if !self.db.delete_appointment(owner_id, appointment_id).await? {
            return Err(appointment_not_found(appointment_id));
        }
        tracing::info!(user_id = owner_id, appointment_id, "Appointment deleted");
        Ok(())
    }

    async fn ensure_client_owned(&self, owner_id: i64, client_id: i64) -> Result<()> {
        match self.db.get_client(owner_id, client_id).await? {
            Some(_) => Ok(()),
            None => Err(client_not_found(client_id)),
        }
    }
}

fn validate_time_range(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<()> {
    if ends_at <= starts_at {
        return Err(AppError::BadRequest(
            "ends_at must be after starts_at".to_string(),
        ));
    }
    Ok(())
}

fn client_not_found(client_id: i64) -> AppError {
    AppError::NotFound(format!("Client {client_id} not found"))
}

fn appointment_not_found(appointment_id: i64) -> AppError {
    AppError::NotFound(format!("Appointment {appointment_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        svc: SchedulingService,
        alice: i64,
        bob: i64,
        alice_client: i64,
        bob_client: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let alice = db.create_user("alice@example.com", "h").await.unwrap().id;
        let bob = db.create_user("bob@example.com", "h").await.unwrap().id;
        let alice_client = db.create_client(alice, "Amy", "1").await.unwrap().id;
        let bob_client = db.create_client(bob, "Ben", "2").await.unwrap().id;
        Fixture {
            svc: SchedulingService::new(db),
            alice,
            bob,
            alice_client,
            bob_client,
        }
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, hour, 0, 0).unwrap()
    }

    fn create(client_id: i64, start: u32, end: u32) -> AppointmentCreate {
        AppointmentCreate {
            client_id,
            starts_at: t(start),
            ends_at: t(end),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_foreign_client_before_range() {
        let f = fixture().await;
        // Both the client and the range are bad; the client check wins.
        let err = f
            .svc
            .create_appointment(f.alice, create(f.bob_client, 10, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_or_inverted_range() {
        let f = fixture().await;
        for (start, end) in [(10, 10), (11, 10)] {
            let err = f
                .svc
                .create_appointment(f.alice, create(f.alice_client, start, end))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn sub_millisecond_ranges_are_compared_at_storage_precision() {
        let f = fixture().await;
        let start = t(10) + Duration::microseconds(100);
        let input = AppointmentCreate {
            client_id: f.alice_client,
            starts_at: start,
            ends_at: start + Duration::microseconds(100),
            notes: None,
        };
        let err = f.svc.create_appointment(f.alice, input).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let input = AppointmentCreate {
            client_id: f.alice_client,
            starts_at: start,
            ends_at: t(11) + Duration::nanoseconds(1_500_000),
            notes: None,
        };
        let appt = f.svc.create_appointment(f.alice, input).await.unwrap();
        assert_eq!(appt.starts_at, t(10));
        assert_eq!(appt.ends_at, t(11) + Duration::milliseconds(1));
        let stored = f.svc.get_appointment(f.alice, appt.id).await.unwrap();
        assert_eq!(stored.starts_at, appt.starts_at);
        assert_eq!(stored.ends_at, appt.ends_at);

        let err = f
            .svc
            .update_appointment(
                f.alice,
                appt.id,
                AppointmentUpdate {
                    starts_at: Some(t(11) + Duration::microseconds(1_900)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_revalidates_every_combination() {
        let f = fixture().await;
        let appt = f
            .svc
            .create_appointment(f.alice, create(f.alice_client, 9, 10))
            .await
            .unwrap();

        let cases = [
            AppointmentUpdate {
                ends_at: Some(t(9)),
                ..Default::default()
            },
            AppointmentUpdate {
                starts_at: Some(t(10)),
                ..Default::default()
            },
            AppointmentUpdate {
                starts_at: Some(t(12)),
                ends_at: Some(t(11)),
                ..Default::default()
            },
        ];
        for update in cases {
            let err = f
                .svc
                .update_appointment(f.alice, appt.id, update)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }

        let moved = f
            .svc
            .update_appointment(
                f.alice,
                appt.id,
                AppointmentUpdate {
                    starts_at: Some(t(8)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.starts_at, t(8));
        assert_eq!(moved.ends_at, t(10));
    }

    #[tokio::test]
    async fn update_cannot_reassign_to_foreign_client() {
        let f = fixture().await;
        let appt = f
            .svc
            .create_appointment(f.alice, create(f.alice_client, 9, 10))
            .await
            .unwrap();

        let err = f
            .svc
            .update_appointment(
                f.alice,
                appt.id,
                AppointmentUpdate {
                    client_id: Some(f.bob_client),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn notes_can_be_cleared() {
        let f = fixture().await;
        let mut input = create(f.alice_client, 9, 10);
        input.notes = Some("call first".to_string());
        let appt = f.svc.create_appointment(f.alice, input).await.unwrap();

        let updated = f
            .svc
            .update_appointment(
                f.alice,
                appt.id,
                AppointmentUpdate {
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.notes.is_none());
    }

    #[tokio::test]
    async fn other_owner_sees_nothing() {
        let f = fixture().await;
        let appt = f
            .svc
            .create_appointment(f.alice, create(f.alice_client, 9, 10))
            .await
            .unwrap();

        assert!(matches!(
            f.svc.get_appointment(f.bob, appt.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.delete_appointment(f.bob, appt.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.get_client(f.bob, f.alice_client).await,
            Err(AppError::NotFound(_))
        ));
        let listed = f
            .svc
            .list_appointments(f.bob, AppointmentListQuery::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_rejects_inverted_window() {
        let f = fixture().await;
        let err = f
            .svc
            .list_appointments(
                f.alice,
                AppointmentListQuery {
                    date_from: Some(t(12)),
                    date_to: Some(t(12) - Duration::hours(1)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
