// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod appointment;
pub mod client;
pub mod event;
pub mod integration;
pub mod user;

pub use appointment::{Appointment, AppointmentCreate, AppointmentListQuery, AppointmentUpdate};
pub use client::{Client, ClientCreate, ClientListQuery, ClientUpdate};
pub use event::{CalendarEvent, EventsResponse};
pub use integration::{GoogleIntegration, IntegrationStatus};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
