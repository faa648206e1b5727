// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client (customer) records owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A client belonging to exactly one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    #[serde(skip)]
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClientCreate {
    #[validate(length(max = 255))]
    pub name: String,
    #[validate(length(max = 50))]
    pub phone: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ClientUpdate {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
}

/// `GET /clients?q=...`
#[derive(Debug, Default, Deserialize)]
pub struct ClientListQuery {
    pub q: Option<String>,
}
