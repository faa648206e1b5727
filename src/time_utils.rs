// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and storage.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Database representation of a timestamp (epoch milliseconds).
pub fn to_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Inverse of [`to_millis`]. `None` when the value is outside chrono's range.
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Drop sub-millisecond precision so the value survives a database round trip.
pub fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(3)
}

/// Current time at storage precision.
pub fn now_utc() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}
