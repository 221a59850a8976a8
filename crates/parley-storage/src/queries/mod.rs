// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over the [`Database`](crate::Database) handle.

pub mod locks;
pub mod rate_limits;

use chrono::{DateTime, Utc};

/// Convert a stored Unix-millisecond column back into a timestamp.
pub(crate) fn from_millis(column: usize, ms: i64) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(column, ms))
}
