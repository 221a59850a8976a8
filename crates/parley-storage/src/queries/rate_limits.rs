// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limit event log: transactional count-then-append and bulk purge.

use chrono::{DateTime, Utc};
use parley_core::{ParleyError, WindowAdmission};
use rusqlite::{TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::queries::from_millis;

/// Count in-window events for a bucket and append one if below `max`.
///
/// The transaction is `BEGIN IMMEDIATE`, so it takes the write lock before
/// counting. Concurrent admissions for the same bucket, from this process or
/// another one sharing the file, observe each other's inserts.
pub async fn admit_event(
    db: &Database,
    bucket_key: &str,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
    max: u32,
) -> Result<WindowAdmission, ParleyError> {
    let bucket_key = bucket_key.to_string();
    let (now, window_start) = (now.timestamp_millis(), window_start.timestamp_millis());
    db.connection()
        .call(move |conn| -> Result<WindowAdmission, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let (count, oldest): (i64, Option<i64>) = tx.query_row(
                "SELECT COUNT(*), MIN(created_at)
                 FROM rate_limit_events
                 WHERE bucket_key = ?1 AND created_at >= ?2",
                params![bucket_key, window_start],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let oldest_in_window = oldest.map(|ms| from_millis(1, ms)).transpose()?;

            if count >= i64::from(max) {
                tx.commit()?;
                return Ok(WindowAdmission::Full { oldest_in_window });
            }

            tx.execute(
                "INSERT INTO rate_limit_events (bucket_key, created_at) VALUES (?1, ?2)",
                params![bucket_key, now],
            )?;
            tx.commit()?;

            Ok(WindowAdmission::Admitted {
                count_before: u32::try_from(count).unwrap_or(u32::MAX),
                oldest_in_window,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every event older than `cutoff`. Returns the number of rows removed.
pub async fn purge_before(db: &Database, cutoff: DateTime<Utc>) -> Result<usize, ParleyError> {
    let cutoff = cutoff.timestamp_millis();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM rate_limit_events WHERE created_at < ?1",
                params![cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Number of events recorded for a bucket at or after `since`.
pub async fn count_since(
    db: &Database,
    bucket_key: &str,
    since: DateTime<Utc>,
) -> Result<u32, ParleyError> {
    let bucket_key = bucket_key.to_string();
    let since = since.timestamp_millis();
    db.connection()
        .call(move |conn| -> Result<u32, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM rate_limit_events WHERE bucket_key = ?1 AND created_at >= ?2",
                params![bucket_key, since],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
