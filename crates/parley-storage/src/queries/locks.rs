// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation lock rows: insert-if-absent, reclaim-if-expired, delete-by-owner.

use chrono::{DateTime, Utc};
use parley_core::{ConversationLock, ParleyError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::from_millis;

/// Insert a lock row unless one already exists for the chat.
///
/// Returns `true` when this call created the row.
pub async fn insert_lock(db: &Database, lock: &ConversationLock) -> Result<bool, ParleyError> {
    let (chat_id, owner, expires_at) = (
        lock.chat_id,
        lock.owner.clone(),
        lock.expires_at.timestamp_millis(),
    );
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let inserted = conn.execute(
                "INSERT INTO conversation_locks (chat_id, owner, expires_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(chat_id) DO NOTHING",
                params![chat_id, owner, expires_at],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Hand an expired row to a new owner.
///
/// The `expires_at <= now` guard makes the takeover a single atomic
/// statement, so two waiters racing for the same expired row cannot both win.
pub async fn reclaim_expired(
    db: &Database,
    lock: &ConversationLock,
    now: DateTime<Utc>,
) -> Result<bool, ParleyError> {
    let (chat_id, owner, expires_at, now) = (
        lock.chat_id,
        lock.owner.clone(),
        lock.expires_at.timestamp_millis(),
        now.timestamp_millis(),
    );
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let updated = conn.execute(
                "UPDATE conversation_locks
                 SET owner = ?2, expires_at = ?3
                 WHERE chat_id = ?1 AND expires_at <= ?4",
                params![chat_id, owner, expires_at, now],
            )?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the row for `chat_id` only if `owner` still holds it.
pub async fn delete_lock(db: &Database, chat_id: i64, owner: &str) -> Result<bool, ParleyError> {
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let deleted = conn.execute(
                "DELETE FROM conversation_locks WHERE chat_id = ?1 AND owner = ?2",
                params![chat_id, owner],
            )?;
            Ok(deleted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Current row for a chat, expired or not.
pub async fn get_lock(db: &Database, chat_id: i64) -> Result<Option<ConversationLock>, ParleyError> {
    db.connection()
        .call(move |conn| -> Result<Option<ConversationLock>, rusqlite::Error> {
            conn.query_row(
                "SELECT chat_id, owner, expires_at FROM conversation_locks WHERE chat_id = ?1",
                params![chat_id],
                |row| {
                    Ok(ConversationLock {
                        chat_id: row.get(0)?,
                        owner: row.get(1)?,
                        expires_at: from_millis(2, row.get(2)?)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
