// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for the conversation lock and rate-limit tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ParleyError;
use crate::types::ConversationLock;

/// Backend for the per-conversation lock table.
///
/// Implementations must make each operation atomic with respect to other
/// callers sharing the same backing store, including other processes.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Inserts the lock row if no row exists for `lock.chat_id`.
    ///
    /// Returns `false` when another owner already holds a row, expired or not.
    async fn try_insert_lock(&self, lock: &ConversationLock) -> Result<bool, ParleyError>;

    /// Transfers an existing row to `lock.owner` only if it expired at or before `now`.
    async fn reclaim_expired_lock(
        &self,
        lock: &ConversationLock,
        now: DateTime<Utc>,
    ) -> Result<bool, ParleyError>;

    /// Deletes the row for `chat_id` if it is still held by `owner`.
    async fn delete_lock(&self, chat_id: i64, owner: &str) -> Result<bool, ParleyError>;
}

/// Result of a transactional count-then-append on a rate-limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAdmission {
    /// An event was appended. `count_before` excludes it.
    Admitted {
        count_before: u32,
        oldest_in_window: Option<DateTime<Utc>>,
    },
    /// The bucket already holds the maximum number of in-window events.
    Full {
        oldest_in_window: Option<DateTime<Utc>>,
    },
}

/// Backend for the append-only rate-limit event table.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Counts events for `bucket_key` created at or after `window_start` and,
    /// inside the same transaction, appends an event at `now` when the count
    /// is below `max`.
    async fn admit_event(
        &self,
        bucket_key: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        max: u32,
    ) -> Result<WindowAdmission, ParleyError>;

    /// Deletes every event created before `cutoff`, across all buckets.
    async fn purge_events_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ParleyError>;
}
