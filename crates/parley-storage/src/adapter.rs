// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the lock and rate-limit store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_config::model::StorageConfig;
use parley_core::{ConversationLock, LockStore, ParleyError, RateLimitStore, WindowAdmission};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store shared by the conversation mutex and the rate limiter.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by `config` and wrap it.
    pub async fn open(config: &StorageConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(Database::open_from_config(config).await?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl LockStore for SqliteStore {
    async fn try_insert_lock(&self, lock: &ConversationLock) -> Result<bool, ParleyError> {
        queries::locks::insert_lock(&self.db, lock).await
    }

    async fn reclaim_expired_lock(
        &self,
        lock: &ConversationLock,
        now: DateTime<Utc>,
    ) -> Result<bool, ParleyError> {
        queries::locks::reclaim_expired(&self.db, lock, now).await
    }

    async fn delete_lock(&self, chat_id: i64, owner: &str) -> Result<bool, ParleyError> {
        queries::locks::delete_lock(&self.db, chat_id, owner).await
    }
}

#[async_trait]
impl RateLimitStore for SqliteStore {
    async fn admit_event(
        &self,
        bucket_key: &str,
        now: DateTime<Utc>,
        window_start: DateTime<Utc>,
        max: u32,
    ) -> Result<WindowAdmission, ParleyError> {
        queries::rate_limits::admit_event(&self.db, bucket_key, now, window_start, max).await
    }

    async fn purge_events_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ParleyError> {
        queries::rate_limits::purge_before(&self.db, cutoff).await
    }
}
