// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation mutual exclusion backed by the lock table.
//!
//! A chat is held by inserting its row with a fresh owner token and an expiry
//! of `now + ttl`. Waiters poll: they retry the insert, try to take over a row
//! whose expiry has passed, and otherwise sleep for the retry delay until the
//! maximum wait is spent. A holder that dies without releasing blocks the chat
//! for at most one TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use parley_config::model::LockConfig;
use parley_core::{ConversationLock, LockStore, ParleyError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Timing for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    pub ttl: Duration,
    pub retry_delay: Duration,
    pub max_wait: Duration,
}

impl From<&LockConfig> for LockSettings {
    fn from(config: &LockConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }
}

/// Proof of holding a chat's lock. Pass it back to [`ConversationMutex::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub chat_id: i64,
    pub owner: String,
    pub expires_at: DateTime<Utc>,
}

/// Serializes turns per chat id across tasks and processes sharing the store.
pub struct ConversationMutex {
    store: Arc<dyn LockStore>,
    settings: LockSettings,
}

impl ConversationMutex {
    pub fn new(store: Arc<dyn LockStore>, settings: LockSettings) -> Self {
        Self { store, settings }
    }

    pub fn from_config(store: Arc<dyn LockStore>, config: &LockConfig) -> Self {
        Self::new(store, LockSettings::from(config))
    }

    pub fn settings(&self) -> LockSettings {
        self.settings
    }

    /// Run `task` while holding the lock for `chat_id`.
    ///
    /// The lock is released after the task finishes, whether it succeeded or
    /// not. A failed release is logged and never replaces the task's result.
    pub async fn with_lock<T, F, Fut>(&self, chat_id: i64, task: F) -> Result<T, ParleyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ParleyError>>,
    {
        let lease = self.acquire(chat_id).await?;
        let result = task().await;

        match self.release(&lease).await {
            Ok(true) => {}
            Ok(false) => warn!(
                chat_id,
                owner = %lease.owner,
                "conversation lock was reclaimed by another owner before release"
            ),
            Err(e) => warn!(chat_id, error = %e, "failed to release conversation lock"),
        }

        result
    }

    /// Wait until the lock for `chat_id` is held by a fresh owner token.
    ///
    /// Fails with [`ParleyError::LockAcquisitionTimeout`] once the total wait
    /// exceeds the configured maximum. Store failures propagate immediately.
    pub async fn acquire(&self, chat_id: i64) -> Result<LockLease, ParleyError> {
        let ttl = TimeDelta::from_std(self.settings.ttl)
            .map_err(|e| ParleyError::Config(format!("lock ttl out of range: {e}")))?;
        let owner = Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let now = Utc::now();
            let candidate = ConversationLock {
                chat_id,
                owner: owner.clone(),
                expires_at: now + ttl,
            };

            if self.store.try_insert_lock(&candidate).await? {
                debug!(chat_id, attempts, "conversation lock acquired");
                return Ok(lease_from(candidate));
            }

            if self.store.reclaim_expired_lock(&candidate, now).await? {
                info!(chat_id, attempts, "reclaimed expired conversation lock");
                return Ok(lease_from(candidate));
            }

            let waited = started.elapsed();
            if waited >= self.settings.max_wait {
                warn!(chat_id, attempts, ?waited, "gave up waiting for conversation lock");
                return Err(ParleyError::LockAcquisitionTimeout { chat_id, waited });
            }

            let remaining = self.settings.max_wait - waited;
            tokio::time::sleep(self.settings.retry_delay.min(remaining)).await;
        }
    }

    /// Delete the lock row if `lease` still owns it.
    ///
    /// Returns `false` when the row was already gone or taken over after expiry.
    pub async fn release(&self, lease: &LockLease) -> Result<bool, ParleyError> {
        let released = self.store.delete_lock(lease.chat_id, &lease.owner).await?;
        debug!(chat_id = lease.chat_id, released, "conversation lock released");
        Ok(released)
    }
}

fn lease_from(lock: ConversationLock) -> LockLease {
    LockLease {
        chat_id: lock.chat_id,
        owner: lock.owner,
        expires_at: lock.expires_at,
    }
}
