// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiter over the append-only event log.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parley_config::model::RateLimitConfig;
use parley_core::{ParleyError, RateLimitDecision, RateLimitStore, WindowAdmission};
use tracing::{debug, warn};

/// Admits at most `max_requests` events per bucket in any trailing window.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window: TimeDelta,
    max_requests: u32,
    gc_multiplier: u32,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        window: Duration,
        max_requests: u32,
        gc_multiplier: u32,
    ) -> Result<Self, ParleyError> {
        let window = TimeDelta::from_std(window)
            .map_err(|e| ParleyError::Config(format!("rate limit window out of range: {e}")))?;
        Ok(Self {
            store,
            window,
            max_requests,
            gc_multiplier: gc_multiplier.max(1),
        })
    }

    pub fn from_config(
        store: Arc<dyn RateLimitStore>,
        config: &RateLimitConfig,
    ) -> Result<Self, ParleyError> {
        Self::new(
            store,
            Duration::from_secs(config.window_secs),
            config.max_requests,
            config.gc_multiplier,
        )
    }

    /// Consume one unit from `bucket_key` at the current time.
    pub async fn consume(&self, bucket_key: &str) -> Result<RateLimitDecision, ParleyError> {
        self.consume_at(bucket_key, Utc::now()).await
    }

    /// Consume one unit from `bucket_key` as of `now`.
    ///
    /// A denied call records nothing. `reset_at` is when the oldest event in
    /// the window ages out, or `now + window` when the window was empty.
    pub async fn consume_at(
        &self,
        bucket_key: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision, ParleyError> {
        let admission = self
            .store
            .admit_event(bucket_key, now, window_start(now, self.window), self.max_requests)
            .await?;

        let decision = match admission {
            WindowAdmission::Admitted {
                count_before,
                oldest_in_window,
            } => RateLimitDecision {
                allowed: true,
                remaining: self
                    .max_requests
                    .saturating_sub(count_before.saturating_add(1)),
                reset_at: window_end(oldest_in_window.unwrap_or(now), self.window),
            },
            WindowAdmission::Full { oldest_in_window } => RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: window_end(oldest_in_window.unwrap_or(now), self.window),
            },
        };

        debug!(
            bucket_key,
            allowed = decision.allowed,
            remaining = decision.remaining,
            "rate limit consulted"
        );

        self.collect_garbage(now).await;
        Ok(decision)
    }

    /// Like [`consume`](Self::consume), but a denial becomes
    /// [`ParleyError::RateLimitExceeded`].
    pub async fn enforce(&self, bucket_key: &str) -> Result<RateLimitDecision, ParleyError> {
        let decision = self.consume(bucket_key).await?;
        if decision.allowed {
            Ok(decision)
        } else {
            warn!(bucket_key, reset_at = %decision.reset_at, "rate limit exceeded");
            Err(ParleyError::RateLimitExceeded {
                bucket_key: bucket_key.to_string(),
                reset_at: decision.reset_at,
            })
        }
    }

    /// Drop events far older than the window. Failures only cost disk space.
    async fn collect_garbage(&self, now: DateTime<Utc>) {
        let Some(cutoff) = gc_cutoff(now, self.window, self.gc_multiplier) else {
            debug!("rate limit garbage collection horizon out of range, skipped");
            return;
        };
        match self.store.purge_events_before(cutoff).await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "purged stale rate limit events"),
            Err(e) => debug!(error = %e, "rate limit garbage collection failed"),
        }
    }
}

fn window_start(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn window_end(start: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    start.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Events before the returned instant are safe to delete. `None` when the
/// horizon does not fit the calendar, in which case nothing is collected.
fn gc_cutoff(now: DateTime<Utc>, window: TimeDelta, multiplier: u32) -> Option<DateTime<Utc>> {
    let multiplier = i32::try_from(multiplier).unwrap_or(i32::MAX).max(1);
    let horizon = window.checked_mul(multiplier)?;
    now.checked_sub_signed(horizon)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parley_storage::{Database, SqliteStore};
    use tempfile::tempdir;

    async fn setup_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("limits.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (SqliteStore::new(db), dir)
    }

    fn limiter(store: SqliteStore, max: u32) -> RateLimiter {
        RateLimiter::new(Arc::new(store), Duration::from_secs(60), max, 10).unwrap()
    }

    #[tokio::test]
    async fn remaining_counts_down() {
        let (store, _dir) = setup_store().await;
        let limiter = limiter(store, 3);
        let now = Utc::now();

        let remaining: Vec<u32> = [
            limiter.consume_at("u", now).await.unwrap(),
            limiter.consume_at("u", now).await.unwrap(),
            limiter.consume_at("u", now).await.unwrap(),
        ]
        .iter()
        .map(|d| d.remaining)
        .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let denied = limiter.consume_at("u", now).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[tokio::test]
    async fn concurrent_consumes_admit_exactly_max() {
        let (store, _dir) = setup_store().await;
        let limiter = Arc::new(limiter(store, 4));
        let now = Utc::now();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.consume_at("shared", now).await })
            })
            .collect();

        let mut decisions = Vec::new();
        for handle in handles {
            decisions.push(handle.await.unwrap().unwrap());
        }

        let allowed = decisions.iter().filter(|d| d.allowed).count();
        assert_eq!(allowed, 4);
        for denied in decisions.iter().filter(|d| !d.allowed) {
            assert_eq!(
                denied.reset_at.timestamp_millis(),
                (now + TimeDelta::seconds(60)).timestamp_millis()
            );
        }
    }

    #[tokio::test]
    async fn denial_resets_when_oldest_event_ages_out() {
        let (store, _dir) = setup_store().await;
        let limiter = limiter(store, 2);
        let t0 = Utc::now();

        limiter.consume_at("u", t0).await.unwrap();
        limiter
            .consume_at("u", t0 + TimeDelta::seconds(10))
            .await
            .unwrap();

        let denied = limiter
            .consume_at("u", t0 + TimeDelta::seconds(20))
            .await
            .unwrap();
        assert!(!denied.allowed);
        assert_eq!(
            denied.reset_at.timestamp_millis(),
            (t0 + TimeDelta::seconds(60)).timestamp_millis()
        );

        // Once the first event leaves the window a slot frees up.
        let later = limiter
            .consume_at("u", t0 + TimeDelta::seconds(61))
            .await
            .unwrap();
        assert!(later.allowed);
        assert_eq!(later.remaining, 0);
    }

    #[tokio::test]
    async fn enforce_maps_denial_to_error() {
        let (store, _dir) = setup_store().await;
        let limiter = limiter(store, 1);

        limiter.enforce("chat:9").await.unwrap();
        let err = limiter.enforce("chat:9").await.expect_err("should deny");
        match err {
            ParleyError::RateLimitExceeded { bucket_key, reset_at } => {
                assert_eq!(bucket_key, "chat:9");
                assert!(reset_at > Utc::now());
            }
            other => panic!("expected RateLimitExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn old_events_are_collected() {
        let (store, _dir) = setup_store().await;
        let db = store.database().clone();
        let limiter = limiter(store, 5);
        let now = Utc::now();

        limiter
            .consume_at("u", now - TimeDelta::hours(1))
            .await
            .unwrap();
        limiter.consume_at("u", now).await.unwrap();

        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        let left = parley_storage::queries::rate_limits::count_since(&db, "u", epoch)
            .await
            .unwrap();
        assert_eq!(left, 1, "event older than window * gc_multiplier should be purged");
    }

    #[tokio::test]
    async fn huge_gc_multiplier_never_purges_live_events() {
        let (store, _dir) = setup_store().await;
        let limiter =
            RateLimiter::new(Arc::new(store), Duration::from_secs(60), 1, 3_000_000_000).unwrap();
        let now = Utc::now();

        assert!(limiter.consume_at("u", now).await.unwrap().allowed);
        assert!(!limiter.consume_at("u", now).await.unwrap().allowed);
    }

    #[test]
    fn gc_cutoff_stays_behind_the_window() {
        let now = Utc::now();
        let window = TimeDelta::seconds(60);

        assert_eq!(gc_cutoff(now, window, 10), Some(now - TimeDelta::seconds(600)));
        let far = gc_cutoff(now, window, u32::MAX).unwrap();
        assert!(far < now - window);
        assert_eq!(gc_cutoff(now, TimeDelta::MAX, 2), None);
    }

    #[tokio::test]
    async fn oversized_window_does_not_panic() {
        let (store, _dir) = setup_store().await;
        let limiter = RateLimiter::new(
            Arc::new(store),
            // Tens of millions of years: past the end of the calendar.
            Duration::from_secs(1 << 50),
            1,
            1,
        )
        .unwrap();

        let decision = limiter.consume("u").await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reset_at, DateTime::<Utc>::MAX_UTC);
    }

    /// Store whose purge always fails.
    struct NoPurgeStore(SqliteStore);

    #[async_trait]
    impl RateLimitStore for NoPurgeStore {
        async fn admit_event(
            &self,
            bucket_key: &str,
            now: DateTime<Utc>,
            window_start: DateTime<Utc>,
            max: u32,
        ) -> Result<WindowAdmission, ParleyError> {
            self.0.admit_event(bucket_key, now, window_start, max).await
        }

        async fn purge_events_before(&self, _cutoff: DateTime<Utc>) -> Result<usize, ParleyError> {
            Err(ParleyError::Storage {
                source: "database is locked".into(),
            })
        }
    }

    #[tokio::test]
    async fn garbage_collection_failure_is_ignored() {
        let (store, _dir) = setup_store().await;
        let limiter =
            RateLimiter::new(Arc::new(NoPurgeStore(store)), Duration::from_secs(60), 2, 10)
                .unwrap();

        let decision = limiter.consume("u").await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }
}
