// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end turn testing.
//!
//! `TestHarness` assembles the full turn pipeline with a mock provider and a
//! temp SQLite database. Lock and rate-limit tables are real, so tests
//! exercise the same storage paths as production.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::{TurnOutcome, TurnRequest, TurnRunner};
use parley_config::model::{OutputConfig, ParleyConfig};
use parley_core::{CompletionProvider, CompletionResult, DeltaSink, ParleyError};
use parley_gate::{ConversationMutex, RateLimiter};
use parley_router::ModelRouter;
use parley_skill::ToolRegistry;
use parley_storage::{Database, SqliteStore};
use tokio_util::sync::CancellationToken;

use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<CompletionResult>,
    config: ParleyConfig,
    provider_delay: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ParleyConfig::default();
        // Tight lock polling keeps contention tests fast.
        config.lock.retry_delay_ms = 10;
        config.lock.ttl_secs = 30;
        config.lock.max_wait_secs = 40;
        Self {
            responses: Vec::new(),
            config,
            provider_delay: None,
        }
    }

    /// Set scripted provider results.
    pub fn with_mock_responses(mut self, responses: Vec<CompletionResult>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.config.agent.system_prompt = Some(prompt.to_string());
        self
    }

    /// Allow `max_requests` turns per bucket in each `window_secs` window.
    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.config.rate_limit.max_requests = max_requests;
        self.config.rate_limit.window_secs = window_secs;
        self
    }

    pub fn with_tools_enabled(mut self, enabled: bool) -> Self {
        self.config.tools.enabled = enabled;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.config.tools.max_tool_rounds = rounds;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.config.output = output;
        self
    }

    /// Make every provider call take `delay`.
    pub fn with_provider_delay(mut self, delay: Duration) -> Self {
        self.provider_delay = Some(delay);
        self
    }

    /// Apply an arbitrary change to the configuration.
    pub fn configure(mut self, f: impl FnOnce(&mut ParleyConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ParleyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let db = Database::open(&db_path.to_string_lossy()).await?;
        let store = Arc::new(SqliteStore::new(db));

        let mut provider = MockProvider::with_responses(self.responses);
        if let Some(delay) = self.provider_delay {
            provider = provider.with_delay(delay);
        }
        let mock_provider = Arc::new(provider);

        let config = self.config;
        let mutex = ConversationMutex::from_config(store.clone(), &config.lock);
        let limiter = RateLimiter::from_config(store.clone(), &config.rate_limit)?;
        let router = ModelRouter::new(config.routing.clone());
        let registry = Arc::new(ToolRegistry::with_builtins(&config.tools));
        let provider: Arc<dyn CompletionProvider> = mock_provider.clone();

        let runner = Arc::new(TurnRunner::new(
            mutex, limiter, router, provider, registry, &config,
        ));

        Ok(TestHarness {
            runner,
            mock_provider,
            store,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    /// The turn runner under test.
    pub runner: Arc<TurnRunner>,
    /// The mock completion provider.
    pub mock_provider: Arc<MockProvider>,
    /// SQLite store backing the lock and rate-limit tables.
    pub store: Arc<SqliteStore>,
    pub config: ParleyConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one turn for `chat_id` and return its outcome.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<TurnOutcome, ParleyError> {
        self.runner.run(TurnRequest::new(chat_id, text), None, None).await
    }

    /// Run one turn, collecting the streamed text fragments.
    pub async fn send_streaming(
        &self,
        request: TurnRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<(TurnOutcome, Vec<String>), ParleyError> {
        let mut deltas = Vec::new();
        let outcome = {
            let sink: &mut DeltaSink<'_> = &mut |delta: &str| {
                deltas.push(delta.to_string());
                Ok(())
            };
            self.runner.run(request, Some(sink), cancel).await?
        };
        Ok((outcome, deltas))
    }
}
