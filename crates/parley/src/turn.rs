// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley turn`: run one turn end to end against the configured API.

use std::io::Write;
use std::sync::Arc;

use clap::Args;
use parley_agent::{TurnOutcome, TurnRequest, TurnRunner, install_signal_handler};
use parley_completion::OpenRouterProvider;
use parley_config::ParleyConfig;
use parley_core::{AbortReason, CompletionProvider, DeltaSink, ParleyError};
use parley_gate::{ConversationMutex, RateLimiter};
use parley_router::ModelRouter;
use parley_skill::ToolRegistry;
use parley_storage::SqliteStore;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct TurnArgs {
    /// Conversation the turn belongs to.
    #[arg(long, default_value_t = 0)]
    pub chat_id: i64,

    /// Rate-limit bucket. Defaults to `chat:<chat-id>`.
    #[arg(long)]
    pub bucket: Option<String>,

    /// Model preset key or model id. `auto` routes by intent.
    #[arg(long)]
    pub model: Option<String>,

    /// Print text as it streams instead of the shaped reply.
    #[arg(long)]
    pub stream: bool,

    /// Message text.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl TurnArgs {
    fn into_request(self) -> TurnRequest {
        let mut request = TurnRequest::new(self.chat_id, self.text.join(" "));
        if let Some(bucket) = self.bucket {
            request = request.with_bucket(bucket);
        }
        if let Some(model) = self.model {
            request = request.with_model(model);
        }
        request
    }
}

/// Builds the production pipeline from configuration.
pub async fn build_runner(config: &ParleyConfig) -> Result<(TurnRunner, Arc<SqliteStore>), ParleyError> {
    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let provider: Arc<dyn CompletionProvider> = Arc::new(OpenRouterProvider::new(&config.completion)?);

    let runner = TurnRunner::new(
        ConversationMutex::from_config(store.clone(), &config.lock),
        RateLimiter::from_config(store.clone(), &config.rate_limit)?,
        ModelRouter::new(config.routing.clone()),
        provider,
        Arc::new(ToolRegistry::with_builtins(&config.tools)),
        config,
    );
    Ok((runner, store))
}

pub async fn run_turn(config: &ParleyConfig, args: TurnArgs) -> Result<(), ParleyError> {
    let stream = args.stream;
    let request = args.into_request();
    let (runner, store) = build_runner(config).await?;
    let cancel = install_signal_handler();

    let result = if stream {
        let mut stdout = std::io::stdout();
        let sink: &mut DeltaSink<'_> = &mut |delta: &str| {
            stdout
                .write_all(delta.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| ParleyError::Internal(format!("stdout write failed: {e}")))
        };
        let result = runner.run(request, Some(sink), Some(&cancel)).await;
        println!();
        result
    } else {
        runner.run(request, None, Some(&cancel)).await
    };

    if let Err(e) = store.database().clone().close().await {
        warn!(error = %e, "failed to close database");
    }

    let outcome = result?;
    log_outcome(&outcome);
    if !stream {
        print!("{}", render_chunks(&outcome.chunks));
    }
    Ok(())
}

fn log_outcome(outcome: &TurnOutcome) {
    info!(
        intent = %outcome.intent,
        model = %outcome.routed.model_id,
        tools = outcome.executed_tools.len(),
        total_tokens = outcome.usage.map(|u| u.total_tokens),
        finish_reason = outcome.finish_reason.as_deref(),
        "turn finished"
    );
}

/// Chunks as they would be delivered, separated by a divider line.
pub fn render_chunks(chunks: &[String]) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n");
        }
        out.push_str(chunk);
        out.push('\n');
    }
    out
}

/// User-facing description of a failed turn.
pub fn describe_error(error: &ParleyError) -> String {
    match error {
        ParleyError::RateLimitExceeded { reset_at, .. } => format!(
            "too many requests, try again after {}",
            reset_at.format("%H:%M:%S UTC")
        ),
        ParleyError::LockAcquisitionTimeout { .. } => {
            "this conversation is still busy with an earlier message, try again shortly".to_string()
        }
        ParleyError::Aborted(AbortReason::Cancelled) => "cancelled".to_string(),
        ParleyError::Aborted(AbortReason::TimedOut(after)) => {
            format!("the model did not answer within {}s", after.as_secs())
        }
        other => other.to_string(),
    }
}
