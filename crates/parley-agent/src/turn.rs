// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution of a single conversational turn.
//!
//! A turn holds the conversation mutex for its chat from start to finish:
//! rate limit, routing, the model/tool loop and output shaping all happen
//! inside the lock, so two turns for one chat never interleave.

use std::sync::Arc;

use parley_config::model::{OutputConfig, ParleyConfig, ToolsConfig};
use parley_core::{
    ChatMessage, CompletionProvider, CompletionRequest, CompletionResult, DeltaSink,
    ExecutedTool, Intent, ParleyError, RoutedModel, TokenUsage,
};
use parley_format::shape_reply;
use parley_gate::{ConversationMutex, RateLimiter};
use parley_router::ModelRouter;
use parley_skill::{ToolRegistry, should_enable_tools};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Input for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub chat_id: i64,
    /// Rate-limit bucket charged for this turn.
    pub bucket_key: String,
    /// The user's message, possibly starting with a `/<model>` override.
    pub text: String,
    /// Earlier messages of the conversation, oldest first.
    pub history: Vec<ChatMessage>,
    /// Model key or id chosen by the caller. A per-message override wins.
    pub explicit_model: Option<String>,
}

impl TurnRequest {
    /// Request charged to the chat's own bucket, with no history.
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            bucket_key: format!("chat:{chat_id}"),
            text: text.into(),
            history: Vec::new(),
            explicit_model: None,
        }
    }

    pub fn with_bucket(mut self, bucket_key: impl Into<String>) -> Self {
        self.bucket_key = bucket_key.into();
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.explicit_model = Some(model.into());
        self
    }
}

/// Result of a finished turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final model text before shaping.
    pub text: String,
    /// Shaped text, split for delivery. Never empty.
    pub chunks: Vec<String>,
    pub intent: Intent,
    pub routed: RoutedModel,
    /// Every tool run during the turn, in execution order.
    pub executed_tools: Vec<ExecutedTool>,
    /// Token usage summed over all completion calls of the turn.
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

/// Runs turns against a completion provider.
pub struct TurnRunner {
    mutex: ConversationMutex,
    limiter: RateLimiter,
    router: ModelRouter,
    provider: Arc<dyn CompletionProvider>,
    registry: Arc<ToolRegistry>,
    system_prompt: Option<String>,
    tools: ToolsConfig,
    output: OutputConfig,
}

impl TurnRunner {
    /// Creates a runner. Prompt, tool and output settings come from `config`.
    pub fn new(
        mutex: ConversationMutex,
        limiter: RateLimiter,
        router: ModelRouter,
        provider: Arc<dyn CompletionProvider>,
        registry: Arc<ToolRegistry>,
        config: &ParleyConfig,
    ) -> Self {
        let system_prompt = config
            .agent
            .system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Self {
            mutex,
            limiter,
            router,
            provider,
            registry,
            system_prompt,
            tools: config.tools.clone(),
            output: config.output.clone(),
        }
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Executes one turn while holding the chat's conversation lock.
    ///
    /// Text fragments are forwarded to `on_delta` as they stream in. Lock,
    /// rate-limit and completion errors are returned unchanged; tool
    /// failures are recorded in [`TurnOutcome::executed_tools`] instead.
    pub async fn run(
        &self,
        request: TurnRequest,
        on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TurnOutcome, ParleyError> {
        let chat_id = request.chat_id;
        self.mutex
            .with_lock(chat_id, move || self.run_locked(request, on_delta, cancel))
            .await
    }

    async fn run_locked(
        &self,
        request: TurnRequest,
        mut on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TurnOutcome, ParleyError> {
        let chat_id = request.chat_id;
        self.limiter.enforce(&request.bucket_key).await?;

        let (override_key, body) = self.router.split_override(&request.text);
        let explicit = override_key.or(request.explicit_model);
        let decision = self.router.route(body, explicit.as_deref());
        let routed = decision.model;

        let schemas = if self.tools.enabled && !self.registry.is_empty() && should_enable_tools(body)
        {
            self.registry.schemas()
        } else {
            Vec::new()
        };
        debug!(chat_id, tools = schemas.len(), "tool schemas selected");

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend(request.history);
        messages.push(ChatMessage::user(body));

        let mut executed_tools = Vec::new();
        let mut usage = None;
        let mut rounds = 0;

        let result = loop {
            let offered = if rounds < self.tools.max_tool_rounds {
                schemas.clone()
            } else {
                Vec::new()
            };
            let tools_offered = !offered.is_empty();

            let completion = CompletionRequest {
                model: routed.model_id.clone(),
                messages: messages.clone(),
                temperature: routed.temperature,
                max_tokens: routed.max_tokens,
                tools: offered,
            };
            let result = self
                .provider
                .stream(completion, on_delta.as_deref_mut(), cancel)
                .await?;
            usage = add_usage(usage, result.usage);

            if !tools_offered || !result.wants_tools() {
                break result;
            }

            rounds += 1;
            debug!(chat_id, round = rounds, calls = result.tool_calls.len(), "running tool calls");
            self.run_tool_round(&result, &mut messages, &mut executed_tools)
                .await;
        };

        let chunks = shape_reply(&result.text, &self.output);
        info!(
            chat_id,
            model = %routed.model_id,
            intent = %decision.intent,
            rounds,
            tools = executed_tools.len(),
            chunks = chunks.len(),
            "turn completed"
        );

        Ok(TurnOutcome {
            text: result.text,
            chunks,
            intent: decision.intent,
            routed,
            executed_tools,
            usage,
            finish_reason: result.finish_reason,
        })
    }

    /// Appends the assistant's tool calls and one tool message per call.
    async fn run_tool_round(
        &self,
        result: &CompletionResult,
        messages: &mut Vec<ChatMessage>,
        executed_tools: &mut Vec<ExecutedTool>,
    ) {
        let preamble = Some(result.text.clone()).filter(|t| !t.trim().is_empty());
        messages.push(ChatMessage::assistant_tool_calls(
            preamble,
            result.tool_calls.clone(),
        ));

        for call in &result.tool_calls {
            let executed = self.registry.execute_call(call).await;
            messages.push(ChatMessage::tool(call.id.clone(), executed.output.clone()));
            executed_tools.push(executed);
        }
    }
}

fn add_usage(total: Option<TokenUsage>, next: Option<TokenUsage>) -> Option<TokenUsage> {
    match (total, next) {
        (Some(a), Some(b)) => Some(TokenUsage {
            prompt_tokens: a.prompt_tokens.saturating_add(b.prompt_tokens),
            completion_tokens: a.completion_tokens.saturating_add(b.completion_tokens),
            total_tokens: a.total_tokens.saturating_add(b.total_tokens),
        }),
        (a, b) => a.or(b),
    }
}
