// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait is the interface every built-in tool implements. The
//! [`ToolRegistry`] looks tools up by exact name, produces the schema list
//! offered to the model, and contains every failure inside the returned
//! [`ExecutedTool`] so a broken tool never aborts a turn.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parley_config::model::ToolsConfig;
use parley_core::{ExecutedTool, ParleyError, ToolCall, ToolSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::builtin;

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text handed back to the model.
    pub content: String,
    /// Whether the invocation failed.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Unified trait for all tools.
///
/// The turn runner calls `invoke` with the JSON arguments the model produced
/// for a tool call, already parsed into a JSON object.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for lookup and in the schema sent upstream.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> Value;

    /// Invoke the tool with the given JSON input.
    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry holding every built-in tool.
    pub fn with_builtins(config: &ToolsConfig) -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry, config);
        registry
    }

    /// Registers a tool under its `name()`, replacing any previous holder.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns (name, description) pairs sorted by name.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Schemas for every registered tool, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|t| ToolSchema {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a model-requested tool call.
    pub async fn execute_call(&self, call: &ToolCall) -> ExecutedTool {
        self.execute(&call.name, &call.arguments_json).await
    }

    /// Run tool `name` with a raw JSON argument string. Never fails.
    ///
    /// Unparsable arguments are replaced by an empty object. Unknown names,
    /// tool errors and tool-reported failures all come back with `is_error`.
    pub async fn execute(&self, name: &str, arguments_json: &str) -> ExecutedTool {
        let input = parse_arguments(arguments_json);

        let Some(tool) = self.get(name) else {
            warn!(tool = name, "model requested an unknown tool");
            return ExecutedTool {
                name: name.to_string(),
                input,
                output: format!("unknown tool: {name}"),
                is_error: true,
            };
        };

        match tool.invoke(input.clone()).await {
            Ok(output) => {
                info!(tool = name, is_error = output.is_error, "tool executed");
                ExecutedTool {
                    name: name.to_string(),
                    input,
                    output: output.content,
                    is_error: output.is_error,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                ExecutedTool {
                    name: name.to_string(),
                    input,
                    output: e.to_string(),
                    is_error: true,
                }
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse model-supplied arguments into a JSON object.
///
/// Accepts an object directly or an object encoded once more as a JSON
/// string. Anything else yields `{}`.
pub fn parse_arguments(raw: &str) -> Value {
    let empty = || Value::Object(serde_json::Map::new());
    if raw.trim().is_empty() {
        return empty();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(value @ Value::Object(_)) => value,
            _ => empty(),
        },
        Ok(_) => empty(),
        Err(e) => {
            debug!(error = %e, "tool arguments are not valid JSON");
            empty()
        }
    }
}

/// Required string field from a tool input object.
pub(crate) fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ParleyError> {
    input[field]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ParleyError::skill(format!("missing required '{field}' parameter")))
}
