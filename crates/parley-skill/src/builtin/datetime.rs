// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Current date and time in an IANA timezone.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parley_core::ParleyError;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolOutput};

/// Reports the current time in a timezone.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time in an IANA timezone such as Europe/Berlin"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone identifier; defaults to UTC"
                }
            }
        })
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        let zone = input["timezone"]
            .as_str()
            .map(str::trim)
            .filter(|z| !z.is_empty())
            .unwrap_or("UTC");
        Ok(ToolOutput::ok(format_time_in(Utc::now(), zone)?))
    }
}

/// Format `now` as local time in `zone`.
pub fn format_time_in(now: DateTime<Utc>, zone: &str) -> Result<String, ParleyError> {
    let tz: Tz = zone
        .parse()
        .map_err(|_| ParleyError::skill(format!("unknown timezone '{zone}'")))?;
    let local = now.with_timezone(&tz);
    Ok(format!(
        "{} ({})",
        local.format("%A, %Y-%m-%d %H:%M:%S %Z"),
        tz.name()
    ))
}
