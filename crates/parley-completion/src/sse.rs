// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for chat completion streaming responses.
//!
//! Converts a reqwest response byte stream into typed [`StreamChunk`]
//! payloads using the `eventsource-stream` crate for SSE framing. Each
//! event's data is split into lines and every line is parsed on its own;
//! the `[DONE]` sentinel and lines that are not valid JSON are skipped.

use std::pin::Pin;

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use parley_core::ParleyError;
use tracing::debug;

use crate::types::StreamChunk;

/// Sentinel sent by OpenAI-compatible APIs after the last payload.
const DONE_SENTINEL: &str = "[DONE]";

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ParleyError>> + Send>>;

/// Parses a streaming response into a stream of [`StreamChunk`]s.
pub fn parse_sse_stream(response: reqwest::Response) -> ChunkStream {
    parse_byte_stream(response.bytes_stream())
}

/// Parses raw SSE body bytes into [`StreamChunk`]s.
///
/// A blank line is appended to the body so an event the server left
/// unterminated at EOF is still dispatched.
pub fn parse_byte_stream<S, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let terminated = bytes.chain(stream::once(async { Ok(Bytes::from_static(b"\n\n")) }));
    let events = terminated.eventsource();

    let chunks = events.flat_map(|result| {
        let items: Vec<Result<StreamChunk, ParleyError>> = match result {
            Ok(event) => parse_event_data(&event.data).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(ParleyError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })],
        };
        stream::iter(items)
    });

    Box::pin(chunks)
}

/// Parses every JSON line of one event's data field.
pub(crate) fn parse_event_data(data: &str) -> Vec<StreamChunk> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != DONE_SENTINEL)
        .filter_map(|line| match serde_json::from_str::<StreamChunk>(line) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                debug!(error = %e, line, "skipping unparsable stream line");
                None
            }
        })
        .collect()
}
