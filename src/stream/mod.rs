//! Exchange event vocabulary shared by the completion adapter and the
//! stream processor.
//!
//! A closed tagged enum — the processor matches it exhaustively instead of
//! sniffing runtime type names or optional fields.

pub mod processor;

pub use processor::{DisplayOptions, StreamProcessor};

use serde::{Deserialize, Serialize};

use crate::exchange::ExchangeOutcome;

/// Heterogeneous events emitted, strictly in order, over one Exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    /// Incremental role text. The completion adapter re-sends the
    /// *cumulative* text for the source on every update; deduplication is
    /// the processor's job.
    Text { source: String, text: String },

    /// A tool invocation request.
    ToolCall {
        source: String,
        name: String,
        arguments: String,
    },

    /// A tool's returned output.
    ToolResult { content: String },

    /// End-of-tool-round summary restating results already streamed.
    Summary { source: String, content: String },

    /// Terminal marker carrying the Exchange's structured result.
    Completed(ExchangeOutcome),
}

/// Short human-readable description of a tool invocation for status lines.
pub fn describe_tool_call(name: &str, arguments: &str) -> String {
    match name {
        "web_search" => {
            let query = serde_json::from_str::<serde_json::Value>(arguments)
                .ok()
                .and_then(|v| v.get("query").and_then(|q| q.as_str()).map(String::from))
                .unwrap_or_else(|| "query".to_string());
            format!("Searching: {}", truncate_str(&query, 40))
        }
        "calculate" => {
            let expr = serde_json::from_str::<serde_json::Value>(arguments)
                .ok()
                .and_then(|v| {
                    v.get("expression")
                        .and_then(|e| e.as_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| "expression".to_string());
            format!("Calculating: {}", truncate_str(&expr, 40))
        }
        "current_date" => "Checking today's date".to_string(),
        _ => name.to_string(),
    }
}

/// Truncate a string with ellipsis, respecting char boundaries.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
