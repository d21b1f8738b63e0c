//! OpenAI-compatible completion adapter.
//!
//! Speaks the chat-completions SSE protocol (OpenAI, DeepSeek, and
//! compatible services). Per model turn it streams delta frames, and for
//! every content update it re-emits the *cumulative* text for the role —
//! that re-send behavior is a documented contract of this adapter (the
//! stream processor downstream turns it back into deltas), verified by
//! `cumulative_resend_contract` below.
//!
//! Tool use is a bounded in-adapter loop: when a turn ends with tool
//! calls, they are executed against the local [`ToolRegistry`], the
//! results are appended as `tool` messages, and the next turn runs —
//! capped by the Exchange's max-turn bound.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::errors::CompletionError;
use crate::exchange::{ExchangeOutcome, MessageContent};
use crate::roles::RoleSpec;
use crate::stream::ExchangeEvent;
use crate::tools::{ToolRegistry, ToolSpec};

use super::CompletionService;

pub struct OpenAiCompletion {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    registry: ToolRegistry,
}

impl OpenAiCompletion {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            registry: ToolRegistry::new(),
        }
    }

    /// Run one streamed model turn; returns the assembled content and any
    /// requested tool calls.
    async fn stream_turn(
        &self,
        role: &RoleSpec,
        wire: &[WireMessage],
        tool_specs: &[ToolSpec],
        events: &mpsc::Sender<ExchangeEvent>,
    ) -> Result<(String, Vec<PendingToolCall>), CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: wire,
            tools: if tool_specs.is_empty() {
                None
            } else {
                Some(tool_specs.iter().map(ToolDef::from).collect())
            },
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut assembler = DeltaAssembler::default();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));
            for line in drain_sse_lines(&mut buffer) {
                if apply_sse_line(&mut assembler, &line) {
                    // Cumulative re-send on every content update
                    events
                        .send(ExchangeEvent::Text {
                            source: role.name.to_string(),
                            text: assembler.content.clone(),
                        })
                        .await
                        .ok();
                }
            }
        }

        let content = assembler.content.clone();
        Ok((content, assembler.into_tool_calls()))
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn run_exchange(
        &self,
        role: &RoleSpec,
        task: &str,
        max_turns: u32,
        events: mpsc::Sender<ExchangeEvent>,
    ) -> Result<ExchangeOutcome, CompletionError> {
        let tool_specs = self.registry.specs_for(role.tools);
        let mut wire = vec![
            WireMessage::system(role.system_prompt),
            WireMessage::user(task),
        ];

        let mut outcome = ExchangeOutcome::default();
        outcome.push(
            "user",
            MessageContent::Text {
                text: task.to_string(),
            },
        );

        for turn in 1..=max_turns {
            outcome.turns_used = turn;
            let (content, tool_calls) = self.stream_turn(role, &wire, &tool_specs, &events).await?;

            if !content.trim().is_empty() {
                outcome.push(
                    role.name,
                    MessageContent::Text {
                        text: content.clone(),
                    },
                );
            }
            wire.push(WireMessage::assistant(&content, &tool_calls));

            if tool_calls.is_empty() {
                break;
            }

            let mut results = Vec::new();
            for call in &tool_calls {
                if call.name.is_empty() {
                    tracing::warn!("dropping tool call with no name");
                    continue;
                }
                events
                    .send(ExchangeEvent::ToolCall {
                        source: role.name.to_string(),
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    })
                    .await
                    .ok();
                outcome.push(
                    role.name,
                    MessageContent::ToolCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                );

                let output = self.registry.invoke(&call.name, &call.arguments);
                events
                    .send(ExchangeEvent::ToolResult {
                        content: output.clone(),
                    })
                    .await
                    .ok();
                outcome.push(
                    role.name,
                    MessageContent::ToolOutput {
                        output: output.clone(),
                    },
                );
                wire.push(WireMessage::tool(&call.id, &output));
                results.push(output);
            }

            events
                .send(ExchangeEvent::Summary {
                    source: role.name.to_string(),
                    content: results.join("\n"),
                })
                .await
                .ok();
        }

        events
            .send(ExchangeEvent::Completed(outcome.clone()))
            .await
            .ok();
        Ok(outcome)
    }
}

/// Feed one SSE line into the assembler. Returns `true` when the content
/// text grew. Non-`data:` lines and the `[DONE]` sentinel are skipped; a
/// malformed frame is dropped with a warning and the stream continues.
fn apply_sse_line(assembler: &mut DeltaAssembler, line: &str) -> bool {
    let Some(data) = line.strip_prefix("data:") else {
        return false;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return false;
    }
    match serde_json::from_str::<ChatChunk>(data) {
        Ok(frame) => {
            let mut content_changed = false;
            for choice in frame.choices {
                content_changed |= assembler.apply(choice.delta);
            }
            content_changed
        }
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed stream frame");
            false
        }
    }
}

/// Split complete lines off the SSE buffer, retaining any trailing partial
/// line for the next network chunk.
fn drain_sse_lines(buffer: &mut String) -> Vec<String> {
    let Some(last_newline) = buffer.rfind('\n') else {
        return Vec::new();
    };
    let complete: String = buffer.drain(..=last_newline).collect();
    complete
        .lines()
        .map(str::to_string)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Accumulates streamed deltas for one turn: content text plus
/// index-keyed tool-call fragments.
#[derive(Default)]
struct DeltaAssembler {
    content: String,
    tool_calls: BTreeMap<u32, PendingToolCall>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl DeltaAssembler {
    /// Apply one delta frame. Returns `true` when the content text grew
    /// (i.e. a cumulative re-send is due).
    fn apply(&mut self, delta: Delta) -> bool {
        let mut content_changed = false;
        if let Some(text) = delta.content {
            if !text.is_empty() {
                self.content.push_str(&text);
                content_changed = true;
            }
        }
        for fragment in delta.tool_calls.unwrap_or_default() {
            let entry = self.tool_calls.entry(fragment.index).or_default();
            if let Some(id) = fragment.id {
                entry.id = id;
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    entry.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }
        content_changed
    }

    fn into_tool_calls(self) -> Vec<PendingToolCall> {
        self.tool_calls.into_values().collect()
    }
}

// ---- wire types ----

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef>>,
    stream: bool,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn assistant(content: &str, tool_calls: &[PendingToolCall]) -> Self {
        Self {
            role: "assistant".to_string(),
            content: if content.is_empty() {
                None
            } else {
                Some(content.to_string())
            },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls.iter().map(WireToolCall::from).collect())
            },
            tool_call_id: None,
        }
    }

    fn tool(tool_call_id: &str, content: &str) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

impl From<&PendingToolCall> for WireToolCall {
    fn from(call: &PendingToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: WireFunction {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Serialize)]
struct ToolDef {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDef,
}

#[derive(Serialize)]
struct FunctionDef {
    name: &'static str,
    description: &'static str,
    parameters: serde_json::Value,
}

impl From<&ToolSpec> for ToolDef {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            kind: "function",
            function: FunctionDef {
                name: spec.name,
                description: spec.description,
                parameters: spec.parameters.clone(),
            },
        }
    }
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Deserialize, Default)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
