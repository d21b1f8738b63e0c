//! Exchange data model and the conversation extractor.
//!
//! An [`Exchange`] is one bounded conversation run for a single pipeline
//! stage (or one round of the outline gate): a task prompt, a max-turn
//! bound, and the ordered messages the roles produced. Exchanges are
//! created per stage and discarded after extraction.

use serde::{Deserialize, Serialize};

use crate::ui::Renderer;

/// What a single message carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    ToolCall { name: String, arguments: String },
    ToolOutput { output: String },
}

impl MessageContent {
    /// Flat text rendition, used when threading a message into a prompt.
    pub fn display_text(&self) -> String {
        match self {
            MessageContent::Text { text } => text.clone(),
            MessageContent::ToolCall { name, arguments } => {
                format!("[tool call] {}({})", name, arguments)
            }
            MessageContent::ToolOutput { output } => output.clone(),
        }
    }
}

/// One message within an Exchange. Immutable once appended; `ordinal` is
/// its position in the Exchange and strictly increases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeMessage {
    pub source: String,
    pub ordinal: u32,
    pub content: MessageContent,
}

/// The terminal result of an Exchange: the full ordered message list plus
/// how many model turns were spent producing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub messages: Vec<ExchangeMessage>,
    pub turns_used: u32,
}

impl ExchangeOutcome {
    /// Append a message, assigning the next ordinal.
    pub fn push(&mut self, source: &str, content: MessageContent) {
        let ordinal = self.messages.len() as u32;
        self.messages.push(ExchangeMessage {
            source: source.to_string(),
            ordinal,
            content,
        });
    }
}

/// Extract the most recent message a named role produced in an Exchange.
///
/// Scans from the end backward and returns the first message whose source
/// matches `role_name`. If the role produced nothing, emits
/// `fallback_warning` (when non-empty) through the renderer and returns the
/// chronologically last message instead — a best-effort degrade, never an
/// error.
pub fn extract_last(
    outcome: &ExchangeOutcome,
    role_name: &str,
    fallback_warning: &str,
    renderer: &dyn Renderer,
) -> String {
    for msg in outcome.messages.iter().rev() {
        if msg.source == role_name {
            return msg.content.display_text();
        }
    }

    if !fallback_warning.is_empty() {
        renderer.warning(fallback_warning);
    }
    outcome
        .messages
        .last()
        .map(|m| m.content.display_text())
        .unwrap_or_default()
}
