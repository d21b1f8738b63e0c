//! Streaming Message Processor.
//!
//! Consumes one Exchange's event sequence strictly in order, decides per
//! event whether and how to forward it to the renderer, and captures the
//! terminal result. All dedup state is per-Exchange: build one processor per
//! Exchange and discard it afterwards.
//!
//! Text dedup per source:
//! - exact re-send of the last full text → dropped
//! - prefix-extension of the last text (the adapter re-sends cumulative
//!   text on every update) → only the delta suffix is rendered
//! - anything else → rendered whole
//! - a secondary key of `(source, length, first 200 chars)` drops full
//!   texts already seen this Exchange even when the last-text comparison
//!   misses them

use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

use crate::exchange::ExchangeOutcome;
use crate::stream::ExchangeEvent;
use crate::ui::Renderer;

/// What the processor is allowed to forward.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub show_role_banners: bool,
    pub show_content: bool,
    pub show_tools: bool,
    /// Truncate rendered chunks to this many characters, with a
    /// `... (truncated K chars)` suffix.
    pub content_max_chars: Option<usize>,
    /// When set, only these sources may render text.
    pub allowed_sources: Option<HashSet<String>>,
    /// Sources always hidden (banners and text).
    pub suppressed_sources: HashSet<String>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_role_banners: true,
            show_content: true,
            show_tools: false,
            content_max_chars: None,
            allowed_sources: None,
            suppressed_sources: HashSet::new(),
        }
    }
}

impl DisplayOptions {
    pub fn with_max_chars(mut self, max: usize) -> Self {
        self.content_max_chars = Some(max);
        self
    }

    pub fn suppress(mut self, source: &str) -> Self {
        self.suppressed_sources.insert(source.to_string());
        self
    }
}

/// Per-Exchange streaming consumer. State is O(exchange length) and never
/// outlives the Exchange.
pub struct StreamProcessor {
    options: DisplayOptions,
    current_source: Option<String>,
    last_text: HashMap<String, String>,
    seen_text_keys: HashSet<(String, usize, String)>,
    seen_tool_calls: HashSet<String>,
    seen_tool_results: HashSet<String>,
    outcome: Option<ExchangeOutcome>,
}

impl StreamProcessor {
    pub fn new(options: DisplayOptions) -> Self {
        Self {
            options,
            current_source: None,
            last_text: HashMap::new(),
            seen_text_keys: HashSet::new(),
            seen_tool_calls: HashSet::new(),
            seen_tool_results: HashSet::new(),
            outcome: None,
        }
    }

    /// Drain the Exchange's event channel. A single consumer task calls
    /// this, preserving emission order; no blocking I/O happens here beyond
    /// the forwarding calls themselves.
    pub async fn consume(
        mut self,
        mut events: mpsc::Receiver<ExchangeEvent>,
        renderer: &dyn Renderer,
    ) -> Option<ExchangeOutcome> {
        while let Some(event) = events.recv().await {
            self.handle_event(event, renderer);
        }
        self.outcome
    }

    /// Process one event. Exposed separately so tests can drive the
    /// processor without a channel.
    pub fn handle_event(&mut self, event: ExchangeEvent, renderer: &dyn Renderer) {
        match event {
            ExchangeEvent::Text { source, text } => self.on_text(&source, &text, renderer),
            ExchangeEvent::ToolCall {
                source,
                name,
                arguments,
            } => self.on_tool_call(&source, &name, &arguments, renderer),
            ExchangeEvent::ToolResult { content } => self.on_tool_result(&content, renderer),
            ExchangeEvent::Summary { .. } => {
                // Summaries restate tool results already shown
                tracing::trace!("suppressing summary event");
            }
            ExchangeEvent::Completed(outcome) => {
                self.outcome = Some(outcome);
            }
        }
    }

    /// The captured terminal result, if the Exchange has completed.
    pub fn into_outcome(self) -> Option<ExchangeOutcome> {
        self.outcome
    }

    fn maybe_banner(&mut self, source: &str, renderer: &dyn Renderer) {
        if !self.options.show_role_banners {
            return;
        }
        if self.options.suppressed_sources.contains(source) {
            return;
        }
        if self.current_source.as_deref() != Some(source) {
            self.current_source = Some(source.to_string());
            renderer.role_banner(source);
        }
    }

    fn on_text(&mut self, source: &str, text: &str, renderer: &dyn Renderer) {
        self.maybe_banner(source, renderer);

        let candidate = match self.last_text.get(source) {
            Some(prev) if prev == text => None,
            Some(prev) if text.starts_with(prev.as_str()) => Some(text[prev.len()..].to_string()),
            _ => Some(text.to_string()),
        };

        // Last-rendered state tracks the full incoming text regardless of
        // what (if anything) is forwarded
        self.last_text
            .insert(source.to_string(), text.to_string());

        let Some(candidate) = candidate else {
            return;
        };
        if candidate.trim().is_empty() {
            return;
        }

        let key = (
            source.to_string(),
            text.chars().count(),
            text.chars().take(200).collect::<String>(),
        );
        if !self.seen_text_keys.insert(key) {
            return;
        }

        if !self.options.show_content {
            return;
        }
        if self.options.suppressed_sources.contains(source) {
            return;
        }
        if let Some(allowed) = &self.options.allowed_sources {
            if !allowed.contains(source) {
                return;
            }
        }

        let rendered = truncate_text(&candidate, self.options.content_max_chars);
        renderer.content(&rendered);
    }

    fn on_tool_call(&mut self, source: &str, name: &str, arguments: &str, renderer: &dyn Renderer) {
        self.maybe_banner(source, renderer);
        if !self.options.show_tools {
            return;
        }
        let key = format!("{}:{}", name, arguments);
        if self.seen_tool_calls.insert(key) {
            renderer.tool_call(name, arguments);
        }
    }

    fn on_tool_result(&mut self, content: &str, renderer: &dyn Renderer) {
        if !self.options.show_tools {
            return;
        }
        let key: String = content.chars().take(200).collect();
        if self.seen_tool_results.insert(key) {
            renderer.tool_result(content);
        }
    }
}

/// Truncate rendered text, appending how much was omitted.
fn truncate_text(text: &str, max_chars: Option<usize>) -> String {
    let Some(max) = max_chars else {
        return text.to_string();
    };
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max).collect();
    let kept = kept.trim_end();
    let omitted = total - kept.chars().count();
    format!("{}... (truncated {} chars)", kept, omitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MessageContent;
    use crate::ui::recording::{RenderCall, RecordingRenderer};

    fn text(source: &str, text: &str) -> ExchangeEvent {
        ExchangeEvent::Text {
            source: source.to_string(),
            text: text.to_string(),
        }
    }

    fn processor(options: DisplayOptions) -> StreamProcessor {
        StreamProcessor::new(options)
    }

    #[test]
    fn exact_resend_renders_nothing_the_second_time() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "the outline"), &renderer);
        p.handle_event(text("Analyst", "the outline"), &renderer);
        assert_eq!(renderer.contents(), vec!["the outline"]);
    }

    #[test]
    fn prefix_extension_renders_exactly_the_delta() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "AB"), &renderer);
        p.handle_event(text("Analyst", "ABC"), &renderer);
        assert_eq!(renderer.contents(), vec!["AB", "C"]);
    }

    #[test]
    fn divergent_text_renders_whole_new_text() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "first take"), &renderer);
        p.handle_event(text("Analyst", "second take"), &renderer);
        assert_eq!(renderer.contents(), vec!["first take", "second take"]);
    }

    #[test]
    fn whitespace_only_delta_is_dropped() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "done."), &renderer);
        p.handle_event(text("Analyst", "done.  \n"), &renderer);
        assert_eq!(renderer.contents(), vec!["done."]);
    }

    #[test]
    fn secondary_key_drops_full_text_already_seen_this_exchange() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "draft one"), &renderer);
        p.handle_event(text("Analyst", "draft two"), &renderer);
        // Not equal to the last text and not a prefix extension of it, but
        // the (source, length, prefix) key has been seen
        p.handle_event(text("Analyst", "draft one"), &renderer);
        assert_eq!(renderer.contents(), vec!["draft one", "draft two"]);
    }

    #[test]
    fn dedup_state_is_per_source() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_role_banners: false,
            ..DisplayOptions::default()
        });
        p.handle_event(text("Analyst", "shared wording"), &renderer);
        p.handle_event(text("Critic", "shared wording"), &renderer);
        assert_eq!(renderer.contents(), vec!["shared wording", "shared wording"]);
    }

    #[test]
    fn suppressed_source_never_renders_but_state_still_updates() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default().suppress("user"));
        p.handle_event(text("user", "task prompt"), &renderer);
        assert!(renderer.calls().is_empty());

        // State was updated: an identical re-send is an exact duplicate even
        // if suppression were lifted
        p.handle_event(text("user", "task prompt"), &renderer);
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn allow_list_gates_text_rendering() {
        let renderer = RecordingRenderer::default();
        let mut allowed = HashSet::new();
        allowed.insert("Writer".to_string());
        let mut p = processor(DisplayOptions {
            show_role_banners: false,
            allowed_sources: Some(allowed),
            ..DisplayOptions::default()
        });
        p.handle_event(text("Analyst", "hidden"), &renderer);
        p.handle_event(text("Writer", "shown"), &renderer);
        assert_eq!(renderer.contents(), vec!["shown"]);
    }

    #[test]
    fn content_gets_truncated_with_suffix() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default().with_max_chars(10));
        p.handle_event(text("Analyst", "0123456789ABCDEF"), &renderer);
        let contents = renderer.contents();
        assert_eq!(contents.len(), 1);
        assert!(contents[0].starts_with("0123456789"));
        assert!(contents[0].contains("(truncated 6 chars)"));
    }

    #[test]
    fn repeated_tool_call_renders_exactly_once() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_tools: true,
            ..DisplayOptions::default()
        });
        let call = ExchangeEvent::ToolCall {
            source: "Analyst".to_string(),
            name: "web_search".to_string(),
            arguments: r#"{"query":"IVD market"}"#.to_string(),
        };
        p.handle_event(call.clone(), &renderer);
        p.handle_event(call, &renderer);

        let tool_calls: Vec<_> = renderer
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RenderCall::ToolCall { .. }))
            .collect();
        assert_eq!(tool_calls.len(), 1);
    }

    #[test]
    fn same_tool_with_different_arguments_renders_twice() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_tools: true,
            ..DisplayOptions::default()
        });
        for query in ["a", "b"] {
            p.handle_event(
                ExchangeEvent::ToolCall {
                    source: "Analyst".to_string(),
                    name: "web_search".to_string(),
                    arguments: format!(r#"{{"query":"{}"}}"#, query),
                },
                &renderer,
            );
        }
        let tool_calls: Vec<_> = renderer
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RenderCall::ToolCall { .. }))
            .collect();
        assert_eq!(tool_calls.len(), 2);
    }

    #[test]
    fn tool_results_dedup_on_leading_200_chars() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_tools: true,
            ..DisplayOptions::default()
        });
        let shared_prefix = "x".repeat(200);
        p.handle_event(
            ExchangeEvent::ToolResult {
                content: format!("{}alpha", shared_prefix),
            },
            &renderer,
        );
        p.handle_event(
            ExchangeEvent::ToolResult {
                content: format!("{}beta", shared_prefix),
            },
            &renderer,
        );
        let results: Vec<_> = renderer
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RenderCall::ToolResult(_)))
            .collect();
        assert_eq!(results.len(), 1, "same 200-char prefix is one result");
    }

    #[test]
    fn summary_events_are_always_suppressed() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_tools: true,
            ..DisplayOptions::default()
        });
        p.handle_event(
            ExchangeEvent::Summary {
                source: "Analyst".to_string(),
                content: "tool summary".to_string(),
            },
            &renderer,
        );
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn completed_is_captured_not_rendered() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        let mut outcome = ExchangeOutcome::default();
        outcome.push(
            "Writer",
            MessageContent::Text {
                text: "final".to_string(),
            },
        );
        p.handle_event(ExchangeEvent::Completed(outcome), &renderer);
        assert!(renderer.calls().is_empty());
        let captured = p.into_outcome().expect("outcome captured");
        assert_eq!(captured.messages.len(), 1);
    }

    #[test]
    fn banner_fires_once_per_source_switch() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions::default());
        p.handle_event(text("Analyst", "a"), &renderer);
        p.handle_event(text("Analyst", "ab"), &renderer);
        p.handle_event(text("Critic", "c"), &renderer);

        let banners: Vec<_> = renderer
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::RoleBanner(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(banners, vec!["Analyst", "Critic"]);
    }

    #[test]
    fn banners_can_be_disabled_independently_of_content() {
        let renderer = RecordingRenderer::default();
        let mut p = processor(DisplayOptions {
            show_role_banners: false,
            ..DisplayOptions::default()
        });
        p.handle_event(text("Analyst", "visible"), &renderer);
        assert_eq!(renderer.contents(), vec!["visible"]);
        assert!(
            !renderer
                .calls()
                .iter()
                .any(|c| matches!(c, RenderCall::RoleBanner(_)))
        );
    }

    #[tokio::test]
    async fn consume_drains_channel_in_order_and_returns_outcome() {
        let renderer = RecordingRenderer::default();
        let (tx, rx) = mpsc::channel(8);
        tx.send(text("Analyst", "AB")).await.unwrap();
        tx.send(text("Analyst", "ABC")).await.unwrap();
        tx.send(ExchangeEvent::Completed(ExchangeOutcome::default()))
            .await
            .unwrap();
        drop(tx);

        let p = StreamProcessor::new(DisplayOptions::default());
        let outcome = p.consume(rx, &renderer).await;
        assert!(outcome.is_some());
        assert_eq!(renderer.contents(), vec!["AB", "C"]);
    }
}
