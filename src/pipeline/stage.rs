//! The fixed stage sequence and each stage's display policy.

use crate::stream::processor::DisplayOptions;

/// Pipeline stages, in execution order. The controller advances through
/// [`Stage::ALL`] monotonically; no stage repeats and none is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clarify,
    OutlineAlign,
    Analyze,
    Review,
    Assemble,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Clarify,
        Stage::OutlineAlign,
        Stage::Analyze,
        Stage::Review,
        Stage::Assemble,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Clarify => "Scenario Clarification",
            Stage::OutlineAlign => "Outline Alignment",
            Stage::Analyze => "Business Analysis",
            Stage::Review => "Quality Review",
            Stage::Assemble => "Document Assembly",
        }
    }

    /// Model-turn bound for one Exchange in this stage. Tool-using stages
    /// get room for tool round-trips; single-shot stages get one turn.
    pub fn max_turns(&self) -> u32 {
        match self {
            Stage::Clarify | Stage::OutlineAlign | Stage::Assemble => 1,
            Stage::Analyze | Stage::Review => 3,
        }
    }

    /// What the stream processor may show while this stage runs. Echoed
    /// task prompts (source "user") are always hidden.
    pub fn display_options(&self) -> DisplayOptions {
        let base = DisplayOptions::default().suppress("user");
        match self {
            // Banner announces the role; the questions themselves are
            // re-rendered as a block before the operator prompt, so the
            // live text stream stays quiet.
            Stage::Clarify => DisplayOptions {
                show_content: false,
                ..base
            },
            Stage::OutlineAlign => base.with_max_chars(400),
            Stage::Analyze | Stage::Review => DisplayOptions {
                show_tools: true,
                ..base.with_max_chars(200)
            },
            Stage::Assemble => base,
        }
    }

    /// Display policy for the Critic's side of the outline gate.
    pub fn gate_review_options() -> DisplayOptions {
        DisplayOptions::default().suppress("user").with_max_chars(300)
    }
}
