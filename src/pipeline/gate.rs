//! Outline alignment gate.
//!
//! The Analyst proposes a search outline and the Critic passes judgment.
//! A rejection feeds the Critic's objections back into the next proposal.
//! The loop is hard-bounded: after [`MAX_OUTLINE_ROUNDS`] rejections the
//! pipeline warns and proceeds with the last draft rather than stalling.

use std::sync::Arc;

use super::drive_exchange;
use super::stage::Stage;
use crate::completion::CompletionService;
use crate::errors::PipelineError;
use crate::exchange::extract_last;
use crate::prompts;
use crate::roles::{self, APPROVAL_MARKER};
use crate::ui::Renderer;

pub const MAX_OUTLINE_ROUNDS: u32 = 2;

#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub outline: String,
    pub approved: bool,
    pub rounds: u32,
}

/// Run the propose/review loop until approval or round exhaustion.
///
/// Approval is a literal substring check for [`APPROVAL_MARKER`] in the
/// Critic's verdict. Feedback accumulates across rounds so a revised
/// outline answers every objection raised so far.
pub async fn align_outline(
    service: &dyn CompletionService,
    renderer: &Arc<dyn Renderer>,
    scenario: &str,
    additional_info: &str,
) -> Result<GateOutcome, PipelineError> {
    let analyst = roles::analyst();
    let critic = roles::critic();

    let mut feedback = String::new();
    let mut outline = String::new();

    for round in 1..=MAX_OUTLINE_ROUNDS {
        renderer.status(&format!("Outline round {round}/{MAX_OUTLINE_ROUNDS}"));

        let task = prompts::outline_prompt(scenario, additional_info, &feedback);
        let outcome = drive_exchange(
            service,
            renderer,
            Stage::OutlineAlign.display_options(),
            &analyst,
            &task,
            Stage::OutlineAlign.max_turns(),
        )
        .await?;
        outline = extract_last(
            &outcome,
            analyst.name,
            "Analyst produced no outline; using the last message instead",
            renderer.as_ref(),
        );

        let review_task = prompts::outline_review_prompt(&outline);
        let review_outcome = drive_exchange(
            service,
            renderer,
            Stage::gate_review_options(),
            &critic,
            &review_task,
            1,
        )
        .await?;
        let verdict = extract_last(
            &review_outcome,
            critic.name,
            "Critic produced no verdict; using the last message instead",
            renderer.as_ref(),
        );

        if verdict.contains(APPROVAL_MARKER) {
            renderer.note(&format!("Outline approved in round {round}"));
            return Ok(GateOutcome {
                outline,
                approved: true,
                rounds: round,
            });
        }

        if feedback.is_empty() {
            feedback = verdict;
        } else {
            feedback.push_str("\n\n");
            feedback.push_str(&verdict);
        }
    }

    renderer.warning(&format!(
        "Outline not approved after {MAX_OUTLINE_ROUNDS} rounds; proceeding with the last draft"
    ));
    Ok(GateOutcome {
        outline,
        approved: false,
        rounds: MAX_OUTLINE_ROUNDS,
    })
}
