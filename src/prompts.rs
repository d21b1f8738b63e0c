//! Per-stage task prompt builders.
//!
//! Each builder is a pure function of the accumulated artifacts — no I/O,
//! no state. The controller threads each stage's extracted output into the
//! next builder.

/// Stage 1: ask the Clarifier to probe the scenario for gaps.
pub fn clarification_prompt(scenario: &str) -> String {
    format!(
        "Review this business scenario and decide whether clarification is needed \
         before strategy work can start.\n\n## BUSINESS SCENARIO\n{}",
        scenario
    )
}

/// Outline gate, proposing side: the Analyst drafts a search outline.
/// `feedback` carries the Critic's cumulative objections from earlier
/// rounds; empty on round one.
pub fn outline_prompt(scenario: &str, additional_info: &str, feedback: &str) -> String {
    let mut prompt = format!(
        "Draft a search outline for researching this scenario: the concrete angles \
         you will search to cover industry pain points, audience pain points, and \
         competitor behavior.\n\n## BUSINESS SCENARIO\n{}",
        scenario
    );
    if !additional_info.is_empty() {
        prompt.push_str(&format!("\n\n## OPERATOR CLARIFICATIONS\n{}", additional_info));
    }
    if !feedback.is_empty() {
        prompt.push_str(&format!(
            "\n\n## REVIEWER FEEDBACK ON YOUR PREVIOUS OUTLINE\n{}\n\nRevise the outline to address every point.",
            feedback
        ));
    }
    prompt
}

/// Outline gate, reviewing side: the Critic passes or rejects the outline.
pub fn outline_review_prompt(outline: &str) -> String {
    format!(
        "Review this search outline. If it adequately covers industry pain points, \
         audience pain points, and competitor behavior, reply with the approval \
         marker. Otherwise list required corrections.\n\n## SEARCH OUTLINE\n{}",
        outline
    )
}

/// Stage 3: full business analysis against the approved outline.
pub fn analysis_prompt(scenario: &str, additional_info: &str, outline: &str) -> String {
    let mut prompt = format!(
        "Produce the full business analysis for this scenario. Work through the \
         search outline below, using your tools to ground market claims.\n\n\
         ## BUSINESS SCENARIO\n{}",
        scenario
    );
    if !additional_info.is_empty() {
        prompt.push_str(&format!("\n\n## OPERATOR CLARIFICATIONS\n{}", additional_info));
    }
    prompt.push_str(&format!("\n\n## SEARCH OUTLINE\n{}", outline));
    prompt
}

/// Stage 4: the Critic audits the full analysis.
pub fn review_prompt(analysis: &str) -> String {
    format!(
        "Audit this analysis for unsupported claims, stale data, and blind spots. \
         Verify doubtful figures with your tools. List concrete corrections the \
         writer must incorporate.\n\n## ANALYSIS\n{}",
        analysis
    )
}

/// Stage 5: the Writer assembles the final strategy document.
pub fn writing_prompt(
    scenario: &str,
    additional_info: &str,
    analysis: &str,
    review: &str,
) -> String {
    let mut prompt = format!(
        "Assemble the final topic-strategy document.\n\n## BUSINESS SCENARIO\n{}",
        scenario
    );
    if !additional_info.is_empty() {
        prompt.push_str(&format!("\n\n## OPERATOR CLARIFICATIONS\n{}", additional_info));
    }
    prompt.push_str(&format!(
        "\n\n## ANALYSIS\n{}\n\n## REVIEW FINDINGS\n{}\n\nIncorporate every review \
         correction. Output the complete document.",
        analysis, review
    ));
    prompt
}
