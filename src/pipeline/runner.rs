//! Pipeline controller.
//!
//! Owns the stage walk: each stage runs one or more Exchanges through the
//! completion seam, extracts the producing role's final message, and
//! threads it into the next stage's prompt. Ends by rendering and saving
//! the strategy document.

use std::path::PathBuf;
use std::sync::Arc;

use super::drive_exchange;
use super::gate::{self, GateOutcome};
use super::interject::OperatorInput;
use super::stage::Stage;
use super::state::PipelineState;
use crate::completion::CompletionService;
use crate::config::Config;
use crate::document::{render_final, save_strategy};
use crate::errors::PipelineError;
use crate::exchange::extract_last;
use crate::prompts;
use crate::roles::{self, NEEDS_CLARIFICATION_MARKER};
use crate::ui::Renderer;

pub struct StrategyPipeline {
    config: Config,
    service: Arc<dyn CompletionService>,
    renderer: Arc<dyn Renderer>,
    operator: Box<dyn OperatorInput>,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub document: String,
    pub saved_to: PathBuf,
    pub outline_approved: bool,
    /// Gate rounds spent before approval or exhaustion.
    pub outline_rounds: u32,
}

impl StrategyPipeline {
    pub fn new(
        config: Config,
        service: Arc<dyn CompletionService>,
        renderer: Arc<dyn Renderer>,
        operator: Box<dyn OperatorInput>,
    ) -> Self {
        Self {
            config,
            service,
            renderer,
            operator,
        }
    }

    /// Run all five stages for `scenario` and save the resulting document.
    pub async fn run(&mut self, scenario: &str) -> Result<PipelineOutcome, PipelineError> {
        let mut state = PipelineState::default();

        while let Some(stage) = state.current_stage() {
            self.renderer
                .phase_header(state.position(), Stage::ALL.len(), stage.title());

            match stage {
                Stage::Clarify => self.clarify(scenario, &mut state).await?,
                Stage::OutlineAlign => {
                    let GateOutcome {
                        outline,
                        approved,
                        rounds,
                    } = gate::align_outline(
                        self.service.as_ref(),
                        &self.renderer,
                        scenario,
                        &state.additional_info,
                    )
                    .await?;
                    state.record("outline", outline);
                    state.outline_approved = approved;
                    state.outline_rounds = rounds;
                }
                Stage::Analyze => self.analyze(scenario, &mut state).await?,
                Stage::Review => self.review(&mut state).await?,
                Stage::Assemble => self.assemble(scenario, &mut state).await?,
            }

            self.renderer.success(&format!("{} complete", stage.title()));
            state.advance();
        }

        let document = state.artifact("document").to_string();
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| {
            PipelineError::DocumentWrite {
                path: self.config.output_dir.clone(),
                source,
            }
        })?;
        let saved_to = save_strategy(&self.config.output_dir, &document)?;
        tracing::info!(path = %saved_to.display(), "strategy document saved");

        Ok(PipelineOutcome {
            document,
            saved_to,
            outline_approved: state.outline_approved,
            outline_rounds: state.outline_rounds,
        })
    }

    async fn clarify(&mut self, scenario: &str, state: &mut PipelineState) -> Result<(), PipelineError> {
        let clarifier = roles::clarifier();
        let outcome = drive_exchange(
            self.service.as_ref(),
            &self.renderer,
            Stage::Clarify.display_options(),
            &clarifier,
            &prompts::clarification_prompt(scenario),
            Stage::Clarify.max_turns(),
        )
        .await?;
        let response = extract_last(
            &outcome,
            clarifier.name,
            "Clarifier produced no output; using the last message instead",
            self.renderer.as_ref(),
        );

        if response.contains(NEEDS_CLARIFICATION_MARKER) {
            self.renderer.note(&response);
            self.renderer.status(
                "Answer the questions above, then finish with a line containing only END",
            );
            let answer = self.operator.read_block().await?;
            if answer.is_empty() {
                self.renderer.note("No additional details provided; continuing as-is");
            }
            state.additional_info = answer;
        } else {
            self.renderer.note("Scenario is sufficient; no clarification needed");
        }
        state.record("clarification", response);
        Ok(())
    }

    async fn analyze(&mut self, scenario: &str, state: &mut PipelineState) -> Result<(), PipelineError> {
        let analyst = roles::analyst();
        let task = prompts::analysis_prompt(scenario, &state.additional_info, state.artifact("outline"));
        let outcome = drive_exchange(
            self.service.as_ref(),
            &self.renderer,
            Stage::Analyze.display_options(),
            &analyst,
            &task,
            Stage::Analyze.max_turns(),
        )
        .await?;
        let analysis = extract_last(
            &outcome,
            analyst.name,
            "Analyst produced no analysis; using the last message instead",
            self.renderer.as_ref(),
        );
        state.record("analysis", analysis);
        Ok(())
    }

    async fn review(&mut self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let critic = roles::critic();
        let task = prompts::review_prompt(state.artifact("analysis"));
        let outcome = drive_exchange(
            self.service.as_ref(),
            &self.renderer,
            Stage::Review.display_options(),
            &critic,
            &task,
            Stage::Review.max_turns(),
        )
        .await?;
        let review = extract_last(
            &outcome,
            critic.name,
            "Critic produced no review; using the last message instead",
            self.renderer.as_ref(),
        );
        state.record("review", review);
        Ok(())
    }

    async fn assemble(&mut self, scenario: &str, state: &mut PipelineState) -> Result<(), PipelineError> {
        let writer = roles::writer();
        let task = prompts::writing_prompt(
            scenario,
            &state.additional_info,
            state.artifact("analysis"),
            state.artifact("review"),
        );
        let outcome = drive_exchange(
            self.service.as_ref(),
            &self.renderer,
            Stage::Assemble.display_options(),
            &writer,
            &task,
            Stage::Assemble.max_turns(),
        )
        .await?;
        let raw = extract_last(
            &outcome,
            writer.name,
            "Writer produced no document; using the last message instead",
            self.renderer.as_ref(),
        );
        state.record("document", render_final(&raw));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::scripted::{ScriptedCompletion, ScriptedExchange};
    use crate::ui::recording::{RecordingRenderer, RenderCall};

    struct ScriptedOperator {
        answer: String,
        reads: u32,
    }

    impl ScriptedOperator {
        fn new(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                reads: 0,
            }
        }
    }

    #[async_trait::async_trait]
    impl OperatorInput for ScriptedOperator {
        async fn read_block(&mut self) -> Result<String, PipelineError> {
            self.reads += 1;
            Ok(self.answer.clone())
        }
    }

    fn test_config(output_dir: &std::path::Path) -> Config {
        Config {
            api_key: "sk-test".to_string(),
            base_url: "https://api.example/v1".to_string(),
            model: "test-model".to_string(),
            output_dir: output_dir.to_path_buf(),
            verbose: false,
        }
    }

    fn pipeline_with(
        output_dir: &std::path::Path,
        script: Vec<ScriptedExchange>,
        operator_answer: &str,
    ) -> (StrategyPipeline, Arc<ScriptedCompletion>, Arc<RecordingRenderer>) {
        let service = Arc::new(ScriptedCompletion::new(script));
        let recording = Arc::new(RecordingRenderer::default());
        let pipeline = StrategyPipeline::new(
            test_config(output_dir),
            service.clone(),
            recording.clone(),
            Box::new(ScriptedOperator::new(operator_answer)),
        );
        (pipeline, service, recording)
    }

    fn happy_script() -> Vec<ScriptedExchange> {
        vec![
            ScriptedExchange::text("Clarifier", "[SUFFICIENT] No clarification needed."),
            ScriptedExchange::text("Analyst", "- industry pains\n- audience pains\n- competitors"),
            ScriptedExchange::text("Critic", "[APPROVED]"),
            ScriptedExchange::text("Analyst", "Full analysis: SEA SaaS market grows 20% YoY."),
            ScriptedExchange::text("Critic", "Cite the 20% figure; otherwise sound."),
            ScriptedExchange::text("Writer", "# Topic Strategy\n\nFinal document body."),
        ]
    }

    #[tokio::test]
    async fn test_full_run_threads_artifacts_forward() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, service, _) = pipeline_with(dir.path(), happy_script(), "");

        let outcome = pipeline.run("B2B SaaS expanding to SEA").await.unwrap();
        assert!(outcome.outline_approved);
        assert_eq!(outcome.outline_rounds, 1);
        assert_eq!(outcome.document, "# Topic Strategy\n\nFinal document body.");
        assert!(outcome.saved_to.exists());
        assert_eq!(
            std::fs::read_to_string(&outcome.saved_to).unwrap(),
            outcome.document
        );

        let tasks = service.tasks();
        assert_eq!(tasks.len(), 6);
        // Analysis sees the approved outline
        assert!(tasks[3].contains("- industry pains"));
        // Review sees the analysis
        assert!(tasks[4].contains("SEA SaaS market grows 20% YoY"));
        // Writing sees both analysis and review findings
        assert!(tasks[5].contains("SEA SaaS market grows 20% YoY"));
        assert!(tasks[5].contains("Cite the 20% figure"));
    }

    #[tokio::test]
    async fn test_every_stage_announces_and_completes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _, recording) = pipeline_with(dir.path(), happy_script(), "");
        pipeline.run("scenario").await.unwrap();

        let headers: Vec<(usize, String)> = recording
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::PhaseHeader { index, total, title } => {
                    assert_eq!(total, 5);
                    Some((index, title))
                }
                _ => None,
            })
            .collect();
        assert_eq!(headers.len(), 5);
        assert_eq!(headers[0], (1, "Scenario Clarification".to_string()));
        assert_eq!(headers[4], (5, "Document Assembly".to_string()));

        let successes = recording
            .calls()
            .iter()
            .filter(|c| matches!(c, RenderCall::Success(_)))
            .count();
        assert_eq!(successes, 5);
    }

    #[tokio::test]
    async fn test_clarification_answer_reaches_later_prompts() {
        let mut script = happy_script();
        script[0] = ScriptedExchange::text(
            "Clarifier",
            "[NEEDS CLARIFICATION]\n1. Who is the target customer?\n2. Which region?",
        );
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, service, _) =
            pipeline_with(dir.path(), script, "target: SMB\nregion: SEA");

        pipeline.run("scenario").await.unwrap();

        let tasks = service.tasks();
        // Outline, analysis, and writing prompts all carry the answers
        for i in [1, 3, 5] {
            assert!(
                tasks[i].contains("OPERATOR CLARIFICATIONS"),
                "task {i} missing clarifications section"
            );
            assert!(tasks[i].contains("target: SMB\nregion: SEA"));
        }
    }

    #[tokio::test]
    async fn test_sufficient_scenario_skips_the_operator() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(ScriptedCompletion::new(happy_script()));
        let recording = Arc::new(RecordingRenderer::default());
        let operator = ScriptedOperator::new("should never be read");
        let mut pipeline = StrategyPipeline::new(
            test_config(dir.path()),
            service,
            recording.clone(),
            Box::new(operator),
        );

        pipeline.run("scenario").await.unwrap();
        let noted = recording.calls().iter().any(|c| {
            matches!(c, RenderCall::Note(msg) if msg.contains("no clarification needed"))
        });
        assert!(noted);
    }

    #[tokio::test]
    async fn test_unapproved_outline_still_completes() {
        let script = vec![
            ScriptedExchange::text("Clarifier", "[SUFFICIENT]"),
            ScriptedExchange::text("Analyst", "draft one"),
            ScriptedExchange::text("Critic", "Reject: too thin."),
            ScriptedExchange::text("Analyst", "draft two"),
            ScriptedExchange::text("Critic", "Reject again."),
            ScriptedExchange::text("Analyst", "Analysis built on draft two."),
            ScriptedExchange::text("Critic", "Review findings."),
            ScriptedExchange::text("Writer", "# Document"),
        ];
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, service, recording) = pipeline_with(dir.path(), script, "");

        let outcome = pipeline.run("scenario").await.unwrap();
        assert!(!outcome.outline_approved);
        assert_eq!(outcome.outline_rounds, 2);
        assert!(outcome.saved_to.exists());

        // The analysis stage received the exhausted gate's last draft
        let tasks = service.tasks();
        assert!(tasks[5].contains("draft two"));
        assert!(
            recording
                .calls()
                .iter()
                .any(|c| matches!(c, RenderCall::Warning(_)))
        );
    }

    #[tokio::test]
    async fn test_typed_writer_output_is_rendered() {
        let json = serde_json::json!({
            "title": "SEA Expansion Strategy",
            "generated_at": "2026-08-30 10:00",
            "business_scenario": "B2B SaaS",
            "target_audience": "Exporters",
            "pain_points": ["visibility"],
            "decision_factors": ["price"],
            "core_topics": [],
            "secondary_topics": [],
            "longtail_topics": [],
            "priority_criteria": [],
            "priority_ranking": [],
            "templates": [],
            "execution": {"timeline": [], "resources": [], "kpis": []},
            "notes": []
        });
        let mut script = happy_script();
        script[5] = ScriptedExchange::text("Writer", &format!("```json\n{json}\n```"));
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _, _) = pipeline_with(dir.path(), script, "");

        let outcome = pipeline.run("scenario").await.unwrap();
        assert!(outcome.document.starts_with("# SEA Expansion Strategy"));
        assert!(outcome.document.contains("## 6. Execution Plan"));
    }

    #[tokio::test]
    async fn test_completion_failure_surfaces_as_pipeline_error() {
        // Script exhausts after the clarifier
        let script = vec![ScriptedExchange::text("Clarifier", "[SUFFICIENT]")];
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _, _) = pipeline_with(dir.path(), script, "");

        let err = pipeline.run("scenario").await.unwrap_err();
        assert!(matches!(err, PipelineError::Completion(_)));
    }
}
