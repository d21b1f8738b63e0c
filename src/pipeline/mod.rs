//! Sequential strategy pipeline.
//!
//! Five fixed stages run in order: scenario clarification (with an
//! operator interjection when the Clarifier asks for more), the bounded
//! outline alignment gate between Analyst and Critic, the full analysis,
//! the quality review, and final document assembly.

pub mod gate;
pub mod interject;
pub mod runner;
pub mod stage;
pub mod state;

pub use runner::{PipelineOutcome, StrategyPipeline};

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::completion::CompletionService;
use crate::errors::PipelineError;
use crate::exchange::ExchangeOutcome;
use crate::roles::RoleSpec;
use crate::stream::processor::{DisplayOptions, StreamProcessor};
use crate::ui::Renderer;

/// Run one Exchange end to end: spawn the single stream consumer, run the
/// completion, then wait for the consumer to drain the channel so every
/// event is rendered before the stage moves on.
pub(crate) async fn drive_exchange(
    service: &dyn CompletionService,
    renderer: &Arc<dyn Renderer>,
    options: DisplayOptions,
    role: &RoleSpec,
    task: &str,
    max_turns: u32,
) -> Result<ExchangeOutcome, PipelineError> {
    let (tx, rx) = mpsc::channel(64);
    let processor = StreamProcessor::new(options);
    let render = Arc::clone(renderer);
    let consumer = tokio::spawn(async move { processor.consume(rx, render.as_ref()).await });

    let outcome = service.run_exchange(role, task, max_turns, tx).await?;
    consumer.await.ok();
    Ok(outcome)
}
