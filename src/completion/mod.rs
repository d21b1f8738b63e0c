//! Completion-service seam.
//!
//! The pipeline talks to language models only through [`CompletionService`]:
//! give it a role descriptor, a task prompt, a max-turn bound, and an event
//! sink; get back the Exchange's terminal outcome. The production adapter
//! for OpenAI-compatible endpoints lives in [`openai`].
//!
//! Transient-failure retry is deliberately *not* implemented at this seam;
//! it belongs to the service behind it.

pub mod openai;

pub use openai::OpenAiCompletion;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::CompletionError;
use crate::exchange::ExchangeOutcome;
use crate::roles::RoleSpec;
use crate::stream::ExchangeEvent;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one bounded Exchange for `role` around `task`.
    ///
    /// Events are emitted through `events` strictly in emission order,
    /// ending with [`ExchangeEvent::Completed`]; the same outcome is also
    /// returned. `max_turns` bounds model turns (1 for single-shot roles,
    /// higher to allow tool round-trips).
    async fn run_exchange(
        &self,
        role: &RoleSpec,
        task: &str,
        max_turns: u32,
        events: mpsc::Sender<ExchangeEvent>,
    ) -> Result<ExchangeOutcome, CompletionError>;
}
