//! Rendering seam between the pipeline and the terminal.
//!
//! The pipeline and the stream processor never touch the console directly;
//! they call through an injected [`Renderer`]. The production implementation
//! is [`console_ui::ConsoleRenderer`].

pub mod console_ui;
pub mod icons;

pub use console_ui::ConsoleRenderer;

/// Discrete render calls consumed by no one — the core fires them and moves
/// on. Implementations must tolerate being called from a spawned consumer
/// task, hence `Send + Sync`.
pub trait Renderer: Send + Sync {
    /// Banner shown when the streaming source switches to a new role.
    fn role_banner(&self, role: &str);

    /// A block of role text (already deduplicated and truncated).
    fn content(&self, text: &str);

    /// A tool invocation with its serialized arguments.
    fn tool_call(&self, name: &str, arguments: &str);

    /// A tool's returned output.
    fn tool_result(&self, content: &str);

    /// Progress banner at the start of a pipeline stage.
    fn phase_header(&self, index: usize, total: usize, title: &str);

    /// Short live status line (spinner message).
    fn status(&self, msg: &str);

    /// Plain informational line outside any stage block.
    fn note(&self, msg: &str);

    fn warning(&self, msg: &str);

    fn success(&self, msg: &str);
}
