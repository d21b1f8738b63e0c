//! Accumulated pipeline state.

use std::collections::BTreeMap;

use super::stage::Stage;

/// Artifacts and position accumulated while the pipeline runs. The stage
/// index only moves forward; artifacts are write-once per stage.
#[derive(Debug, Default)]
pub struct PipelineState {
    stage_index: usize,
    artifacts: BTreeMap<&'static str, String>,
    pub additional_info: String,
    pub outline_approved: bool,
    pub outline_rounds: u32,
}

impl PipelineState {
    /// The stage about to run, or `None` once all stages have finished.
    pub fn current_stage(&self) -> Option<Stage> {
        Stage::ALL.get(self.stage_index).copied()
    }

    /// One-based position for progress display.
    pub fn position(&self) -> usize {
        self.stage_index + 1
    }

    pub fn advance(&mut self) {
        self.stage_index += 1;
    }

    pub fn record(&mut self, key: &'static str, value: String) {
        self.artifacts.insert(key, value);
    }

    pub fn artifact(&self, key: &str) -> &str {
        self.artifacts.get(key).map(String::as_str).unwrap_or("")
    }
}
