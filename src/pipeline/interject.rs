//! Operator interjection.
//!
//! When the Clarifier asks for more information the pipeline pauses and
//! reads a multi-line answer block from the operator, terminated by a line
//! that is exactly `END` (any case, surrounding whitespace ignored).

use async_trait::async_trait;
use std::io::BufRead;

use crate::errors::PipelineError;

/// Source of operator answers. Production reads stdin; tests substitute a
/// canned reader.
#[async_trait]
pub trait OperatorInput: Send {
    /// Read one multi-line block, up to but not including the `END` line.
    ///
    /// The read is a suspension point: the blocking I/O must happen off the
    /// caller's task so a process-level interrupt can preempt it.
    async fn read_block(&mut self) -> Result<String, PipelineError>;
}

pub struct StdinOperator;

#[async_trait]
impl OperatorInput for StdinOperator {
    async fn read_block(&mut self) -> Result<String, PipelineError> {
        // Stdin blocks until the operator types; run it on the blocking
        // pool so the awaiting task stays cancellable
        tokio::task::spawn_blocking(|| {
            let stdin = std::io::stdin();
            collect_lines(stdin.lock())
        })
        .await
        .map_err(|e| PipelineError::OperatorRead(std::io::Error::other(e)))?
    }
}

/// Accumulate lines until the terminator. EOF before `END` ends the block
/// with whatever was read; the result is trimmed as a whole so a lone
/// `END` yields an empty answer.
pub fn collect_lines<R: BufRead>(reader: R) -> Result<String, PipelineError> {
    let mut collected = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().eq_ignore_ascii_case("end") {
            break;
        }
        collected.push(line);
    }
    Ok(collected.join("\n").trim().to_string())
}
