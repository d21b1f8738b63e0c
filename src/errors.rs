//! Typed error hierarchy for the topicsmith pipeline.
//!
//! Two top-level enums cover the two subsystems:
//! - `CompletionError` — completion-service adapter failures
//! - `PipelineError` — pipeline controller failures
//!
//! Conditions the pipeline recovers from locally (a role producing no
//! message, the outline gate exhausting its rounds, a malformed stream
//! event) are deliberately *not* errors: they surface as renderer warnings
//! and the run continues.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the completion-service adapter.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Errors from a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Failed to read operator input: {0}")]
    OperatorRead(#[from] std::io::Error),

    #[error("Failed to write strategy document at {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run cancelled by operator")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_api_carries_status_and_body() {
        let err = CompletionError::Api {
            status: 429,
            body: "rate limited".to_string(),
        };
        match &err {
            CompletionError::Api { status, body } => {
                assert_eq!(*status, 429);
                assert_eq!(body, "rate limited");
            }
            _ => panic!("Expected Api variant"),
        }
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn pipeline_error_converts_from_completion_error() {
        let inner = CompletionError::MalformedResponse("not json".to_string());
        let err: PipelineError = inner.into();
        match &err {
            PipelineError::Completion(CompletionError::MalformedResponse(msg)) => {
                assert_eq!(msg, "not json");
            }
            _ => panic!("Expected PipelineError::Completion(MalformedResponse(...))"),
        }
    }

    #[test]
    fn document_write_error_carries_path() {
        let path = PathBuf::from("/output/strategy.md");
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PipelineError::DocumentWrite {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            PipelineError::DocumentWrite { path: p, source: s } => {
                assert_eq!(p, &path);
                assert_eq!(s.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected DocumentWrite"),
        }
    }

    #[test]
    fn cancelled_is_matchable() {
        let err = PipelineError::Cancelled;
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        let completion_err = CompletionError::MalformedResponse("x".into());
        assert_std_error(&completion_err);
        let pipeline_err = PipelineError::Cancelled;
        assert_std_error(&pipeline_err);
    }
}
