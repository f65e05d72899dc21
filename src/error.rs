//! Pipeline test orchestration error types

use thiserror::Error;

/// Every failure a pipeline test run can surface to the caller.
///
/// Error display strings are the exact texts placed into the JSON error
/// payload, so they stay human-readable cause chains rather than codes.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Empty filter")]
    EmptyFilter,

    #[error("Empty message")]
    EmptyMessage,

    #[error("Cannot write patterns file: {cause}")]
    PatternStaging { cause: String },

    #[error("Cannot write filter: {cause}")]
    FilterStaging { cause: String },

    #[error("Cannot write file {path}: {cause}")]
    CodecStaging { path: String, cause: String },

    #[error("Cannot send message to {target}: {cause}")]
    Dispatch { target: String, cause: String },

    #[error("Cannot read output: {cause}")]
    Harvest { cause: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// True for failures rejected before any engine state was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidRequest { .. } | PipelineError::EmptyFilter | PipelineError::EmptyMessage
        )
    }
}
