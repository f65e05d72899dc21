//! Service trait definitions for dependency injection
//!
//! All engine-facing I/O is abstracted through these traits so the
//! orchestrator can be tested against mocks.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::types::{StagedCodec, StagedFilter, StagedPatterns};

/// Staging of custom pattern definitions into the engine's pattern
/// resolution path.
#[mockall::automock]
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Directory the engine resolves patterns from; alias tokens in the
    /// filter text are rewritten to this path.
    fn canonical_dir(&self) -> PathBuf;

    /// Write the pattern definitions into the canonical directory.
    async fn stage(&self, patterns: &str) -> PipelineResult<StagedPatterns>;

    /// Remove a previously staged pattern file.
    async fn release(&self, staged: StagedPatterns) -> PipelineResult<()>;
}

/// Installation and restoration of the engine's live configuration files.
#[mockall::automock]
#[async_trait]
pub trait FilterConfigStore: Send + Sync {
    /// Overwrite the engine's filter configuration with the test filter.
    async fn stage_filter(&self, filter: &str) -> PipelineResult<StagedFilter>;

    /// Splice a codec directive into the input-stage configuration.
    async fn stage_codec(&self, codec: &str) -> PipelineResult<StagedCodec>;

    /// Restore the neutral pass-through filter.
    async fn release_filter(&self, staged: StagedFilter) -> PipelineResult<()>;

    /// Restore the input-stage configuration from its backup.
    async fn release_codec(&self, staged: StagedCodec) -> PipelineResult<()>;
}

/// Delivery of the test message to the engine's network input listener.
#[mockall::automock]
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Send the message, one datagram per line, with bounded retry.
    async fn dispatch(&self, message: &str) -> PipelineResult<()>;
}

/// Retrieval of the engine's asynchronously emitted result.
#[mockall::automock]
#[async_trait]
pub trait OutputHarvester: Send + Sync {
    /// Poll the output artifact until content appears or the budget is
    /// exhausted; the artifact is deleted on every exit path.
    async fn harvest(&self) -> PipelineResult<String>;
}
