//! Output harvest service
//!
//! The engine gives no completion signal, so the harvester polls the output
//! file on a bounded schedule. Whatever the outcome, the output artifact is
//! deleted before returning so the next request never observes a stale
//! result.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::OutputHarvester;
use crate::types::RetryPolicy;

/// Harvester polling the engine's real output file.
pub struct RealOutputHarvester {
    output_path: PathBuf,
    retry: RetryPolicy,
}

impl RealOutputHarvester {
    pub fn new(output_path: PathBuf, retry: RetryPolicy) -> Self {
        Self { output_path, retry }
    }
}

#[async_trait]
impl OutputHarvester for RealOutputHarvester {
    async fn harvest(&self) -> PipelineResult<String> {
        let result = self.retry.run(|| fs::read_to_string(&self.output_path)).await;

        // Unconditional cleanup, success or exhaustion.
        match fs::remove_file(&self.output_path).await {
            Ok(()) => tracing::debug!("removed engine output {}", self.output_path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("cannot remove engine output: {}", e),
        }

        result.map_err(|e| PipelineError::Harvest { cause: e.to_string() })
    }
}
