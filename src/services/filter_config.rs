//! Filter and codec configuration staging
//!
//! Installs the test filter into the engine's hot-reloaded configuration
//! file and, when an input codec is requested, splices the codec directive
//! into the input-stage template. Both operations hand back artifacts whose
//! release restores the engine to its neutral baseline.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::config::{CODEC_PLACEHOLDER, NEUTRAL_FILTER};
use crate::error::{PipelineError, PipelineResult};
use crate::traits::FilterConfigStore;
use crate::types::{StagedCodec, StagedFilter};

/// Configuration store backed by the engine's real configuration files.
pub struct RealFilterConfigStore {
    filter_path: PathBuf,
    codec_path: Option<PathBuf>,
}

impl RealFilterConfigStore {
    pub fn new(filter_path: PathBuf, codec_path: Option<PathBuf>) -> Self {
        Self { filter_path, codec_path }
    }
}

#[async_trait]
impl FilterConfigStore for RealFilterConfigStore {
    async fn stage_filter(&self, filter: &str) -> PipelineResult<StagedFilter> {
        fs::write(&self.filter_path, filter)
            .await
            .map_err(|e| PipelineError::FilterStaging { cause: e.to_string() })?;

        tracing::debug!("installed test filter at {}", self.filter_path.display());
        Ok(StagedFilter)
    }

    async fn stage_codec(&self, codec: &str) -> PipelineResult<StagedCodec> {
        let path = self.codec_path.as_ref().ok_or_else(|| PipelineError::Configuration {
            message: "no input-stage configuration file configured".to_string(),
        })?;

        let template = fs::read_to_string(path).await.map_err(|e| PipelineError::CodecStaging {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        let directive = format!("codec => {}", codec);
        let spliced = template.replacen(CODEC_PLACEHOLDER, &directive, 1);

        fs::write(path, &spliced).await.map_err(|e| PipelineError::CodecStaging {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;

        tracing::debug!("spliced codec directive into {}", path.display());
        Ok(StagedCodec { backup: template })
    }

    async fn release_filter(&self, _staged: StagedFilter) -> PipelineResult<()> {
        fs::write(&self.filter_path, NEUTRAL_FILTER).await?;
        tracing::debug!("restored neutral filter at {}", self.filter_path.display());
        Ok(())
    }

    async fn release_codec(&self, staged: StagedCodec) -> PipelineResult<()> {
        if let Some(path) = self.codec_path.as_ref() {
            fs::write(path, &staged.backup).await?;
            tracing::debug!("restored input-stage configuration at {}", path.display());
        }
        Ok(())
    }
}
