//! Pattern staging service
//!
//! Makes caller-supplied pattern definitions discoverable to the engine's
//! pattern resolver: alias tokens in the filter text are rewritten to the
//! canonical patterns directory, and the definitions themselves are written
//! under a short random file name for the duration of one request.

use std::path::PathBuf;

use async_trait::async_trait;
use rand::Rng;
use tokio::fs;

use crate::config::PATTERNS_FILE_NAME_LENGTH;
use crate::error::{PipelineError, PipelineResult};
use crate::traits::PatternStore;
use crate::types::StagedPatterns;

/// Substitute every alias token in `filter` with the canonical patterns
/// directory path.
///
/// Literal whole-text replacement, order-independent across aliases.
/// Unmatched aliases are left alone on purpose: a filter may reference
/// several external directories of which only some are test-local.
pub fn rewrite_aliases(filter: &str, aliases: &[String], canonical_dir: &str) -> String {
    let mut rewritten = filter.to_string();
    for alias in aliases {
        if alias.is_empty() {
            continue;
        }
        rewritten = rewritten.replace(alias.as_str(), canonical_dir);
    }
    rewritten
}

/// Pattern store backed by the engine's real patterns directory.
pub struct RealPatternStore {
    patterns_dir: PathBuf,
}

impl RealPatternStore {
    pub fn new(patterns_dir: PathBuf) -> Self {
        Self { patterns_dir }
    }

    fn random_file_name(length: usize) -> String {
        const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
            .collect()
    }
}

#[async_trait]
impl PatternStore for RealPatternStore {
    fn canonical_dir(&self) -> PathBuf {
        self.patterns_dir.clone()
    }

    async fn stage(&self, patterns: &str) -> PipelineResult<StagedPatterns> {
        fs::create_dir_all(&self.patterns_dir)
            .await
            .map_err(|e| PipelineError::PatternStaging { cause: e.to_string() })?;

        let path = self
            .patterns_dir
            .join(Self::random_file_name(PATTERNS_FILE_NAME_LENGTH));

        fs::write(&path, patterns)
            .await
            .map_err(|e| PipelineError::PatternStaging { cause: e.to_string() })?;

        tracing::debug!("staged patterns file {}", path.display());
        Ok(StagedPatterns { path })
    }

    async fn release(&self, staged: StagedPatterns) -> PipelineResult<()> {
        fs::remove_file(&staged.path).await?;
        tracing::debug!("removed patterns file {}", staged.path.display());
        Ok(())
    }
}
