//! Request, artifact and policy types shared across the service

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

/// A decoded pipeline test submission, immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Engine configuration fragment under test.
    pub filter: String,
    /// Newline-delimited test input lines.
    pub message: String,
    /// Reference output for a future comparison collaborator.
    pub expected: Option<String>,
    /// Custom pattern definitions to stage before the filter runs.
    pub patterns: Option<String>,
    /// Tokens inside `filter` to rewrite to the staged patterns directory.
    pub pattern_aliases: Vec<String>,
    /// Codec directive to splice into the engine's input stage.
    pub input_codec: Option<String>,
}

impl PipelineRequest {
    /// Build a request from decoded multipart `(field name, value)` pairs.
    ///
    /// An unrecognized field name rejects the whole submission; there is no
    /// partial acceptance. Required-field invariants are applied after the
    /// fold so a trailing `filter` part still counts.
    pub fn from_parts<I>(parts: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = PipelineRequest::default();

        for (name, value) in parts {
            match name.as_str() {
                "filter" => request.filter = value,
                "message" => request.message = value,
                "expected" => request.expected = Some(value),
                "patterns" => request.patterns = Some(value),
                "patterns_dir" => {
                    // An empty alias token would match between every byte of
                    // the filter text, so drop empties up front.
                    request.pattern_aliases = value
                        .split(',')
                        .filter(|alias| !alias.is_empty())
                        .map(|alias| alias.to_string())
                        .collect();
                }
                "codec" => request.input_codec = Some(value),
                other => {
                    return Err(PipelineError::InvalidRequest {
                        reason: format!("unrecognized field '{}'", other),
                    });
                }
            }
        }

        if request.filter.is_empty() {
            return Err(PipelineError::EmptyFilter);
        }

        if request.message.is_empty() {
            return Err(PipelineError::EmptyMessage);
        }

        Ok(request)
    }
}

/// Success envelope returned by `/upload`.
///
/// `diff` and `lint` are reserved for comparison and linting collaborators
/// and stay empty in this core; keeping them in the shape means those
/// collaborators can land without changing the HTTP contract.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PipelineReport {
    pub output: String,
    pub diff: String,
    pub lint: String,
    pub status: String,
}

impl PipelineReport {
    pub fn success(output: String) -> Self {
        Self {
            output,
            diff: String::new(),
            lint: String::new(),
            status: "ok".to_string(),
        }
    }
}

/// A staged custom-pattern file; released by deleting the file.
#[derive(Debug)]
pub struct StagedPatterns {
    pub path: PathBuf,
}

/// The installed filter configuration; released by restoring the neutral
/// pass-through filter.
#[derive(Debug)]
pub struct StagedFilter;

/// A spliced input-stage configuration; released by writing back the
/// pre-modification bytes.
#[derive(Debug)]
pub struct StagedCodec {
    pub backup: String,
}

/// Bounded retry policy: a fixed number of attempts with a fixed
/// inter-attempt delay and no jitter.
///
/// Extracted as a value so dispatch and harvest share one tested loop and
/// the policy can be swapped without touching the orchestration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted,
    /// returning the last error. Always makes at least one attempt; the
    /// inter-attempt delay is skipped after the final failure.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let budget = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= budget => return Err(error),
                Err(error) => {
                    tracing::debug!("attempt {}/{} failed: {}", attempt, budget, error);
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
