//! Pipeline test orchestration
//!
//! Composes the staging, dispatch and harvest services under a single-flight
//! lock. The external engine has exactly one configuration slot and one
//! output slot, so the whole staging, dispatch, harvest sequence of one
//! request must finish (including artifact release) before the next begins.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::PipelineResult;
use crate::services::patterns::rewrite_aliases;
use crate::traits::{FilterConfigStore, MessageDispatcher, OutputHarvester, PatternStore};
use crate::types::{PipelineRequest, StagedCodec, StagedFilter, StagedPatterns};

/// Orchestrator over injected engine-facing services.
pub struct PipelineOrchestrator<P, F, D, H>
where
    P: PatternStore,
    F: FilterConfigStore,
    D: MessageDispatcher,
    H: OutputHarvester,
{
    patterns: P,
    filter_config: F,
    dispatcher: D,
    harvester: H,
    reload_settle: Duration,
    process_settle: Duration,
    // Single-flight lock over the engine's shared configuration slot.
    engine_lock: Mutex<()>,
}

impl<P, F, D, H> PipelineOrchestrator<P, F, D, H>
where
    P: PatternStore,
    F: FilterConfigStore,
    D: MessageDispatcher,
    H: OutputHarvester,
{
    pub fn new(
        patterns: P,
        filter_config: F,
        dispatcher: D,
        harvester: H,
        reload_settle: Duration,
        process_settle: Duration,
    ) -> Self {
        Self {
            patterns,
            filter_config,
            dispatcher,
            harvester,
            reload_settle,
            process_settle,
            engine_lock: Mutex::new(()),
        }
    }

    /// Run one pipeline test to completion and return the engine output.
    ///
    /// Every staged artifact is released exactly once on every path, in
    /// LIFO order, before the lock is dropped.
    pub async fn run_test(&self, request: &PipelineRequest) -> PipelineResult<String> {
        let _guard = self.engine_lock.lock().await;
        info!("processing new filter and message");

        let canonical_dir = self.patterns.canonical_dir();
        let filter = rewrite_aliases(
            &request.filter,
            &request.pattern_aliases,
            &canonical_dir.to_string_lossy(),
        );

        let staged_patterns = match &request.patterns {
            Some(patterns) => Some(self.patterns.stage(patterns).await?),
            None => None,
        };

        let staged_filter = match self.filter_config.stage_filter(&filter).await {
            Ok(staged) => staged,
            Err(error) => {
                self.release(None, None, staged_patterns).await;
                return Err(error);
            }
        };

        let staged_codec = match &request.input_codec {
            Some(codec) => match self.filter_config.stage_codec(codec).await {
                Ok(staged) => Some(staged),
                Err(error) => {
                    self.release(None, Some(staged_filter), staged_patterns).await;
                    return Err(error);
                }
            },
            None => None,
        };

        // Give the engine's autoreload watcher time to pick up the staged
        // configuration. There is no readiness signal to poll instead.
        tokio::time::sleep(self.reload_settle).await;

        let result = match self.dispatcher.dispatch(&request.message).await {
            Ok(()) => {
                tokio::time::sleep(self.process_settle).await;
                self.harvester.harvest().await
            }
            Err(error) => Err(error),
        };

        self.release(staged_codec, Some(staged_filter), staged_patterns).await;
        result
    }

    /// Release staged artifacts, most recently staged first. Release
    /// failures are logged and never displace the primary result.
    async fn release(
        &self,
        codec: Option<StagedCodec>,
        filter: Option<StagedFilter>,
        patterns: Option<StagedPatterns>,
    ) {
        if let Some(staged) = codec {
            if let Err(error) = self.filter_config.release_codec(staged).await {
                warn!("cannot restore input-stage configuration: {}", error);
            }
        }
        if let Some(staged) = filter {
            if let Err(error) = self.filter_config.release_filter(staged).await {
                warn!("cannot restore neutral filter: {}", error);
            }
        }
        if let Some(staged) = patterns {
            if let Err(error) = self.patterns.release(staged).await {
                warn!("cannot remove staged patterns: {}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::error::PipelineError;
    use crate::traits::{
        MockFilterConfigStore, MockMessageDispatcher, MockOutputHarvester, MockPatternStore,
    };

    fn request(filter: &str, message: &str) -> PipelineRequest {
        PipelineRequest {
            filter: filter.to_string(),
            message: message.to_string(),
            ..PipelineRequest::default()
        }
    }

    fn orchestrator(
        patterns: MockPatternStore,
        filter_config: MockFilterConfigStore,
        dispatcher: MockMessageDispatcher,
        harvester: MockOutputHarvester,
    ) -> PipelineOrchestrator<
        MockPatternStore,
        MockFilterConfigStore,
        MockMessageDispatcher,
        MockOutputHarvester,
    > {
        PipelineOrchestrator::new(
            patterns,
            filter_config,
            dispatcher,
            harvester,
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_run_test_happy_path_sequences_all_services() {
        let mut patterns = MockPatternStore::new();
        patterns
            .expect_canonical_dir()
            .return_const(PathBuf::from("/patterns"));
        patterns.expect_stage().times(0);
        patterns.expect_release().times(0);

        let mut filter_config = MockFilterConfigStore::new();
        filter_config
            .expect_stage_filter()
            .withf(|filter| filter == "filter{}")
            .times(1)
            .returning(|_| Ok(StagedFilter));
        filter_config.expect_stage_codec().times(0);
        filter_config
            .expect_release_filter()
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|message| message == "hello")
            .times(1)
            .returning(|_| Ok(()));

        let mut harvester = MockOutputHarvester::new();
        harvester
            .expect_harvest()
            .times(1)
            .returning(|| Ok("engine output".to_string()));

        let orchestrator = orchestrator(patterns, filter_config, dispatcher, harvester);
        let output = orchestrator.run_test(&request("filter{}", "hello")).await.unwrap();
        assert_eq!(output, "engine output");
    }

    #[tokio::test]
    async fn test_alias_rewriting_flows_into_staged_filter() {
        let mut patterns = MockPatternStore::new();
        patterns
            .expect_canonical_dir()
            .return_const(PathBuf::from("qwe"));

        let mut filter_config = MockFilterConfigStore::new();
        filter_config
            .expect_stage_filter()
            .withf(|filter| filter == "qwe qwe qwe qwe")
            .times(1)
            .returning(|_| Ok(StagedFilter));
        filter_config
            .expect_release_filter()
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher.expect_dispatch().returning(|_| Ok(()));

        let mut harvester = MockOutputHarvester::new();
        harvester.expect_harvest().returning(|| Ok(String::new()));

        let mut test_request = request("qwe asd qwe zxc", "hello");
        test_request.pattern_aliases = vec!["asd".to_string(), "zxc".to_string()];

        let orchestrator = orchestrator(patterns, filter_config, dispatcher, harvester);
        orchestrator.run_test(&test_request).await.unwrap();
    }

    #[tokio::test]
    async fn test_filter_staging_failure_releases_patterns_and_skips_dispatch() {
        let mut patterns = MockPatternStore::new();
        patterns
            .expect_canonical_dir()
            .return_const(PathBuf::from("/patterns"));
        patterns
            .expect_stage()
            .times(1)
            .returning(|_| Ok(StagedPatterns { path: PathBuf::from("/patterns/abcde") }));
        patterns.expect_release().times(1).returning(|_| Ok(()));

        let mut filter_config = MockFilterConfigStore::new();
        filter_config
            .expect_stage_filter()
            .times(1)
            .returning(|_| Err(PipelineError::FilterStaging { cause: "read-only".to_string() }));
        filter_config.expect_release_filter().times(0);

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher.expect_dispatch().times(0);

        let mut harvester = MockOutputHarvester::new();
        harvester.expect_harvest().times(0);

        let mut test_request = request("filter{}", "hello");
        test_request.patterns = Some("WORD \\w+".to_string());

        let orchestrator = orchestrator(patterns, filter_config, dispatcher, harvester);
        let error = orchestrator.run_test(&test_request).await.unwrap_err();
        assert!(matches!(error, PipelineError::FilterStaging { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_failure_still_restores_filter_and_skips_harvest() {
        let mut patterns = MockPatternStore::new();
        patterns
            .expect_canonical_dir()
            .return_const(PathBuf::from("/patterns"));

        let mut filter_config = MockFilterConfigStore::new();
        filter_config
            .expect_stage_filter()
            .times(1)
            .returning(|_| Ok(StagedFilter));
        filter_config
            .expect_release_filter()
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| {
            Err(PipelineError::Dispatch {
                target: "127.0.0.1:8182".to_string(),
                cause: "network down".to_string(),
            })
        });

        let mut harvester = MockOutputHarvester::new();
        harvester.expect_harvest().times(0);

        let orchestrator = orchestrator(patterns, filter_config, dispatcher, harvester);
        let error = orchestrator.run_test(&request("filter{}", "hello")).await.unwrap_err();
        assert!(matches!(error, PipelineError::Dispatch { .. }));
    }

    #[tokio::test]
    async fn test_harvest_failure_still_releases_codec_filter_and_patterns() {
        let mut patterns = MockPatternStore::new();
        patterns
            .expect_canonical_dir()
            .return_const(PathBuf::from("/patterns"));
        patterns
            .expect_stage()
            .times(1)
            .returning(|_| Ok(StagedPatterns { path: PathBuf::from("/patterns/abcde") }));
        patterns.expect_release().times(1).returning(|_| Ok(()));

        let mut filter_config = MockFilterConfigStore::new();
        filter_config
            .expect_stage_filter()
            .times(1)
            .returning(|_| Ok(StagedFilter));
        filter_config
            .expect_stage_codec()
            .withf(|codec| codec == "json")
            .times(1)
            .returning(|_| Ok(StagedCodec { backup: "input {}".to_string() }));
        filter_config
            .expect_release_filter()
            .times(1)
            .returning(|_| Ok(()));
        filter_config
            .expect_release_codec()
            .times(1)
            .returning(|_| Ok(()));

        let mut dispatcher = MockMessageDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| Ok(()));

        let mut harvester = MockOutputHarvester::new();
        harvester
            .expect_harvest()
            .times(1)
            .returning(|| Err(PipelineError::Harvest { cause: "no output".to_string() }));

        let mut test_request = request("filter{}", "hello");
        test_request.patterns = Some("WORD \\w+".to_string());
        test_request.input_codec = Some("json".to_string());

        let orchestrator = orchestrator(patterns, filter_config, dispatcher, harvester);
        let error = orchestrator.run_test(&test_request).await.unwrap_err();
        assert!(matches!(error, PipelineError::Harvest { .. }));
    }
}
