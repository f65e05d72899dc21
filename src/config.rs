//! Engine interface configuration
//!
//! Every path, port and wait the service uses to talk to the external
//! filtering engine lives here. The values are deployment constants, not
//! protocol: callers construct one `EngineConfig` from CLI flags and hand it
//! to the services instead of reaching for module-level globals.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::RetryPolicy;

/// Neutral pass-through filter restored after every test run.
pub const NEUTRAL_FILTER: &str = "filter{}\n";

/// Sentinel token in the input-stage template replaced by a codec directive.
pub const CODEC_PLACEHOLDER: &str = "#CODEC#";

/// Length of the random token naming a staged custom-pattern file.
pub const PATTERNS_FILE_NAME_LENGTH: usize = 5;

/// How the service reaches the engine's configuration slot, input listener
/// and output artifact.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hot-reloaded filter configuration file.
    pub filter_path: PathBuf,
    /// Input-stage configuration holding the codec placeholder, if deployed.
    pub codec_path: Option<PathBuf>,
    /// File the engine writes its result to.
    pub output_path: PathBuf,
    /// Directory the engine's pattern resolver searches.
    pub patterns_dir: PathBuf,
    /// Engine UDP input listener port on loopback.
    pub input_port: u16,
    /// Fixed local port the dispatcher binds for outbound datagrams.
    pub local_port: u16,
    /// Wait for the engine's autoreload watcher to pick up a staged filter.
    ///
    /// The engine emits no readiness signal, so this is a guessed budget
    /// rather than a guarantee; a future engine-side health probe should
    /// replace it.
    pub reload_settle: Duration,
    /// Wait for the engine to finish processing dispatched messages.
    pub process_settle: Duration,
    /// Retry budget for UDP dispatch.
    pub dispatch_retry: RetryPolicy,
    /// Polling budget for the output file.
    pub harvest_retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_path: PathBuf::from("/usr/share/logstash/pipeline/filter.conf"),
            codec_path: None,
            output_path: PathBuf::from("/usr/share/logstash/output.json"),
            patterns_dir: PathBuf::from("/usr/share/logstash/patterns"),
            input_port: 8182,
            local_port: 8180,
            reload_settle: Duration::from_secs(5),
            process_settle: Duration::from_secs(5),
            dispatch_retry: RetryPolicy::new(3, Duration::from_secs(1)),
            harvest_retry: RetryPolicy::new(10, Duration::from_secs(3)),
        }
    }
}
