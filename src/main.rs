//! Filter tester entry point
//!
//! Parses deployment constants from the command line, wires the real
//! service implementations into the orchestrator, and serves the HTTP
//! surface until stopped.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use filter_tester::{
    services::{RealFilterConfigStore, RealMessageDispatcher, RealOutputHarvester, RealPatternStore},
    EngineConfig, FilterTesterServer, PipelineOrchestrator, PipelineResult, RetryPolicy,
};

/// HTTP service for testing log filter configurations against a live engine
#[derive(Parser, Debug)]
#[command(name = "filter-tester")]
#[command(about = "Stages a filter into a hot-reloaded engine, feeds it a test message over UDP and returns the engine output")]
struct Args {
    /// HTTP listen port
    #[arg(long, default_value = "8181")]
    port: u16,

    /// Engine UDP input listener port (loopback)
    #[arg(long, default_value = "8182")]
    input_port: u16,

    /// Fixed local port for outbound datagrams
    #[arg(long, default_value = "8180")]
    local_port: u16,

    /// Engine filter configuration file (hot-reloaded)
    #[arg(long, default_value = "/usr/share/logstash/pipeline/filter.conf")]
    filter_file: PathBuf,

    /// Engine input-stage configuration file holding the codec placeholder
    #[arg(long)]
    codec_file: Option<PathBuf>,

    /// File the engine writes its result to
    #[arg(long, default_value = "/usr/share/logstash/output.json")]
    output_file: PathBuf,

    /// Directory the engine resolves custom patterns from
    #[arg(long, default_value = "/usr/share/logstash/patterns")]
    patterns_dir: PathBuf,

    /// Documentation file served at /
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,

    /// Seconds to wait for the engine to reload a staged configuration
    #[arg(long, default_value = "5")]
    reload_settle_secs: u64,

    /// Seconds to wait for the engine to process dispatched messages
    #[arg(long, default_value = "5")]
    process_settle_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> PipelineResult<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig {
        filter_path: args.filter_file,
        codec_path: args.codec_file,
        output_path: args.output_file,
        patterns_dir: args.patterns_dir,
        input_port: args.input_port,
        local_port: args.local_port,
        reload_settle: Duration::from_secs(args.reload_settle_secs),
        process_settle: Duration::from_secs(args.process_settle_secs),
        dispatch_retry: RetryPolicy::new(3, Duration::from_secs(1)),
        harvest_retry: RetryPolicy::new(10, Duration::from_secs(3)),
    };

    // A result left behind by a previous run must not satisfy the first
    // request of this one.
    if let Err(error) = tokio::fs::remove_file(&config.output_path).await {
        if error.kind() != std::io::ErrorKind::NotFound {
            warn!("cannot remove stale engine output: {}", error);
        }
    }

    let orchestrator = PipelineOrchestrator::new(
        RealPatternStore::new(config.patterns_dir.clone()),
        RealFilterConfigStore::new(config.filter_path.clone(), config.codec_path.clone()),
        RealMessageDispatcher::new(config.local_port, config.input_port, config.dispatch_retry),
        RealOutputHarvester::new(config.output_path.clone(), config.harvest_retry),
        config.reload_settle,
        config.process_settle,
    );

    let bind_address = SocketAddr::from(([0, 0, 0, 0], args.port));
    let server = FilterTesterServer::new(orchestrator, args.readme, bind_address);

    server.run().await
}
