//! Filter tester service library
//!
//! Orchestrates an external, file-configured, UDP-fed log-filtering engine
//! on behalf of callers who want to test a filter definition against a
//! sample message: stage configuration, dispatch input, harvest output, and
//! always restore the engine to its neutral baseline.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::PipelineOrchestrator;
pub use server::FilterTesterServer;
pub use types::{PipelineReport, PipelineRequest, RetryPolicy};

// Re-export trait definitions
pub use traits::{FilterConfigStore, MessageDispatcher, OutputHarvester, PatternStore};

// Re-export service implementations
pub use services::{
    RealFilterConfigStore, RealMessageDispatcher, RealOutputHarvester, RealPatternStore,
};
