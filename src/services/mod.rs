//! Service implementations
//!
//! Real implementations of the engine-facing service traits. These are the
//! production implementations doing actual filesystem and network I/O.

pub mod dispatcher;
pub mod filter_config;
pub mod harvester;
pub mod patterns;

pub use dispatcher::RealMessageDispatcher;
pub use filter_config::RealFilterConfigStore;
pub use harvester::RealOutputHarvester;
pub use patterns::{rewrite_aliases, RealPatternStore};
