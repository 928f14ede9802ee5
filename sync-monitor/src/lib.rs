//! Blockchain node synchronization monitor.
//!
//! Tracks whether a set of candidate nodes catch up to a trusted seed node:
//!
//! - Reads the seed node's chain height once as the reference height
//! - Polls every candidate once per interval and keeps its last few heights
//! - Retires candidates whose latest height equals the seed height
//! - Aborts the run as soon as a candidate is classified as stuck
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use sync_monitor::{Endpoint, JsonRpcHeightSource, MonitorConfig, SyncMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new().with_poll_interval(Duration::from_secs(5));
//!     let source = JsonRpcHeightSource::new(config.request_timeout)?;
//!
//!     let seed = Endpoint::parse("http://seed:8545")?;
//!     let nodes = vec![Endpoint::parse("http://node-1:8545")?];
//!
//!     let mut monitor = SyncMonitor::new(config, seed, nodes, source)?;
//!     let outcome = monitor.run().await?;
//!     println!("synced after {} rounds", outcome.rounds);
//!     Ok(())
//! }
//! ```

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub mod cli;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod logging;
pub mod monitor;
pub mod network;
pub mod reporter;
pub mod types;

// Re-export main types for convenience
pub use config::MonitorConfig;
pub use error::{
    ConnectivityError, ConnectivityResult, LoggingError, LoggingResult, MonitorError, Result,
};
pub use event_bus::{EventBus, EventReceiver};
pub use events::MonitorEvent;
pub use logging::{init_logging, LogFileConfig, LoggingConfig, LoggingGuard};
pub use monitor::{
    classify, HistoryWindow, MonitorOutcome, MonitoredNode, RoundReport, StuckRule, SyncMonitor,
};
pub use network::{HeightSource, JsonRpcHeightSource, RetryPolicy, RetryingHeightSource};
pub use reporter::Reporter;
pub use tracing::level_filters::LevelFilter;
pub use types::{Endpoint, SyncStatus};

/// Current version of the sync-monitor library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
