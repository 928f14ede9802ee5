//! Sync monitoring: per-node height history, classification and the polling loop.

pub mod classify;
pub mod sync_monitor;
pub mod window;

pub use classify::{classify, StuckRule};
pub use sync_monitor::{MonitorOutcome, MonitoredNode, RoundReport, SyncMonitor};
pub use window::HistoryWindow;
