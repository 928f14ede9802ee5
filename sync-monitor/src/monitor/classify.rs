//! Classification of a node from its height window.

use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;
use crate::monitor::HistoryWindow;
use crate::types::SyncStatus;

/// Rule deciding whether a full window means the node has stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StuckRule {
    /// Stuck when `oldest <= newest`.
    ///
    /// This matches the deployed monitor's behavior, which also flags nodes whose
    /// height increased across the window.
    #[default]
    Literal,
    /// Stuck when `oldest >= newest`: the height did not increase across the window.
    NonIncreasing,
}

impl StuckRule {
    /// Apply the rule to the first and last samples of a window.
    pub fn is_stuck(&self, oldest: u64, newest: u64) -> bool {
        match self {
            StuckRule::Literal => oldest <= newest,
            StuckRule::NonIncreasing => oldest >= newest,
        }
    }
}

impl fmt::Display for StuckRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StuckRule::Literal => write!(f, "literal"),
            StuckRule::NonIncreasing => write!(f, "non-increasing"),
        }
    }
}

impl FromStr for StuckRule {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "literal" => Ok(StuckRule::Literal),
            "non-increasing" => Ok(StuckRule::NonIncreasing),
            other => Err(MonitorError::InvalidArguments(format!("unknown stuck rule '{}'", other))),
        }
    }
}

/// Classify a node against the seed height.
///
/// Returns `None` while the window is still warming up. The synced check runs
/// before the stuck rule, so a node sitting at the seed height is never stuck.
pub fn classify(window: &HistoryWindow, seed_height: u64, rule: StuckRule) -> Option<SyncStatus> {
    if !window.is_full() {
        return None;
    }
    let oldest = window.oldest()?;
    let newest = window.newest()?;

    if newest == seed_height {
        Some(SyncStatus::Synced)
    } else if rule.is_stuck(oldest, newest) {
        Some(SyncStatus::Stuck)
    } else {
        Some(SyncStatus::Progressing)
    }
}
