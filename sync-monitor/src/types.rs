//! Common type definitions for the sync monitor.

use std::fmt;
use std::str::FromStr;

use crate::error::MonitorError;

/// Scheme assumed when an endpoint is given as a bare `host:port`.
const DEFAULT_SCHEME: &str = "http://";

/// A node's RPC endpoint, normalized to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Parse an endpoint from user input.
    ///
    /// Surrounding whitespace and trailing slashes are stripped and a missing
    /// scheme defaults to `http://`.
    pub fn parse(input: &str) -> Result<Self, MonitorError> {
        let trimmed = input.trim();
        if trimmed.trim_end_matches('/').is_empty() {
            return Err(MonitorError::InvalidArguments("empty node endpoint".to_string()));
        }

        if let Some((scheme, rest)) = trimmed.split_once("://") {
            let rest = rest.trim_end_matches('/');
            if rest.is_empty() {
                return Err(MonitorError::InvalidArguments(format!(
                    "endpoint '{}' has no host",
                    input
                )));
            }
            if scheme != "http" && scheme != "https" {
                return Err(MonitorError::InvalidArguments(format!(
                    "endpoint '{}' uses unsupported scheme '{}'",
                    input, scheme
                )));
            }
            Ok(Self(format!("{}://{}", scheme, rest)))
        } else {
            Ok(Self(format!("{}{}", DEFAULT_SCHEME, trimmed.trim_end_matches('/'))))
        }
    }

    /// The endpoint URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Endpoint {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a candidate node for the current round.
///
/// Derived from the node's window and the seed height every round; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Still catching up; keep monitoring.
    Progressing,
    /// Failed to make progress across its window.
    Stuck,
    /// Latest sample equals the seed height.
    Synced,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Progressing => write!(f, "progressing"),
            SyncStatus::Stuck => write!(f, "stuck"),
            SyncStatus::Synced => write!(f, "synced"),
        }
    }
}
