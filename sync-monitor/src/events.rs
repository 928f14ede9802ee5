//! Events emitted by the sync monitor.

use std::time::Duration;

use crate::monitor::StuckRule;
use crate::types::Endpoint;

/// Events describing the progress of a monitoring run.
///
/// Emitted in the order they happen; a node's `Sample` always precedes its
/// classification event within the same round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The seed node's reference height was captured.
    SeedHeight {
        endpoint: Endpoint,
        height: u64,
    },

    /// A candidate reported its height for a round.
    Sample {
        round: u64,
        endpoint: Endpoint,
        height: u64,
    },

    /// A candidate's window is not yet full and was not classified.
    WarmingUp {
        endpoint: Endpoint,
        samples: usize,
        capacity: usize,
    },

    /// A candidate is still catching up.
    Progressing {
        endpoint: Endpoint,
        oldest: u64,
        newest: u64,
        seed_height: u64,
    },

    /// A candidate reached the seed height and is no longer monitored.
    Synced {
        endpoint: Endpoint,
        height: u64,
    },

    /// A candidate failed the stuck rule. The run aborts after this event.
    Stuck {
        endpoint: Endpoint,
        oldest: u64,
        newest: u64,
        rule: StuckRule,
    },

    /// A height query failed and will be retried after `delay`.
    RetryScheduled {
        endpoint: Endpoint,
        attempt: u32,
        delay: Duration,
        error: String,
    },

    /// A polling round finished with `remaining` nodes still monitored.
    RoundComplete {
        round: u64,
        remaining: usize,
    },

    /// Every candidate reached the seed height.
    AllSynced {
        rounds: u64,
    },
}

impl MonitorEvent {
    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            MonitorEvent::SeedHeight {
                endpoint,
                height,
            } => format!("SeedHeight({}, height={})", endpoint, height),
            MonitorEvent::Sample {
                round,
                endpoint,
                height,
            } => format!("Sample(round={}, {}, height={})", round, endpoint, height),
            MonitorEvent::WarmingUp {
                endpoint,
                samples,
                capacity,
            } => format!("WarmingUp({}, {}/{})", endpoint, samples, capacity),
            MonitorEvent::Progressing {
                endpoint,
                oldest,
                newest,
                seed_height,
            } => format!("Progressing({}, {}..{}, seed={})", endpoint, oldest, newest, seed_height),
            MonitorEvent::Synced {
                endpoint,
                height,
            } => format!("Synced({}, height={})", endpoint, height),
            MonitorEvent::Stuck {
                endpoint,
                oldest,
                newest,
                rule,
            } => format!("Stuck({}, {}..{}, rule={})", endpoint, oldest, newest, rule),
            MonitorEvent::RetryScheduled {
                endpoint,
                attempt,
                delay,
                ..
            } => format!(
                "RetryScheduled({}, attempt={}, delay={}ms)",
                endpoint,
                attempt,
                delay.as_millis()
            ),
            MonitorEvent::RoundComplete {
                round,
                remaining,
            } => format!("RoundComplete(round={}, remaining={})", round, remaining),
            MonitorEvent::AllSynced {
                rounds,
            } => format!("AllSynced(rounds={})", rounds),
        }
    }

    /// The node this event concerns, if any.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            MonitorEvent::SeedHeight {
                endpoint,
                ..
            }
            | MonitorEvent::Sample {
                endpoint,
                ..
            }
            | MonitorEvent::WarmingUp {
                endpoint,
                ..
            }
            | MonitorEvent::Progressing {
                endpoint,
                ..
            }
            | MonitorEvent::Synced {
                endpoint,
                ..
            }
            | MonitorEvent::Stuck {
                endpoint,
                ..
            }
            | MonitorEvent::RetryScheduled {
                endpoint,
                ..
            } => Some(endpoint),
            MonitorEvent::RoundComplete {
                ..
            }
            | MonitorEvent::AllSynced {
                ..
            } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_description() {
        let endpoint = Endpoint::parse("node-1:8545").unwrap();
        let event = MonitorEvent::Sample {
            round: 2,
            endpoint: endpoint.clone(),
            height: 95,
        };
        assert!(event.description().contains("Sample"));
        assert!(event.description().contains("95"));
        assert_eq!(event.endpoint(), Some(&endpoint));

        let stuck = MonitorEvent::Stuck {
            endpoint,
            oldest: 50,
            newest: 50,
            rule: StuckRule::Literal,
        };
        assert_eq!(stuck.description(), "Stuck(http://node-1:8545, 50..50, rule=literal)");
    }

    #[test]
    fn test_round_events_have_no_endpoint() {
        let event = MonitorEvent::RoundComplete {
            round: 1,
            remaining: 0,
        };
        assert!(event.endpoint().is_none());
        assert_eq!(event.description(), "RoundComplete(round=1, remaining=0)");
    }
}
