//! The polling loop tracking candidate nodes against the seed node.
//!
//! The seed height is read once. Every round each still-monitored candidate is
//! queried, its sample pushed into its window, and the node classified. Decisions
//! for the round are collected first and applied afterwards: synced nodes are
//! dropped from the monitored set, a stuck node aborts the whole run.

use std::collections::HashSet;

use futures::future::join_all;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::event_bus::{EventBus, EventReceiver};
use crate::events::MonitorEvent;
use crate::monitor::{classify, HistoryWindow};
use crate::network::{HeightSource, RetryingHeightSource};
use crate::types::{Endpoint, SyncStatus};

/// A candidate node and its height history.
#[derive(Debug, Clone)]
pub struct MonitoredNode {
    endpoint: Endpoint,
    window: HistoryWindow,
}

impl MonitoredNode {
    fn new(endpoint: Endpoint, window_size: usize) -> Self {
        Self {
            endpoint,
            window: HistoryWindow::new(window_size),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn window(&self) -> &HistoryWindow {
        &self.window
    }
}

/// Result of a single polling round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Round number, starting at 1.
    pub round: u64,
    /// Nodes that became synced this round, in candidate order.
    pub synced: Vec<Endpoint>,
    /// Nodes still monitored after this round.
    pub remaining: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOutcome {
    pub seed_height: u64,
    pub rounds: u64,
    /// Nodes in the order they synced.
    pub synced: Vec<Endpoint>,
}

/// Tracks candidate nodes until they all reach the seed height.
pub struct SyncMonitor<S> {
    config: MonitorConfig,
    seed: Endpoint,
    nodes: Vec<MonitoredNode>,
    source: RetryingHeightSource<S>,
    events: EventBus<MonitorEvent>,
    seed_height: Option<u64>,
    round: u64,
    synced: Vec<Endpoint>,
}

impl<S: HeightSource> SyncMonitor<S> {
    /// Create a monitor for `candidates`, measured against `seed`.
    ///
    /// Duplicate candidates are monitored once.
    pub fn new(
        config: MonitorConfig,
        seed: Endpoint,
        candidates: Vec<Endpoint>,
        source: S,
    ) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        if candidates.is_empty() {
            return Err(MonitorError::InvalidArguments(
                "at least one candidate node is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let nodes: Vec<MonitoredNode> = candidates
            .into_iter()
            .filter(|endpoint| {
                let fresh = seen.insert(endpoint.clone());
                if !fresh {
                    tracing::warn!("Ignoring duplicate candidate {}", endpoint);
                }
                fresh
            })
            .map(|endpoint| MonitoredNode::new(endpoint, config.window_size))
            .collect();

        let events = EventBus::default();
        let source = RetryingHeightSource::new(source, config.retry, events.clone());

        Ok(Self {
            config,
            seed,
            nodes,
            source,
            events,
            seed_height: None,
            round: 0,
            synced: Vec::new(),
        })
    }

    /// Subscribe to the monitor's event stream.
    pub fn subscribe(&self) -> EventReceiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn seed(&self) -> &Endpoint {
        &self.seed
    }

    /// The captured seed height, if it has been read yet.
    pub fn seed_height(&self) -> Option<u64> {
        self.seed_height
    }

    /// Nodes still being monitored, in candidate order.
    pub fn monitored(&self) -> &[MonitoredNode] {
        &self.nodes
    }

    pub fn monitored_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of rounds polled so far.
    pub fn rounds(&self) -> u64 {
        self.round
    }

    /// Read the seed node's height.
    ///
    /// Only the first call queries the seed; the height is fixed for the rest of the run.
    pub async fn init_seed_height(&mut self) -> Result<u64> {
        if let Some(height) = self.seed_height {
            return Ok(height);
        }

        let height = self.source.height(&self.seed).await.map_err(|source| {
            MonitorError::Connectivity {
                endpoint: self.seed.clone(),
                source,
            }
        })?;

        tracing::info!("Seed {} is at height {}", self.seed, height);
        self.seed_height = Some(height);
        self.emit(MonitorEvent::SeedHeight {
            endpoint: self.seed.clone(),
            height,
        });
        Ok(height)
    }

    /// Poll every monitored node once and apply the resulting decisions.
    ///
    /// Fails with [`MonitorError::StuckDetected`] on the first stuck node, after
    /// removing any nodes that synced earlier in the same round.
    pub async fn poll_round(&mut self) -> Result<RoundReport> {
        let seed_height = self.init_seed_height().await?;
        self.round += 1;
        let round = self.round;

        let heights = self.fetch_heights().await?;
        for (node, height) in self.nodes.iter_mut().zip(heights) {
            node.window.push(height);
            tracing::debug!("Round {}: {} at height {}", round, node.endpoint, height);
            self.events.emit(&[MonitorEvent::Sample {
                round,
                endpoint: node.endpoint.clone(),
                height,
            }]);
        }

        let decisions: Vec<Option<SyncStatus>> = self
            .nodes
            .iter()
            .map(|node| classify(&node.window, seed_height, self.config.stuck_rule))
            .collect();

        let mut synced_indices = Vec::new();
        for (index, decision) in decisions.into_iter().enumerate() {
            let node = &self.nodes[index];
            let (oldest, newest) = match (node.window.oldest(), node.window.newest()) {
                (Some(oldest), Some(newest)) => (oldest, newest),
                _ => continue,
            };

            match decision {
                None => {
                    self.emit(MonitorEvent::WarmingUp {
                        endpoint: node.endpoint.clone(),
                        samples: node.window.len(),
                        capacity: node.window.capacity(),
                    });
                }
                Some(SyncStatus::Progressing) => {
                    self.emit(MonitorEvent::Progressing {
                        endpoint: node.endpoint.clone(),
                        oldest,
                        newest,
                        seed_height,
                    });
                }
                Some(SyncStatus::Synced) => {
                    tracing::info!("{} is fully synced at height {}", node.endpoint, newest);
                    self.emit(MonitorEvent::Synced {
                        endpoint: node.endpoint.clone(),
                        height: newest,
                    });
                    synced_indices.push(index);
                }
                Some(SyncStatus::Stuck) => {
                    let endpoint = node.endpoint.clone();
                    tracing::error!(
                        "{} is stuck: oldest sample {}, newest sample {} (rule: {})",
                        endpoint,
                        oldest,
                        newest,
                        self.config.stuck_rule
                    );
                    self.emit(MonitorEvent::Stuck {
                        endpoint: endpoint.clone(),
                        oldest,
                        newest,
                        rule: self.config.stuck_rule,
                    });
                    self.retire(&synced_indices);
                    return Err(MonitorError::StuckDetected {
                        endpoint,
                        oldest,
                        newest,
                    });
                }
            }
        }

        let synced = self.retire(&synced_indices);
        let remaining = self.nodes.len();
        self.emit(MonitorEvent::RoundComplete {
            round,
            remaining,
        });

        Ok(RoundReport {
            round,
            synced,
            remaining,
        })
    }

    /// Poll until every candidate is synced.
    pub async fn run(&mut self) -> Result<MonitorOutcome> {
        let seed_height = self.init_seed_height().await?;
        tracing::info!(
            "Monitoring {} node(s) against seed height {} (window {}, rule {})",
            self.nodes.len(),
            seed_height,
            self.config.window_size,
            self.config.stuck_rule
        );

        while !self.nodes.is_empty() {
            let report = self.poll_round().await?;
            if report.remaining == 0 {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        tracing::info!("All nodes synced after {} round(s)", self.round);
        self.emit(MonitorEvent::AllSynced {
            rounds: self.round,
        });

        Ok(MonitorOutcome {
            seed_height,
            rounds: self.round,
            synced: self.synced.clone(),
        })
    }

    /// Query every monitored node, returning heights in node order.
    async fn fetch_heights(&self) -> Result<Vec<u64>> {
        let results = if self.config.concurrent_polling {
            join_all(self.nodes.iter().map(|node| self.source.height(&node.endpoint))).await
        } else {
            let mut results = Vec::with_capacity(self.nodes.len());
            for node in &self.nodes {
                let result = self.source.height(&node.endpoint).await;
                let failed = result.is_err();
                results.push(result);
                if failed {
                    break;
                }
            }
            results
        };

        self.nodes
            .iter()
            .zip(results)
            .map(|(node, result)| {
                result.map_err(|source| MonitorError::Connectivity {
                    endpoint: node.endpoint.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Drop the nodes at `indices` (ascending) and record them as synced.
    fn retire(&mut self, indices: &[usize]) -> Vec<Endpoint> {
        let mut retired: Vec<Endpoint> =
            indices.iter().rev().map(|&index| self.nodes.remove(index).endpoint).collect();
        retired.reverse();
        self.synced.extend(retired.iter().cloned());
        retired
    }

    fn emit(&self, event: MonitorEvent) {
        self.events.emit(&[event]);
    }
}
