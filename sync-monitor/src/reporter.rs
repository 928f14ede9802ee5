//! Human-readable status lines for monitor events.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::event_bus::EventReceiver;
use crate::events::MonitorEvent;

/// Writes one status line per reportable event.
pub struct Reporter<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
        }
    }

    /// Write the line for `event`, if it has one.
    pub async fn report(&mut self, event: &MonitorEvent) -> io::Result<()> {
        if let Some(line) = format_event(event) {
            self.out.write_all(format!("{}\n", line).as_bytes()).await?;
            self.out.flush().await?;
        }
        Ok(())
    }

    /// Report events until the bus closes or the sink fails.
    pub async fn run(mut self, mut events: EventReceiver<MonitorEvent>) -> io::Result<W> {
        loop {
            match events.recv().await {
                Ok(Some(event)) => self.report(&event).await?,
                Ok(None) => break,
                Err(e) => tracing::warn!("Reporter fell behind: {}", e),
            }
        }
        Ok(self.out)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Format an event as a status line.
///
/// Warming-up and progressing notices are left to the debug log.
pub fn format_event(event: &MonitorEvent) -> Option<String> {
    match event {
        MonitorEvent::SeedHeight {
            endpoint,
            height,
        } => Some(format!("Seed node {} is at height {}", endpoint, height)),
        MonitorEvent::Sample {
            round,
            endpoint,
            height,
        } => Some(format!("[round {}] {} height {}", round, endpoint, height)),
        MonitorEvent::Synced {
            endpoint,
            height,
        } => Some(format!("{} is fully synced at height {}", endpoint, height)),
        MonitorEvent::Stuck {
            endpoint,
            oldest,
            newest,
            rule,
        } => Some(format!(
            "{} is stuck: height went from {} to {} ({} rule)",
            endpoint, oldest, newest, rule
        )),
        MonitorEvent::RetryScheduled {
            endpoint,
            attempt,
            delay,
            error,
        } => Some(format!(
            "{} query failed (attempt {}): {}; retrying in {}ms",
            endpoint,
            attempt,
            error,
            delay.as_millis()
        )),
        MonitorEvent::RoundComplete {
            round,
            remaining,
        } => Some(format!("[round {}] {} node(s) still syncing", round, remaining)),
        MonitorEvent::AllSynced {
            rounds,
        } => Some(format!("All nodes synced after {} round(s)", rounds)),
        MonitorEvent::WarmingUp {
            ..
        }
        | MonitorEvent::Progressing {
            ..
        } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use crate::event_bus::EventBus;
    use crate::monitor::StuckRule;
    use crate::test_utils::test_endpoint;

    #[tokio::test]
    async fn test_report_writes_lines() {
        let mut reporter = Reporter::new(Vec::new());
        reporter
            .report(&MonitorEvent::Sample {
                round: 1,
                endpoint: test_endpoint(1),
                height: 95,
            })
            .await
            .unwrap();
        reporter
            .report(&MonitorEvent::Synced {
                endpoint: test_endpoint(1),
                height: 100,
            })
            .await
            .unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            output,
            "[round 1] http://node-1:8545 height 95\nhttp://node-1:8545 is fully synced at height 100\n"
        );
    }

    #[tokio::test]
    async fn test_quiet_events_produce_no_output() {
        let mut reporter = Reporter::new(Vec::new());
        reporter
            .report(&MonitorEvent::WarmingUp {
                endpoint: test_endpoint(1),
                samples: 1,
                capacity: 3,
            })
            .await
            .unwrap();
        assert!(reporter.into_inner().is_empty());
    }

    #[test]
    fn test_stuck_line_names_rule() {
        let line = format_event(&MonitorEvent::Stuck {
            endpoint: test_endpoint(2),
            oldest: 50,
            newest: 50,
            rule: StuckRule::Literal,
        })
        .unwrap();
        assert_eq!(line, "http://node-2:8545 is stuck: height went from 50 to 50 (literal rule)");
    }

    #[tokio::test]
    async fn test_run_drains_until_bus_closes() {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        bus.emit(&[
            MonitorEvent::RoundComplete {
                round: 1,
                remaining: 0,
            },
            MonitorEvent::AllSynced {
                rounds: 1,
            },
        ]);
        drop(bus);

        let output = Reporter::new(Vec::new()).run(rx).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("All nodes synced after 1 round(s)\n"));
    }

    struct BrokenSink;

    impl AsyncWrite for BrokenSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_returned() {
        let mut reporter = Reporter::new(BrokenSink);
        let err = reporter
            .report(&MonitorEvent::AllSynced {
                rounds: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_run_stops_on_sink_failure_while_bus_is_open() {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        bus.emit(&[MonitorEvent::AllSynced {
            rounds: 1,
        }]);

        let err = match Reporter::new(BrokenSink).run(rx).await {
            Ok(_) => panic!("reporter kept running with a broken sink"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        drop(bus);
    }
}
