//! Command-line parsing for the `sync-monitor` binary.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, Command};
use tracing::level_filters::LevelFilter;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::logging::parse_level;
use crate::monitor::{MonitorOutcome, StuckRule};
use crate::network::RetryPolicy;
use crate::types::Endpoint;

const USAGE: &str = "sync-monitor [OPTIONS] <SEED> <NODE>...";

/// Exit status used when the run is interrupted with Ctrl-C.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Everything needed to start a monitoring run.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub seed: Endpoint,
    pub candidates: Vec<Endpoint>,
    pub config: MonitorConfig,
    pub log_level: LevelFilter,
    pub log_dir: Option<PathBuf>,
}

/// Outcome of argument parsing.
#[derive(Debug)]
pub enum ParsedArgs {
    /// Start monitoring.
    Run(Box<CliArgs>),
    /// Help or version was requested; print it and exit successfully.
    Info(clap::Error),
}

/// Build the clap command definition.
pub fn build_command() -> Command {
    Command::new("sync-monitor")
        .version(crate::VERSION)
        .about("Watch candidate nodes catch up to a seed node's chain height")
        .override_usage(USAGE)
        .arg(
            Arg::new("seed")
                .value_name("SEED")
                .help("RPC endpoint of the trusted seed node"),
        )
        .arg(
            Arg::new("nodes")
                .value_name("NODE")
                .help("RPC endpoints of the candidate nodes")
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECS")
                .help("Seconds to wait between polling rounds")
                .value_parser(value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            Arg::new("window")
                .short('w')
                .long("window")
                .value_name("N")
                .help("Samples per node required before it is classified")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("3"),
        )
        .arg(
            Arg::new("stuck-rule")
                .long("stuck-rule")
                .value_name("RULE")
                .help("When a full window counts as stuck: literal (oldest <= newest) or non-increasing (oldest >= newest)")
                .value_parser(["literal", "non-increasing"])
                .default_value("literal"),
        )
        .arg(
            Arg::new("fail-fast")
                .long("fail-fast")
                .help("Abort on the first failed height query instead of retrying")
                .action(ArgAction::SetTrue)
                .conflicts_with("retries"),
        )
        .arg(
            Arg::new("retries")
                .short('r')
                .long("retries")
                .value_name("N")
                .help("Attempts per height query before giving up")
                .value_parser(value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .help("Timeout for a single height query")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("10"),
        )
        .arg(
            Arg::new("concurrent")
                .long("concurrent")
                .help("Poll candidate nodes concurrently")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .help("Also write logs to DIR/run.log, rotating the previous run's file")
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Parse command-line arguments (including the program name).
///
/// A missing seed or candidate list yields [`MonitorError::InvalidArguments`]
/// carrying the usage line; no network activity happens here.
pub fn parse_args<I, T>(args: I) -> Result<ParsedArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            return match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    Ok(ParsedArgs::Info(e))
                }
                _ => Err(MonitorError::InvalidArguments(clap_message(&e))),
            };
        }
    };

    let seed = matches.get_one::<String>("seed");
    let nodes: Vec<&String> =
        matches.get_many::<String>("nodes").map(|values| values.collect()).unwrap_or_default();

    let seed = match seed {
        Some(seed) if !nodes.is_empty() => Endpoint::parse(seed)?,
        _ => {
            return Err(MonitorError::InvalidArguments(format!(
                "expected a seed endpoint followed by at least one node endpoint\n\nUsage: {}",
                USAGE
            )));
        }
    };
    let candidates = nodes.into_iter().map(|node| Endpoint::parse(node)).collect::<Result<Vec<_>>>()?;

    let interval = matches.get_one::<u64>("interval").copied().unwrap_or(10);
    let window = matches.get_one::<u64>("window").copied().unwrap_or(3);
    let timeout = matches.get_one::<u64>("timeout").copied().unwrap_or(10);
    let stuck_rule = matches
        .get_one::<String>("stuck-rule")
        .map(|rule| rule.parse::<StuckRule>())
        .transpose()?
        .unwrap_or_default();

    let retry = if matches.get_flag("fail-fast") {
        RetryPolicy::fail_fast()
    } else {
        match matches.get_one::<u32>("retries") {
            Some(&max_attempts) => RetryPolicy {
                max_attempts,
                ..RetryPolicy::default()
            },
            None => RetryPolicy::default(),
        }
    };

    let window_size = usize::try_from(window)
        .map_err(|_| MonitorError::InvalidArguments(format!("window {} is too large", window)))?;

    let config = MonitorConfig::new()
        .with_poll_interval(Duration::from_secs(interval))
        .with_window_size(window_size)
        .with_stuck_rule(stuck_rule)
        .with_retry_policy(retry)
        .with_request_timeout(Duration::from_secs(timeout))
        .with_concurrent_polling(matches.get_flag("concurrent"));

    let level = matches.get_one::<String>("log-level").map(String::as_str).unwrap_or("info");
    let log_level =
        parse_level(level).map_err(|e| MonitorError::InvalidArguments(e.to_string()))?;

    Ok(ParsedArgs::Run(Box::new(CliArgs {
        seed,
        candidates,
        config,
        log_level,
        log_dir: matches.get_one::<PathBuf>("log-dir").cloned(),
    })))
}

/// Process exit status for the result of a run. `Ok(None)` is an interrupted run.
pub fn exit_code(result: &Result<Option<MonitorOutcome>>) -> i32 {
    match result {
        Ok(Some(_)) => 0,
        Ok(None) => INTERRUPTED_EXIT_CODE,
        Err(e) => e.exit_code(),
    }
}

/// Clap's rendered error without its leading `error: ` tag.
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered.strip_prefix("error: ").unwrap_or(&rendered).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> CliArgs {
        match parse_args(args.iter().copied()).unwrap() {
            ParsedArgs::Run(args) => *args,
            ParsedArgs::Info(e) => panic!("unexpected info output: {}", e),
        }
    }

    #[test]
    fn test_defaults() {
        let args = run_args(&["sync-monitor", "seed:8545", "node-1:8545", "node-2:8545"]);

        assert_eq!(args.seed.as_str(), "http://seed:8545");
        assert_eq!(args.candidates.len(), 2);
        assert_eq!(args.config.window_size, 3);
        assert_eq!(args.config.poll_interval, Duration::from_secs(10));
        assert_eq!(args.config.stuck_rule, StuckRule::Literal);
        assert_eq!(args.config.retry, RetryPolicy::default());
        assert!(!args.config.concurrent_polling);
        assert_eq!(args.log_level, LevelFilter::INFO);
        assert!(args.log_dir.is_none());
    }

    #[test]
    fn test_options() {
        let args = run_args(&[
            "sync-monitor",
            "--interval",
            "2",
            "--window",
            "5",
            "--stuck-rule",
            "non-increasing",
            "--fail-fast",
            "--timeout",
            "3",
            "--concurrent",
            "--log-level",
            "debug",
            "--log-dir",
            "/tmp/sync-logs",
            "http://seed:8545",
            "http://node-1:8545",
        ]);

        assert_eq!(args.config.poll_interval, Duration::from_secs(2));
        assert_eq!(args.config.window_size, 5);
        assert_eq!(args.config.stuck_rule, StuckRule::NonIncreasing);
        assert_eq!(args.config.retry.max_attempts, 1);
        assert_eq!(args.config.request_timeout, Duration::from_secs(3));
        assert!(args.config.concurrent_polling);
        assert_eq!(args.log_level, LevelFilter::DEBUG);
        assert_eq!(args.log_dir, Some(PathBuf::from("/tmp/sync-logs")));
    }

    #[test]
    fn test_retries_option() {
        let args = run_args(&["sync-monitor", "--retries", "5", "seed:1", "node:2"]);
        assert_eq!(args.config.retry.max_attempts, 5);
    }

    #[test]
    fn test_seed_only_is_invalid_with_usage() {
        let err = parse_args(["sync-monitor", "seed:8545"]).unwrap_err();
        match err {
            MonitorError::InvalidArguments(msg) => assert!(msg.contains("Usage:")),
            other => panic!("Expected InvalidArguments, got {:?}", other),
        }
        assert_eq!(
            parse_args(["sync-monitor", "seed:8545"]).unwrap_err().exit_code(),
            1
        );
    }

    #[test]
    fn test_no_arguments_is_invalid() {
        assert!(matches!(parse_args(["sync-monitor"]), Err(MonitorError::InvalidArguments(_))));
    }

    #[test]
    fn test_bad_values_are_invalid() {
        assert!(matches!(
            parse_args(["sync-monitor", "--window", "0", "seed:1", "node:2"]),
            Err(MonitorError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_args(["sync-monitor", "--stuck-rule", "sideways", "seed:1", "node:2"]),
            Err(MonitorError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_args(["sync-monitor", "--fail-fast", "--retries", "2", "seed:1", "node:2"]),
            Err(MonitorError::InvalidArguments(_))
        ));
        assert!(matches!(
            parse_args(["sync-monitor", "seed:1", "ftp://node:2"]),
            Err(MonitorError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_clap_errors_are_not_double_tagged() {
        let err = parse_args(["sync-monitor", "--bogus", "seed:1", "node:2"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid arguments: unexpected argument"), "got: {}", msg);
        assert!(!msg.contains("error:"));
    }

    #[test]
    fn test_exit_codes() {
        let outcome = MonitorOutcome {
            seed_height: 100,
            rounds: 3,
            synced: vec![Endpoint::parse("node-1:8545").unwrap()],
        };
        assert_eq!(exit_code(&Ok(Some(outcome))), 0);
        assert_eq!(exit_code(&Ok(None)), INTERRUPTED_EXIT_CODE);

        let stuck = MonitorError::StuckDetected {
            endpoint: Endpoint::parse("node-1:8545").unwrap(),
            oldest: 50,
            newest: 50,
        };
        assert_eq!(exit_code(&Err(stuck)), 1);
        assert_eq!(exit_code(&Err(MonitorError::Io(std::io::Error::other("closed")))), 1);
    }

    #[test]
    fn test_help_is_info() {
        assert!(matches!(parse_args(["sync-monitor", "--help"]), Ok(ParsedArgs::Info(_))));
        assert!(matches!(parse_args(["sync-monitor", "--version"]), Ok(ParsedArgs::Info(_))));
    }
}
