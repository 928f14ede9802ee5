//! Command-line interface for the sync monitor.

use std::io;
use std::process;

use tokio::signal;
use tokio::task::JoinError;

use sync_monitor::cli::{exit_code, parse_args, CliArgs, ParsedArgs};
use sync_monitor::{
    init_logging, JsonRpcHeightSource, LogFileConfig, LoggingConfig, MonitorError,
    MonitorOutcome, Reporter, SyncMonitor,
};

#[tokio::main]
async fn main() {
    let args = match parse_args(std::env::args_os()) {
        Ok(ParsedArgs::Run(args)) => *args,
        Ok(ParsedArgs::Info(info)) => {
            let _ = info.print();
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    };

    let log_guard = match init_logging(LoggingConfig {
        level: Some(args.log_level),
        console: true,
        file: args.log_dir.clone().map(LogFileConfig::new),
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    tracing::info!("Starting sync monitor v{}", sync_monitor::VERSION);
    tracing::info!("Seed node: {}", args.seed);
    tracing::info!("Candidate nodes: {}", args.candidates.len());

    let result = run(args).await;
    match &result {
        Ok(Some(outcome)) => tracing::info!(
            "{} node(s) reached seed height {} in {} round(s)",
            outcome.synced.len(),
            outcome.seed_height,
            outcome.rounds
        ),
        Ok(None) => tracing::warn!("Received shutdown signal (Ctrl-C), stopping"),
        Err(e) => tracing::error!(category = e.category(), "Monitoring failed: {}", e),
    }
    let code = exit_code(&result);

    // process::exit skips destructors; flush the file log first
    drop(log_guard);
    process::exit(code);
}

/// Run the monitor with a stdout reporter. `Ok(None)` means the run was interrupted.
///
/// A reporter that can no longer write its output ends the run with an I/O error.
async fn run(args: CliArgs) -> Result<Option<MonitorOutcome>, MonitorError> {
    let source = JsonRpcHeightSource::new(args.config.request_timeout)
        .map_err(|e| MonitorError::Config(format!("failed to build HTTP client: {}", e)))?;

    let mut monitor = SyncMonitor::new(args.config, args.seed, args.candidates, source)?;
    let mut reporter = tokio::spawn(Reporter::new(tokio::io::stdout()).run(monitor.subscribe()));

    let result = tokio::select! {
        result = monitor.run() => Some(result),
        _ = signal::ctrl_c() => None,
        reported = &mut reporter => {
            reporter_result(reported)?;
            return Err(MonitorError::Io(io::Error::other("reporter stopped before the run ended")));
        }
    };

    // Closing the bus lets the reporter drain and finish
    drop(monitor);
    let reported = reporter_result(reporter.await);

    match result {
        Some(outcome) => {
            let outcome = outcome?;
            reported?;
            Ok(Some(outcome))
        }
        None => Ok(None),
    }
}

fn reporter_result<W>(joined: Result<io::Result<W>, JoinError>) -> Result<(), MonitorError> {
    match joined {
        Ok(written) => written.map(|_| ()).map_err(MonitorError::Io),
        Err(e) => Err(MonitorError::Io(io::Error::other(e.to_string()))),
    }
}
