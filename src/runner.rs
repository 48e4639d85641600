//! Run orchestration: wires workers, listener, and reporter together.
//!
//! Builds the bounded results queue, starts every component, waits for the
//! deadline (or the stop-on-failure trigger), then shuts down in order:
//! workers first (concurrently), then the listener — which by then has
//! drained every in-flight outcome from the closed queue — then the
//! reporter, whose final line reflects the final statistics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;

use crate::command::ShellCommand;
use crate::error::{FlakrError, Result};
use crate::lifecycle::StopTrigger;
use crate::listener::ResultsListener;
use crate::reporter::Reporter;
use crate::sink::JsonLinesSink;
use crate::stats::{RunStats, Snapshot};
use crate::worker::Worker;

/// Everything a run needs, validated before anything starts.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// The command to invoke repeatedly
    pub command: ShellCommand,
    /// Number of concurrent workers
    pub parallel: usize,
    /// Minimum wall-clock run time; in-flight invocations finish after it
    pub duration: Duration,
    /// Reporter tick interval
    pub refresh: Duration,
    /// Optional JSON-lines results file
    pub output_file: Option<PathBuf>,
    /// Stop the whole run on the first failing outcome
    pub stop_on_failure: bool,
}

impl RunnerConfig {
    fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.parallel == 0 {
            problems.push("parallel must be at least 1".to_string());
        }
        if self.duration.is_zero() {
            problems.push("duration must be greater than zero".to_string());
        }
        if self.refresh.is_zero() {
            problems.push("refresh must be greater than zero".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FlakrError::construction(problems))
        }
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Statistics reflecting every outcome produced by every worker
    pub snapshot: Snapshot,
    /// True when the stop-on-failure trigger ended the run early
    pub stopped_early: bool,
}

/// Execute one full run to completion.
pub async fn run(config: RunnerConfig) -> Result<RunSummary> {
    config.validate()?;

    // Open the sink first: an unwritable output path must fail the run
    // before any worker starts
    let sink = match &config.output_file {
        Some(path) => Some(JsonLinesSink::create(path).await?),
        None => None,
    };

    let stats = Arc::new(RunStats::new());
    // Bounded to the worker count for mild backpressure smoothing
    let (results_tx, results_rx) = mpsc::channel(config.parallel);
    let (stop, mut stop_rx) = StopTrigger::new();

    let mut builder = ResultsListener::builder().results(results_rx).stats(stats.clone());
    if let Some(sink) = sink {
        builder = builder.sink(Box::new(sink));
    }
    if config.stop_on_failure {
        builder = builder.stop_on_failure(stop.clone());
    }
    let mut listener = builder.build()?;

    let mut workers: Vec<Worker> = (0..config.parallel)
        .map(|_| Worker::new(config.command.clone(), results_tx.clone()))
        .collect();
    drop(results_tx);

    let mut reporter = Reporter::new(stats.clone(), config.refresh);

    log::info!(
        "running {} across {} worker(s) for {:?}",
        config.command,
        config.parallel,
        config.duration
    );

    for worker in &mut workers {
        worker.start();
    }
    listener.start();
    reporter.start();

    let stopped_early = tokio::select! {
        _ = tokio::time::sleep(config.duration) => false,
        _ = stop_rx.changed() => true,
    };
    if stopped_early {
        log::info!("run stopped early on first failure");
    }

    // Shutdown order matters: workers first so the queue closes, listener
    // second so every queued outcome is recorded, reporter last so the
    // final line shows the final counts
    join_all(workers.iter_mut().map(|worker| worker.close())).await;
    drop(workers);
    listener.close().await;
    reporter.close().await;

    let snapshot = stats.snapshot();
    log::info!(
        "run complete: {} runs, {} successful, {} failed",
        snapshot.runs,
        snapshot.successful,
        snapshot.failed
    );

    Ok(RunSummary { snapshot, stopped_early })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bash(target: &str) -> ShellCommand {
        let root = vec!["bash".to_string(), "-c".to_string()];
        ShellCommand::new(&root, target).unwrap()
    }

    fn config(target: &str) -> RunnerConfig {
        RunnerConfig {
            command: bash(target),
            parallel: 1,
            duration: Duration::from_millis(200),
            refresh: Duration::from_millis(50),
            output_file: None,
            stop_on_failure: false,
        }
    }

    #[test]
    fn test_validate_aggregates_problems() {
        let cfg = RunnerConfig {
            parallel: 0,
            duration: Duration::ZERO,
            refresh: Duration::ZERO,
            ..config("true")
        };
        let err = cfg.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("parallel"));
        assert!(message.contains("duration"));
        assert!(message.contains("refresh"));
    }

    #[tokio::test]
    async fn test_run_rejects_zero_parallel() {
        let cfg = RunnerConfig { parallel: 0, ..config("true") };
        assert!(run(cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_run_unwritable_output_fails_before_start() {
        let cfg = RunnerConfig {
            output_file: Some(PathBuf::from("/no/such/dir/results.jsonl")),
            ..config("true")
        };
        let err = run(cfg).await.unwrap_err();
        assert!(matches!(err, FlakrError::OutputFile { .. }));
    }
}
