//! Results listener: the single consumer of the results queue.
//!
//! For every outcome it records statistics, optionally persists the outcome,
//! and optionally fires the stop-on-failure trigger. Draining has priority
//! over cancellation so outcomes buffered at shutdown are never lost; the
//! loop exits once the queue is closed and empty, or — if the queue is idle
//! but still open — once its own cancellation signal fires.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{FlakrError, Result};
use crate::lifecycle::{Lifecycle, LifecycleState, StopTrigger};
use crate::outcome::Outcome;
use crate::sink::OutcomeSink;
use crate::stats::RunStats;

/// Single consumer aggregating outcomes into [`RunStats`].
pub struct ResultsListener {
    results: Option<mpsc::Receiver<Outcome>>,
    stats: Arc<RunStats>,
    sink: Option<Box<dyn OutcomeSink>>,
    stop: Option<Arc<StopTrigger>>,
    lifecycle: Lifecycle,
}

/// Builder for [`ResultsListener`]. Missing required dependencies are
/// aggregated into a single construction error rather than failing on the
/// first one.
#[derive(Default)]
pub struct ResultsListenerBuilder {
    results: Option<mpsc::Receiver<Outcome>>,
    stats: Option<Arc<RunStats>>,
    sink: Option<Box<dyn OutcomeSink>>,
    stop: Option<Arc<StopTrigger>>,
}

impl ResultsListenerBuilder {
    /// The results queue to consume (required).
    pub fn results(mut self, results: mpsc::Receiver<Outcome>) -> Self {
        self.results = Some(results);
        self
    }

    /// The statistics store to record into (required).
    pub fn stats(mut self, stats: Arc<RunStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Optional persistence sink for every outcome.
    pub fn sink(mut self, sink: Box<dyn OutcomeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Optional trigger fired (exactly once) on the first failing outcome.
    pub fn stop_on_failure(mut self, stop: Arc<StopTrigger>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn build(self) -> Result<ResultsListener> {
        let mut problems = Vec::new();
        if self.results.is_none() {
            problems.push("missing results channel".to_string());
        }
        if self.stats.is_none() {
            problems.push("missing stats".to_string());
        }
        if !problems.is_empty() {
            return Err(FlakrError::construction(problems));
        }

        Ok(ResultsListener {
            results: self.results,
            stats: self.stats.unwrap_or_default(),
            sink: self.sink,
            stop: self.stop,
            lifecycle: Lifecycle::new(),
        })
    }
}

impl std::fmt::Debug for ResultsListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsListener")
            .field("results", &self.results)
            .field("stats", &self.stats)
            .field("sink", &self.sink.as_ref().map(|_| "dyn OutcomeSink"))
            .field("stop", &self.stop)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl ResultsListener {
    pub fn builder() -> ResultsListenerBuilder {
        ResultsListenerBuilder::default()
    }

    /// Start the consumer loop on its own task.
    pub fn start(&mut self) {
        let Some(mut results) = self.results.take() else {
            return;
        };
        let stats = self.stats.clone();
        let mut sink = self.sink.take();
        let stop = self.stop.clone();
        let mut shutdown = self.lifecycle.shutdown();

        self.lifecycle.start(async move {
            loop {
                tokio::select! {
                    biased;
                    received = results.recv() => {
                        let Some(outcome) = received else {
                            break;
                        };
                        handle(&outcome, &stats, sink.as_deref_mut(), stop.as_deref()).await;
                    }
                    _ = shutdown.signalled() => break,
                }
            }
        });
    }

    /// Signal the listener to stop and wait for it to exit. Outcomes already
    /// queued are still processed before the loop observes the signal.
    pub async fn close(&mut self) {
        self.lifecycle.close().await;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

async fn handle(
    outcome: &Outcome,
    stats: &RunStats,
    sink: Option<&mut (dyn OutcomeSink + 'static)>,
    stop: Option<&StopTrigger>,
) {
    stats.record(outcome);

    if let Some(sink) = sink {
        // Persistence failures are diagnostic only; the outcome is already
        // counted and the pipeline keeps running
        if let Err(err) = sink.append(outcome).await {
            log::error!("failed to persist outcome: {err}");
        }
    }

    if let Some(stop) = stop {
        if outcome.is_failure() && stop.fire() {
            log::info!("first failure observed (code {}), stopping run", outcome.code);
        }
    }
}
