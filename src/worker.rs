//! Worker: repeatedly invokes the command and publishes outcomes.
//!
//! A worker is a dumb parallel executor. It performs no assertions and no
//! retries — a failing invocation is a normal outcome. The bounded results
//! queue is the only backpressure mechanism: a slow consumer blocks the
//! `send` and naturally throttles all workers.

use tokio::sync::mpsc;

use crate::command::ShellCommand;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::outcome::Outcome;

/// Lifecycle-managed invocation loop.
pub struct Worker {
    command: ShellCommand,
    results: mpsc::Sender<Outcome>,
    lifecycle: Lifecycle,
}

impl Worker {
    pub fn new(command: ShellCommand, results: mpsc::Sender<Outcome>) -> Self {
        Self {
            command,
            results,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Start the invocation loop on its own task.
    ///
    /// The loop checks the cancellation signal before each invocation; an
    /// invocation already in flight always runs to completion and its
    /// outcome is still published.
    pub fn start(&mut self) {
        let command = self.command.clone();
        let results = self.results.clone();
        let shutdown = self.lifecycle.shutdown();

        self.lifecycle.start(async move {
            loop {
                if shutdown.is_signalled() {
                    break;
                }
                let outcome = command.run().await;
                if results.send(outcome).await.is_err() {
                    // Queue closed; nobody is listening anymore
                    break;
                }
            }
        });
    }

    /// Signal the worker to stop and wait for it to exit.
    pub async fn close(&mut self) {
        self.lifecycle.close().await;
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}
