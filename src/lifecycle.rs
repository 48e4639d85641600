//! Lifecycle management for background tasks.
//!
//! Every long-running component (worker, results listener, reporter) owns
//! one `Lifecycle`: `start()` spawns the task, `close()` signals cancellation
//! and waits for the task to observe it and exit. Cancellation is cooperative
//! via the `Shutdown` handle; a task checks it between units of work and is
//! never interrupted mid-invocation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// State of a lifecycle-managed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
}

/// Start/signal-stop/join control for one background task.
#[derive(Debug)]
pub struct Lifecycle {
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Option<JoinHandle<()>>,
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            shutdown_rx,
            handle: None,
            state: LifecycleState::Created,
        }
    }

    /// A cancellation handle for the task to poll or await.
    pub fn shutdown(&self) -> Shutdown {
        Shutdown {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Spawn the task. The future should exit promptly once the shutdown
    /// handle it captured is signalled.
    pub fn start<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle = Some(tokio::spawn(task));
        self.state = LifecycleState::Running;
    }

    /// Signal cancellation and block until the task has exited.
    ///
    /// Safe to call if the task was never started or has already finished.
    pub async fn close(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log::error!("task panicked during shutdown: {err}");
            }
        }
        self.state = LifecycleState::Stopped;
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation handle held by a running task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Non-blocking check, for tight loops that must not suspend.
    pub fn is_signalled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the shutdown signal has been sent.
    pub async fn signalled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                // Lifecycle dropped; treat as shutdown
                break;
            }
        }
    }
}

/// A single-use guarded action: `fire()` succeeds exactly once for the
/// lifetime of the run, no matter how many tasks race on it. Used to stop
/// the whole run on the first failing outcome.
#[derive(Debug)]
pub struct StopTrigger {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

impl StopTrigger {
    /// Create the trigger plus the receiver the orchestrator waits on.
    pub fn new() -> (Arc<Self>, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Arc::new(Self {
                fired: AtomicBool::new(false),
                tx,
            }),
            rx,
        )
    }

    /// Fire the trigger. Returns true only for the single caller that wins.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let _ = self.tx.send(true);
            true
        } else {
            false
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}
