//! Change watch loop.
//!
//! A change source signals that the declarations may have changed. A single
//! consumer task reloads the declared tables and runs a reconcile pass for
//! each signal. The signal queue holds one entry, so a burst of changes
//! during a pass collapses into one follow-up pass.

mod file;

pub use file::FilePoller;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::reconcile::{ReconcileReport, Reconciler};
use crate::source::TableSource;

/// Sending side of the change queue.
#[derive(Debug, Clone)]
pub struct ChangeTrigger {
    tx: mpsc::Sender<()>,
}

impl ChangeTrigger {
    /// Queue a pass. Returns `false` when a pass is already queued or the
    /// loop is gone.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("pass already queued, coalescing change");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Something that emits change signals until cancelled.
pub trait ChangeSource: Send + 'static {
    fn spawn(self, trigger: ChangeTrigger, cancel: CancellationToken) -> JoinHandle<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching,
}

/// Published after every pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchStats {
    /// Passes that reconciled.
    pub passes: u64,
    /// Passes skipped because the declarations could not be read.
    pub skipped: u64,
    /// Passes that could not list the registry.
    pub failed: u64,
    /// Last successfully loaded declared table names.
    pub declared: Vec<String>,
    pub last_report: Option<ReconcileReport>,
}

impl WatchStats {
    pub fn completed(&self) -> u64 {
        self.passes + self.skipped + self.failed
    }
}

struct Running {
    cancel: CancellationToken,
    trigger: ChangeTrigger,
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

pub struct WatchLoop {
    reconciler: Arc<Reconciler>,
    source: Arc<dyn TableSource>,
    stats: watch::Sender<WatchStats>,
    running: Option<Running>,
}

impl WatchLoop {
    pub fn new(reconciler: Arc<Reconciler>, source: Arc<dyn TableSource>) -> Self {
        let (stats, _) = watch::channel(WatchStats::default());
        Self {
            reconciler,
            source,
            stats,
            running: None,
        }
    }

    pub fn state(&self) -> WatchState {
        if self.running.is_some() {
            WatchState::Watching
        } else {
            WatchState::Idle
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WatchStats> {
        self.stats.subscribe()
    }

    /// Start watching. The first pass is queued immediately.
    ///
    /// Does nothing when already watching.
    pub fn start<S: ChangeSource>(&mut self, changes: S) {
        if self.running.is_some() {
            warn!("watch loop already running");
            return;
        }

        let (tx, rx) = mpsc::channel(1);
        let trigger = ChangeTrigger { tx };
        let cancel = CancellationToken::new();

        trigger.notify();
        let consumer = tokio::spawn(run_passes(
            rx,
            cancel.clone(),
            Arc::clone(&self.reconciler),
            Arc::clone(&self.source),
            self.stats.clone(),
        ));
        let producer = changes.spawn(trigger.clone(), cancel.clone());

        info!(source = %self.source.label(), "watching for declaration changes");
        self.running = Some(Running {
            cancel,
            trigger,
            producer,
            consumer,
        });
    }

    /// Queue a pass by hand. Returns `false` when idle or already queued.
    pub fn notify(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| running.trigger.notify())
    }

    /// Stop watching and wait for the loop to wind down. An in-flight pass
    /// completes first.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.producer.await {
            warn!(error = %e, "change source task failed");
        }
        if let Err(e) = running.consumer.await {
            warn!(error = %e, "watch loop task failed");
        }
        info!("watch loop stopped");
    }
}

async fn run_passes(
    mut rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
    reconciler: Arc<Reconciler>,
    source: Arc<dyn TableSource>,
    stats: watch::Sender<WatchStats>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            signal = rx.recv() => {
                if signal.is_none() {
                    break;
                }
                run_pass(&reconciler, source.as_ref(), &stats).await;
            }
        }
    }
}

async fn run_pass(
    reconciler: &Reconciler,
    source: &dyn TableSource,
    stats: &watch::Sender<WatchStats>,
) {
    let declarations = match source.load().await {
        Ok(declarations) => declarations,
        Err(e) => {
            warn!(error = %e, "skipping pass, declarations unreadable");
            stats.send_modify(|s| s.skipped += 1);
            return;
        }
    };
    let names = declarations.names();

    match reconciler.reconcile_declarations(&declarations).await {
        Ok(report) => stats.send_modify(|s| {
            s.passes += 1;
            s.declared = names;
            s.last_report = Some(report);
        }),
        Err(e) => {
            warn!(error = %e, "reconcile pass failed");
            stats.send_modify(|s| {
                s.failed += 1;
                s.declared = names;
            });
        }
    }
}
