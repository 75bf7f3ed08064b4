//! Polling file monitor.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ChangeSource, ChangeTrigger};

/// Emits a change whenever the file's modification time or length differs
/// from the previous observation. The file appearing or disappearing counts.
#[derive(Debug, Clone)]
pub struct FilePoller {
    path: PathBuf,
    interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

/// Shortest poll interval; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl FilePoller {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    async fn fingerprint(&self) -> Option<Fingerprint> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        Some(Fingerprint {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

impl ChangeSource for FilePoller {
    fn spawn(self, trigger: ChangeTrigger, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last = self.fingerprint().await;
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let current = self.fingerprint().await;
                        if current != last {
                            debug!(path = %self.path.display(), "declaration file changed");
                            last = current;
                            trigger.notify();
                        }
                    }
                }
            }
            debug!(path = %self.path.display(), "stopped polling");
        })
    }
}
