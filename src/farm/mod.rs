//! The farm: a set of account workers started, watched, and stopped
//! together.

pub mod energy;
pub mod supervisor;
mod worker;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::FarmConfig;
use crate::page::launch::LaunchReference;
use crate::page::SessionProvider;
use crate::Result;
use worker::AccountWorker;

/// Grace period for workers to wind down before they are abandoned.
const DEACTIVATE_GRACE: Duration = Duration::from_secs(30);

const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct WorkerHandle {
    account: String,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Aggregate farm state: how many of the configured accounts still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmStatus {
    pub live: usize,
    pub total: usize,
}

impl fmt::Display for FarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} accounts running", self.live, self.total)
    }
}

/// Owns the workers of one farm run. Each worker is an independent unit
/// of failure: it can die without its siblings noticing, and nothing it
/// does blocks the controller.
pub struct Farm {
    provider: Arc<dyn SessionProvider>,
    workers: Vec<WorkerHandle>,
}

impl Farm {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            provider,
            workers: Vec::new(),
        }
    }

    /// True while at least one worker task is alive.
    pub fn is_running(&self) -> bool {
        self.workers.iter().any(|w| !w.task.is_finished())
    }

    pub fn status(&self) -> FarmStatus {
        FarmStatus {
            live: self.workers.iter().filter(|w| !w.task.is_finished()).count(),
            total: self.workers.len(),
        }
    }

    /// Validate the config and start one worker per account, returning
    /// without waiting on them. Activating a running farm is a no-op that
    /// returns the current status.
    pub fn activate(&mut self, config: &FarmConfig) -> Result<FarmStatus> {
        if self.is_running() {
            info!("farm already active");
            return Ok(self.status());
        }
        let settings = config.worker_settings()?;

        self.workers.clear();
        for account in &config.accounts {
            let stop = Arc::new(AtomicBool::new(false));
            let worker = AccountWorker::new(
                account.name.clone(),
                LaunchReference::new(account.launch_reference.clone()),
                settings.clone(),
                Arc::clone(&self.provider),
                Arc::clone(&stop),
            );
            let task = tokio::spawn(worker.run());
            self.workers.push(WorkerHandle {
                account: account.name.clone(),
                stop,
                task,
            });
        }
        info!("farm activated with {} accounts", self.workers.len());
        Ok(self.status())
    }

    /// Signal every worker to stop, then wait out the grace period. A
    /// worker that overruns it is abandoned; its own teardown still
    /// closes the session. Deactivating a stopped farm is a no-op.
    pub async fn deactivate(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for w in &self.workers {
            w.stop.store(true, Ordering::Relaxed);
        }
        for w in self.workers.drain(..) {
            match tokio::time::timeout(DEACTIVATE_GRACE, w.task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("[{}] worker task failed: {err}", w.account),
                Err(_) => warn!(
                    "[{}] did not stop within {}s, abandoning",
                    w.account,
                    DEACTIVATE_GRACE.as_secs()
                ),
            }
        }
        info!("farm deactivated");
    }

    /// Resolve once every worker has exited on its own.
    pub async fn wait_idle(&self) {
        while self.is_running() {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }
}
