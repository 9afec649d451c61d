//! Single-run coordinator: rejects overlapping runs and records status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{error, info};

use crate::documents::DocumentStore;
use crate::error::SyncError;
use crate::reconcile::{Reconciler, SyncReport};
use crate::remote::RemoteStore;
use crate::types::Settings;

/// Sync status for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Completed { report: SyncReport },
    Failed { error: String, hint: String },
}

/// Result of asking the coordinator to sync.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Failed { error: SyncError, hint: &'static str },
    /// Another run was in flight; this request was dropped.
    AlreadyRunning,
}

impl SyncOutcome {
    /// Notice text for the user.
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Completed(report) => report.summary(),
            SyncOutcome::Failed { error, hint } => format!(
                "Sync Failed. \nError Message:\n{} \nPossible Solution:\n{}",
                error, hint
            ),
            SyncOutcome::AlreadyRunning => "Syncing already in process...".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }
}

/// Owns the run-state token. At most one run holds it at a time.
#[derive(Debug)]
pub struct SyncCoordinator {
    running: AtomicBool,
    status: Mutex<SyncStatus>,
}

/// Proof of holding the run token. Dropping it releases the token, whether
/// the run finished, failed or its future was dropped mid-way.
#[derive(Debug)]
pub struct RunGuard<'a> {
    coordinator: &'a SyncCoordinator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.coordinator.lock_status();
        if *status == SyncStatus::Syncing {
            *status = SyncStatus::Idle;
        }
        drop(status);
        self.coordinator.running.store(false, Ordering::Release);
    }
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            status: Mutex::new(SyncStatus::Idle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get current sync status.
    pub fn status(&self) -> SyncStatus {
        self.lock_status().clone()
    }

    /// Take the run token, or `None` when a run is in flight.
    pub fn try_acquire(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { coordinator: self })
    }

    /// Run one sync unless another is in flight.
    pub async fn start_sync<D, R>(&self, documents: &D, remote: &R, settings: &Settings) -> SyncOutcome
    where
        D: DocumentStore,
        R: RemoteStore,
    {
        let Some(_guard) = self.try_acquire() else {
            info!("Syncing already in process...");
            return SyncOutcome::AlreadyRunning;
        };
        self.set_status(SyncStatus::Syncing);

        match Reconciler::new(documents, remote, settings).run().await {
            Ok(report) => {
                self.set_status(SyncStatus::Completed {
                    report: report.clone(),
                });
                SyncOutcome::Completed(report)
            }
            Err(e) => {
                let hint = e.hint();
                error!(error = %e, hint, "Sync failed");
                self.set_status(SyncStatus::Failed {
                    error: e.to_string(),
                    hint: hint.to_string(),
                });
                SyncOutcome::Failed { error: e, hint }
            }
        }
    }

    fn set_status(&self, status: SyncStatus) {
        *self.lock_status() = status;
    }

    fn lock_status(&self) -> MutexGuard<'_, SyncStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
