//! # Sync State
//!
//! Status snapshot exposed to the UI and the outcome type of a manual or
//! reconnect-triggered sync.

use crate::client::sync::engine::FullSyncReport;
use chrono::{DateTime, Utc};
use std::fmt;

/// Catalog download progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogProgress {
    pub items_so_far: usize,
    pub total: u64,
}

impl CatalogProgress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.items_so_far as f64 / self.total as f64).min(1.0) as f32
    }
}

/// Point-in-time view of the offline machinery
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub is_preloading: bool,
    pub pending_count: u64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub catalog_progress: Option<CatalogProgress>,
    /// Full syncs started since the coordinator was created
    pub sync_runs: u64,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_online: false,
            is_syncing: false,
            is_preloading: false,
            pending_count: 0,
            last_sync_time: None,
            last_sync_error: None,
            catalog_progress: None,
            sync_runs: 0,
        }
    }
}

/// Why a sync request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadySyncing,
    Offline,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::AlreadySyncing => "already syncing",
            RejectReason::Offline => "offline",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`SyncCoordinator::trigger_sync`](super::SyncCoordinator::trigger_sync)
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Rejected(RejectReason),
    Finished(FullSyncReport),
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        match self {
            SyncOutcome::Rejected(_) => false,
            SyncOutcome::Finished(report) => report.success(),
        }
    }

    pub fn synced_count(&self) -> usize {
        match self {
            SyncOutcome::Rejected(_) => 0,
            SyncOutcome::Finished(report) => report.synced_count(),
        }
    }

    pub fn errors(&self) -> Vec<String> {
        match self {
            SyncOutcome::Rejected(reason) => vec![reason.to_string()],
            SyncOutcome::Finished(report) => report.errors(),
        }
    }

    pub fn rejection(&self) -> Option<RejectReason> {
        match self {
            SyncOutcome::Rejected(reason) => Some(*reason),
            SyncOutcome::Finished(_) => None,
        }
    }

    pub fn report(&self) -> Option<&FullSyncReport> {
        match self {
            SyncOutcome::Rejected(_) => None,
            SyncOutcome::Finished(report) => Some(report),
        }
    }
}
