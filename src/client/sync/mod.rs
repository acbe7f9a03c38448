//! # Sync Coordinator
//!
//! Decides when sync passes run and exposes the status the UI renders.
//!
//! ## Architecture
//!
//! The coordinator ties together:
//! - **Network Monitor**: connectivity transitions drive reconnect syncs
//! - **Sync Engine**: the sales push and catalog pull themselves
//! - **Sync State**: the status snapshot and sync outcomes
//!
//! ## Behavior
//!
//! - At most one full sync runs at a time. A second request while one is in
//!   flight is rejected immediately, never queued.
//! - A transition to online schedules one sync after a settle delay. A newer
//!   transition cancels the pending one, so a flapping link produces a single
//!   sync timed from the last signal. A transition to offline cancels it too.
//! - The pending-sales count is refreshed on a timer and after every sync.
//! - Operators with a selling role get a one-time catalog download when the
//!   cache is empty.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pos_offline::client::local_db::{LocalDatabase, StoreLocation};
//! use pos_offline::client::sync::{ConnectivityMonitor, SyncCoordinator, SyncEngine};
//! use pos_offline::client::{Config, HttpRemote};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new();
//! let remote = Arc::new(HttpRemote::new(&config)?);
//! let store = Arc::new(LocalDatabase::open(StoreLocation::InMemory).await?);
//! let monitor = Arc::new(ConnectivityMonitor::from_config(remote.clone(), config.app()));
//! let engine = Arc::new(SyncEngine::new(store.clone(), remote, 100));
//!
//! let coordinator = SyncCoordinator::new(engine, monitor, config.app());
//! coordinator.start().await;
//!
//! let outcome = coordinator.trigger_sync().await;
//! println!("synced {} sales", outcome.synced_count());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod network_monitor;
pub mod sync_state;

pub use engine::{
    CatalogProgressFn, CatalogSyncReport, FullSyncReport, SaleSyncError, SalesSyncReport, SyncEngine, SyncIssue,
};
pub use network_monitor::{ConnectionStatus, ConnectivityMonitor, MonitorStatus, Subscription};
pub use sync_state::{CatalogProgress, RejectReason, SyncOutcome, SyncStatus};

use crate::client::error::{SyncError, SyncResult};
use crate::client::local_db::LocalDatabase;
use crate::client::types::Session;
use crate::shared::AppConfig;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct CoordinatorState {
    pending_count: u64,
    last_sync_time: Option<DateTime<Utc>>,
    last_sync_error: Option<String>,
}

/// Clears a busy flag when the owning pass ends, however it ends
struct FlagGuard<'a>(&'a AtomicBool);

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagGuard(flag))
    }
}

#[derive(Debug)]
struct CoordinatorInner {
    engine: Arc<SyncEngine>,
    store: Arc<LocalDatabase>,
    monitor: Arc<ConnectivityMonitor>,
    settle_delay: Duration,
    refresh_interval: Duration,
    retention: chrono::Duration,
    is_syncing: AtomicBool,
    is_preloading: AtomicBool,
    sync_runs: AtomicU64,
    state: RwLock<CoordinatorState>,
    catalog_progress: Mutex<Option<CatalogProgress>>,
    session: Mutex<Option<Session>>,
    /// Debounced reconnect sync, tagged with its generation
    pending_trigger: Mutex<Option<(u64, JoinHandle<()>)>>,
    trigger_generation: AtomicU64,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    subscription: Mutex<Option<Subscription>>,
}

/// Main sync coordinator
///
/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SyncCoordinator {
    pub fn new(engine: Arc<SyncEngine>, monitor: Arc<ConnectivityMonitor>, config: &AppConfig) -> Self {
        let store = Arc::clone(engine.store());
        Self {
            inner: Arc::new(CoordinatorInner {
                engine,
                store,
                monitor,
                settle_delay: config.reconnect_settle_delay,
                refresh_interval: config.pending_refresh_interval,
                retention: chrono::Duration::days(i64::from(config.sync_retention_days)),
                is_syncing: AtomicBool::new(false),
                is_preloading: AtomicBool::new(false),
                sync_runs: AtomicU64::new(0),
                state: RwLock::new(CoordinatorState::default()),
                catalog_progress: Mutex::new(None),
                session: Mutex::new(None),
                pending_trigger: Mutex::new(None),
                trigger_generation: AtomicU64::new(0),
                refresh_task: Mutex::new(None),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to connectivity changes and start the pending-count refresh.
    ///
    /// Must be called inside a tokio runtime. Calling it twice is a no-op.
    pub async fn start(&self) {
        {
            let mut subscription = lock(&self.inner.subscription);
            if subscription.is_some() {
                return;
            }

            let weak = Arc::downgrade(&self.inner);
            let handle = Handle::current();
            *subscription = Some(self.inner.monitor.subscribe(move |status, _online| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_connectivity_change(status, &handle);
                }
            }));
        }

        *lock(&self.inner.refresh_task) = Some(spawn_pending_refresh(
            Arc::downgrade(&self.inner),
            self.inner.refresh_interval,
        ));

        self.inner.refresh_pending_count().await;
        info!("Sync coordinator started");
    }

    /// Run one full sync unless offline or another sync is in flight
    pub async fn trigger_sync(&self) -> SyncOutcome {
        self.inner.trigger_sync().await
    }

    /// Remember the operator used for preload decisions after reconnects
    pub fn set_session(&self, session: Option<Session>) {
        *lock(&self.inner.session) = session;
    }

    pub fn session(&self) -> Option<Session> {
        lock(&self.inner.session).clone()
    }

    /// Download the catalog once if the cache is empty and the operator sells
    ///
    /// Returns `Ok(None)` when no download was needed or one is already running.
    pub async fn preload_catalog(&self, session: &Session) -> SyncResult<Option<CatalogSyncReport>> {
        self.inner.preload_catalog(session).await
    }

    /// Recount pending sales into the cached status
    pub async fn refresh_pending_count(&self) -> u64 {
        self.inner.refresh_pending_count().await
    }

    pub async fn status(&self) -> SyncStatus {
        let state = self.inner.state.read().await;
        SyncStatus {
            is_online: self.inner.monitor.is_online(),
            is_syncing: self.inner.is_syncing.load(Ordering::Acquire),
            is_preloading: self.inner.is_preloading.load(Ordering::Acquire),
            pending_count: state.pending_count,
            last_sync_time: state.last_sync_time,
            last_sync_error: state.last_sync_error.clone(),
            catalog_progress: *lock(&self.inner.catalog_progress),
            sync_runs: self.inner.sync_runs.load(Ordering::Acquire),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.is_syncing.load(Ordering::Acquire)
    }

    /// True while a reconnect sync is waiting out the settle delay
    pub fn has_scheduled_sync(&self) -> bool {
        lock(&self.inner.pending_trigger).is_some()
    }

    /// Cancel timers and stop listening to the monitor
    pub fn shutdown(&self) {
        self.inner.cancel_scheduled_sync();
        if let Some(task) = lock(&self.inner.refresh_task).take() {
            task.abort();
        }
        if let Some(subscription) = lock(&self.inner.subscription).take() {
            subscription.unsubscribe();
        }
        info!("Sync coordinator stopped");
    }
}

impl CoordinatorInner {
    async fn trigger_sync(&self) -> SyncOutcome {
        if !self.monitor.is_online() {
            info!("Sync rejected: offline");
            return SyncOutcome::Rejected(RejectReason::Offline);
        }

        let Some(_guard) = FlagGuard::acquire(&self.is_syncing) else {
            info!("Sync rejected: already syncing");
            return SyncOutcome::Rejected(RejectReason::AlreadySyncing);
        };

        let run = self.sync_runs.fetch_add(1, Ordering::AcqRel) + 1;
        info!(run, "Full sync started");

        let progress: CatalogProgressFn<'_> = &|so_far, total| self.set_progress(so_far, total);
        let report = self.engine.full_sync_with_progress(Some(progress)).await;
        *lock(&self.catalog_progress) = None;

        {
            let mut state = self.state.write().await;
            if report.success() {
                state.last_sync_time = Some(Utc::now());
            }
            state.last_sync_error = report.first_error();
        }

        if report.success() {
            match self.store.purge_old_synchronized_sales(self.retention).await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "Old synchronized sales purged"),
                Err(e) => warn!("Retention purge failed: {}", e),
            }
        }

        self.refresh_pending_count().await;

        info!(
            run,
            synced = report.synced_count(),
            issues = report.issues.len(),
            "Full sync finished"
        );
        SyncOutcome::Finished(report)
    }

    async fn preload_catalog(&self, session: &Session) -> SyncResult<Option<CatalogSyncReport>> {
        if !session.is_pos_operator() {
            debug!(user = %session.username, "Catalog preload skipped: role does not sell");
            return Ok(None);
        }

        if self.store.count_catalog_items().await? > 0 {
            return Ok(None);
        }

        if !self.monitor.is_online() {
            return Err(SyncError::Offline);
        }

        let Some(_guard) = FlagGuard::acquire(&self.is_preloading) else {
            debug!("Catalog preload already running");
            return Ok(None);
        };

        info!(user = %session.username, "Catalog cache empty, preloading");
        let progress: CatalogProgressFn<'_> = &|so_far, total| self.set_progress(so_far, total);
        let result = self.engine.sync_catalog(Some(progress)).await;
        *lock(&self.catalog_progress) = None;

        match result {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                self.state.write().await.last_sync_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn refresh_pending_count(&self) -> u64 {
        match self.store.count_pending_sales().await {
            Ok(count) => {
                self.state.write().await.pending_count = count;
                count
            }
            Err(e) => {
                warn!("Pending count refresh failed: {}", e);
                self.state.read().await.pending_count
            }
        }
    }

    fn set_progress(&self, items_so_far: usize, total: u64) {
        *lock(&self.catalog_progress) = Some(CatalogProgress { items_so_far, total });
    }

    fn on_connectivity_change(self: &Arc<Self>, status: ConnectionStatus, handle: &Handle) {
        match status {
            ConnectionStatus::Online => self.schedule_reconnect_sync(handle),
            ConnectionStatus::Offline => self.cancel_scheduled_sync(),
        }
    }

    fn schedule_reconnect_sync(self: &Arc<Self>, handle: &Handle) {
        let generation = self.trigger_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut slot = lock(&self.pending_trigger);
        if let Some((_, previous)) = slot.take() {
            previous.abort();
            debug!("Reconnect sync rescheduled");
        }

        let inner = Arc::clone(self);
        let task = handle.spawn(async move {
            tokio::time::sleep(inner.settle_delay).await;

            {
                let mut slot = lock(&inner.pending_trigger);
                if !matches!(slot.as_ref(), Some((current, _)) if *current == generation) {
                    return;
                }
                slot.take();
            }

            let outcome = inner.trigger_sync().await;
            match &outcome {
                SyncOutcome::Finished(report) => {
                    info!(synced = report.synced_count(), "Reconnect sync finished")
                }
                SyncOutcome::Rejected(reason) => debug!("Reconnect sync skipped: {}", reason),
            }

            let session = lock(&inner.session).clone();
            if let Some(session) = session {
                if let Err(e) = inner.preload_catalog(&session).await {
                    warn!("Catalog preload after reconnect failed: {}", e);
                }
            }
        });

        *slot = Some((generation, task));
    }

    fn cancel_scheduled_sync(&self) {
        if let Some((_, task)) = lock(&self.pending_trigger).take() {
            task.abort();
            debug!("Scheduled reconnect sync cancelled");
        }
    }
}

fn spawn_pending_refresh(inner: Weak<CoordinatorInner>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else { break };
            inner.refresh_pending_count().await;
        }
    })
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for CoordinatorInner {
    fn drop(&mut self) {
        if let Some((_, task)) = self
            .pending_trigger
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        if let Some(task) = self
            .refresh_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        if let Some(subscription) = self
            .subscription
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            subscription.unsubscribe();
        }
    }
}
