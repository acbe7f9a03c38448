//! # Network Monitor
//!
//! Tracks whether the store server is reachable and notifies subscribers on
//! every real online/offline transition.
//!
//! ## Signals
//!
//! - **Native signal**: the host platform reports link up/down through
//!   [`ConnectivityMonitor::report_native_status`]. Offline takes effect at
//!   once; online is trusted until the next probe says otherwise.
//! - **Active probe**: a periodic `HEAD` against the health endpoint with a
//!   hard timeout. Any failure counts as offline.
//!
//! Subscribers only hear about transitions, never about repeated identical
//! observations. A panicking subscriber is logged and skipped.

use crate::client::api::RemoteService;
use crate::shared::AppConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Effective connectivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectionStatus::Online
        } else {
            ConnectionStatus::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Online => "online",
            ConnectionStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by [`ConnectivityMonitor::status`]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStatus {
    pub is_online: bool,
    pub last_status_change: DateTime<Utc>,
    pub time_since_change: chrono::Duration,
    pub subscriber_count: usize,
}

/// Transition callback: receives the new status and the online flag
pub type StatusListener = Arc<dyn Fn(ConnectionStatus, bool) + Send + Sync>;

struct MonitorInner {
    remote: Arc<dyn RemoteService>,
    probe_interval: Duration,
    probe_timeout: Duration,
    is_online: AtomicBool,
    native_online: AtomicBool,
    last_status_change: Mutex<DateTime<Utc>>,
    listeners: RwLock<HashMap<Uuid, (u64, StatusListener)>>,
    next_order: AtomicU64,
}

/// Connectivity monitor shared by the coordinator and the UI
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
    probe_task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("is_online", &self.is_online())
            .field("probe_interval", &self.inner.probe_interval)
            .field("probe_timeout", &self.inner.probe_timeout)
            .finish()
    }
}

/// Handle returned by [`ConnectivityMonitor::subscribe`]
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    monitor: Weak<MonitorInner>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop receiving notifications. Returns false if already removed.
    pub fn unsubscribe(self) -> bool {
        match self.monitor.upgrade() {
            Some(inner) => inner.remove_listener(self.id),
            None => false,
        }
    }
}

impl ConnectivityMonitor {
    /// Create a monitor; the initial state mirrors the native signal
    pub fn new(
        remote: Arc<dyn RemoteService>,
        probe_interval: Duration,
        probe_timeout: Duration,
        initially_online: bool,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                remote,
                probe_interval,
                probe_timeout,
                is_online: AtomicBool::new(initially_online),
                native_online: AtomicBool::new(initially_online),
                last_status_change: Mutex::new(Utc::now()),
                listeners: RwLock::new(HashMap::new()),
                next_order: AtomicU64::new(0),
            }),
            probe_task: Mutex::new(None),
        }
    }

    pub fn from_config(remote: Arc<dyn RemoteService>, config: &AppConfig) -> Self {
        Self::new(remote, config.probe_interval, config.probe_timeout, true)
    }

    /// Current effective state, read fresh on every call
    pub fn is_online(&self) -> bool {
        self.inner.is_online.load(Ordering::Acquire)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus::from_online(self.is_online())
    }

    pub fn status(&self) -> MonitorStatus {
        let last_status_change = *self
            .inner
            .last_status_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        MonitorStatus {
            is_online: self.is_online(),
            last_status_change,
            time_since_change: Utc::now() - last_status_change,
            subscriber_count: self.inner.listener_count(),
        }
    }

    /// Register a transition callback
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ConnectionStatus, bool) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let order = self.inner.next_order.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (order, Arc::new(listener)));

        debug!("Connectivity subscriber {} registered", id);
        Subscription {
            id,
            monitor: Arc::downgrade(&self.inner),
        }
    }

    /// Feed the platform's link up/down signal
    pub fn report_native_status(&self, online: bool) {
        self.inner.native_online.store(online, Ordering::Release);
        if online {
            info!("Native connectivity signal: online");
        } else {
            info!("Native connectivity signal: offline");
        }
        self.inner.transition(online);
    }

    /// Run one active probe and apply its result
    pub async fn check_connection(&self) -> bool {
        self.inner.check_connection().await
    }

    /// Spawn the periodic probe task. Must be called inside a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.probe_task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.probe_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else { break };
                inner.check_connection().await;
            }
        }));

        info!("Connectivity monitor started (probe every {:?})", period);
    }

    /// Stop probing and drop every subscriber
    pub fn shutdown(&self) {
        if let Some(task) = self
            .probe_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("Connectivity monitor stopped");
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        if let Some(task) = self
            .probe_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl MonitorInner {
    async fn check_connection(&self) -> bool {
        if !self.native_online.load(Ordering::Acquire) {
            self.transition(false);
            return false;
        }

        let online = match tokio::time::timeout(self.probe_timeout, self.remote.health_check()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("Health probe failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Health probe timed out after {:?}", self.probe_timeout);
                false
            }
        };

        // The OS may have reported an outage while the probe was in flight
        let online = online && self.native_online.load(Ordering::Acquire);
        self.transition(online);
        online
    }

    fn transition(&self, online: bool) {
        let previous = self.is_online.swap(online, Ordering::AcqRel);
        if previous == online {
            return;
        }

        *self
            .last_status_change
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();

        let status = ConnectionStatus::from_online(online);
        if online {
            info!("Connection restored");
        } else {
            warn!("Connection lost");
        }
        self.notify(status, online);
    }

    fn notify(&self, status: ConnectionStatus, online: bool) {
        let mut snapshot: Vec<(u64, Uuid, StatusListener)> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, (order, listener))| (*order, *id, Arc::clone(listener)))
            .collect();
        snapshot.sort_by_key(|(order, _, _)| *order);

        for (_, id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(status, online))).is_err() {
                error!("Connectivity subscriber {} panicked on {} notification", id, status);
            }
        }
    }

    fn remove_listener(&self, id: Uuid) -> bool {
        let removed = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            debug!("Connectivity subscriber {} removed", id);
        }
        removed
    }

    fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
