/**
 * Application Context
 *
 * Owns exactly one store, one connectivity monitor and one sync coordinator
 * for the lifetime of the application, and exposes the small surface the UI
 * needs: record a sale, read the cached catalog, trigger a sync, render the
 * status and hear about connectivity changes.
 *
 * Startup order matters: the store is opened first, then connectivity is
 * probed once, then the coordinator starts listening, and finally the
 * catalog is preloaded for operators who sell. Shutdown reverses it so no
 * timer fires against a closed store.
 */
use crate::client::api::RemoteService;
use crate::client::config::Config;
use crate::client::error::StoreResult;
use crate::client::local_db::{LocalDatabase, StoreLocation, StoreStats};
use crate::client::sync::{
    ConnectionStatus, ConnectivityMonitor, Subscription, SyncCoordinator, SyncEngine, SyncOutcome, SyncStatus,
};
use crate::client::types::Session;
use crate::shared::{CatalogItem, NewSale};
use std::sync::Arc;
use tracing::{info, warn};

/// Application-wide handle to the offline machinery
#[derive(Debug)]
pub struct AppContext {
    config: Config,
    store: Arc<LocalDatabase>,
    monitor: Arc<ConnectivityMonitor>,
    coordinator: SyncCoordinator,
}

impl AppContext {
    /// Open the on-disk store from `config` and start everything
    pub async fn start(
        config: Config,
        remote: Arc<dyn RemoteService>,
        session: Option<Session>,
    ) -> StoreResult<Self> {
        let store = LocalDatabase::new(StoreLocation::File(config.database_path()));
        Self::start_with_store(config, store, remote, session).await
    }

    /// Start against an explicit store, e.g. [`StoreLocation::InMemory`]
    pub async fn start_with_store(
        config: Config,
        store: LocalDatabase,
        remote: Arc<dyn RemoteService>,
        session: Option<Session>,
    ) -> StoreResult<Self> {
        store.initialize().await?;
        let store = Arc::new(store);

        let monitor = Arc::new(ConnectivityMonitor::from_config(Arc::clone(&remote), config.app()));
        monitor.check_connection().await;
        monitor.start();

        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&store),
            remote,
            config.app().catalog_page_size,
        ));
        let coordinator = SyncCoordinator::new(engine, Arc::clone(&monitor), config.app());
        coordinator.set_session(session.clone());
        coordinator.start().await;

        if let Some(session) = &session {
            match coordinator.preload_catalog(session).await {
                Ok(Some(report)) => info!("Catalog preloaded: {} items", report.downloaded),
                Ok(None) => {}
                Err(e) => warn!("Catalog preload failed: {}", e),
            }
        }

        info!(
            online = monitor.is_online(),
            location = ?store.location(),
            "Offline context ready"
        );

        Ok(Self {
            config,
            store,
            monitor,
            coordinator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<LocalDatabase> {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Hear about connectivity transitions
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ConnectionStatus, bool) + Send + Sync + 'static,
    {
        self.monitor.subscribe(listener)
    }

    /// Forward the platform's link up/down signal
    pub fn report_native_status(&self, online: bool) {
        self.monitor.report_native_status(online);
    }

    pub async fn trigger_sync(&self) -> SyncOutcome {
        self.coordinator.trigger_sync().await
    }

    pub async fn status(&self) -> SyncStatus {
        self.coordinator.status().await
    }

    /// Switch operator; preloads the catalog if the new one sells
    pub async fn set_session(&self, session: Option<Session>) {
        self.coordinator.set_session(session.clone());
        if let Some(session) = session {
            if let Err(e) = self.coordinator.preload_catalog(&session).await {
                warn!("Catalog preload failed: {}", e);
            }
        }
    }

    /// Record a sale locally; it is pushed on the next sync
    pub async fn enqueue_sale(&self, sale: &NewSale) -> StoreResult<i64> {
        let id = self.store.enqueue_pending_sale(sale).await?;
        self.coordinator.refresh_pending_count().await;
        Ok(id)
    }

    pub async fn cached_catalog(&self) -> StoreResult<Vec<CatalogItem>> {
        self.store.get_all_catalog_items().await
    }

    pub async fn search_cached_catalog(&self, text: &str) -> StoreResult<Vec<CatalogItem>> {
        self.store.search_catalog_items(text).await
    }

    pub async fn find_cached_catalog_by_barcode(&self, code: &str) -> StoreResult<Option<CatalogItem>> {
        self.store.find_catalog_item_by_barcode(code).await
    }

    pub async fn store_stats(&self) -> StoreResult<StoreStats> {
        self.store.stats().await
    }

    /// Stop timers, drop subscribers, then close the store
    pub async fn shutdown(&self) {
        self.coordinator.shutdown();
        self.monitor.shutdown();
        self.store.close().await;
        info!("Offline context shut down");
    }
}
