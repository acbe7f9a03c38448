//! # Sync Engine
//!
//! Performs the actual reconciliation passes against the store server:
//!
//! - **Sales push**: every pending sale is submitted in enqueue order. A
//!   failed sale stays pending and never blocks the ones after it.
//! - **Catalog pull**: the full catalog is downloaded page by page and only
//!   then swapped into the cache in a single transaction. An error at any
//!   page leaves the previous cache untouched.
//!
//! The engine has no notion of connectivity or concurrency; the coordinator
//! decides when a pass may run.

use crate::client::api::RemoteService;
use crate::client::error::SyncResult;
use crate::client::local_db::LocalDatabase;
use crate::shared::CatalogItem;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Progress callback: `(items_so_far, total)`
pub type CatalogProgressFn<'a> = &'a (dyn Fn(usize, u64) + Send + Sync);

/// One sale the server did not accept
#[derive(Debug, Clone, PartialEq)]
pub struct SaleSyncError {
    pub sale_id: i64,
    pub message: String,
}

impl fmt::Display for SaleSyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sale #{}: {}", self.sale_id, self.message)
    }
}

/// Outcome of a sales push
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesSyncReport {
    /// Pending sales at the start of the pass
    pub pending_before: usize,
    pub synchronized_count: usize,
    pub errors: Vec<SaleSyncError>,
}

impl SalesSyncReport {
    /// Progress was made: nothing was pending, or at least one sale went through
    pub fn success(&self) -> bool {
        self.pending_before == 0 || self.synchronized_count > 0
    }

    pub fn fully_synced(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a catalog pull
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSyncReport {
    pub downloaded: usize,
    /// Total advertised by the server, if it sent one
    pub reported_total: Option<u64>,
    pub pages: usize,
    /// False when the download was empty and the cache was kept
    pub replaced: bool,
}

/// A problem recorded during a full sync
#[derive(Debug, Clone, PartialEq)]
pub enum SyncIssue {
    Sale(SaleSyncError),
    Catalog(String),
    Storage(String),
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncIssue::Sale(e) => write!(f, "{}", e),
            SyncIssue::Catalog(msg) => write!(f, "catalog refresh failed: {}", msg),
            SyncIssue::Storage(msg) => write!(f, "local store error: {}", msg),
        }
    }
}

/// Outcome of a full sync: sales push followed by catalog pull
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullSyncReport {
    pub sales: Option<SalesSyncReport>,
    pub catalog: Option<CatalogSyncReport>,
    pub issues: Vec<SyncIssue>,
}

impl FullSyncReport {
    pub fn synced_count(&self) -> usize {
        self.sales.as_ref().map_or(0, |s| s.synchronized_count)
    }

    pub fn pending_before(&self) -> usize {
        self.sales.as_ref().map_or(0, |s| s.pending_before)
    }

    /// No issues, or at least one sale made it to the server
    pub fn success(&self) -> bool {
        self.issues.is_empty() || self.synced_count() > 0
    }

    pub fn fully_synced(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn first_error(&self) -> Option<String> {
        self.issues.first().map(ToString::to_string)
    }
}

/// Runs sync passes between the local store and a remote service
pub struct SyncEngine {
    store: Arc<LocalDatabase>,
    remote: Arc<dyn RemoteService>,
    page_size: u32,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("store", &self.store)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(store: Arc<LocalDatabase>, remote: Arc<dyn RemoteService>, page_size: u32) -> Self {
        Self {
            store,
            remote,
            page_size: page_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<LocalDatabase> {
        &self.store
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Push every pending sale to the server, oldest first
    pub async fn sync_pending_sales(&self) -> SyncResult<SalesSyncReport> {
        let pending = self.store.list_pending_sales().await?;
        let mut report = SalesSyncReport {
            pending_before: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            debug!("No pending sales to push");
            return Ok(report);
        }

        info!("Pushing {} pending sales", pending.len());

        for sale in &pending {
            let submission = sale.to_submission();
            match self.remote.submit_sale(&submission).await {
                Ok(()) => match self.store.mark_sale_synchronized(sale.id).await {
                    Ok(_) => {
                        report.synchronized_count += 1;
                        debug!(sale_id = sale.id, "Sale synchronized");
                    }
                    Err(e) => {
                        error!(sale_id = sale.id, error = %e, "Server accepted sale but marking it failed");
                        report.errors.push(SaleSyncError {
                            sale_id: sale.id,
                            message: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    warn!(sale_id = sale.id, error = %e, "Sale rejected, keeping it pending");
                    report.errors.push(SaleSyncError {
                        sale_id: sale.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Sales push finished: {}/{} synchronized",
            report.synchronized_count, report.pending_before
        );
        Ok(report)
    }

    /// Download the whole catalog and replace the cache in one transaction
    pub async fn sync_catalog(&self, on_progress: Option<CatalogProgressFn<'_>>) -> SyncResult<CatalogSyncReport> {
        let mut items: Vec<CatalogItem> = Vec::new();
        let mut report = CatalogSyncReport::default();
        let mut skip: u64 = 0;

        loop {
            let page = self.remote.fetch_catalog_page(skip, self.page_size).await?;
            report.pages += 1;

            if page.items.is_empty() {
                break;
            }

            let received = page.items.len();
            items.extend(page.items);

            if let Some(total) = page.total.filter(|t| *t > 0) {
                report.reported_total = Some(total);
            }
            if let (Some(callback), Some(total)) = (on_progress, report.reported_total) {
                callback(items.len(), total);
            }
            debug!(skip, received, so_far = items.len(), "Catalog page received");

            if !page.has_more {
                break;
            }
            skip += received as u64;
        }

        report.downloaded = items.len();

        if let Some(total) = report.reported_total {
            if total != items.len() as u64 {
                warn!(
                    reported = total,
                    downloaded = items.len(),
                    "Catalog total does not match the downloaded item count"
                );
            }
        }

        if items.is_empty() {
            warn!("Server returned an empty catalog, keeping the cached one");
            return Ok(report);
        }

        self.store.replace_catalog(&items).await?;
        report.replaced = true;

        info!("Catalog refreshed: {} items in {} pages", report.downloaded, report.pages);
        Ok(report)
    }

    /// Sales push followed by catalog pull
    pub async fn full_sync(&self) -> FullSyncReport {
        self.full_sync_with_progress(None).await
    }

    /// Like [`full_sync`](Self::full_sync), reporting catalog progress
    pub async fn full_sync_with_progress(&self, on_progress: Option<CatalogProgressFn<'_>>) -> FullSyncReport {
        let mut report = FullSyncReport::default();

        match self.sync_pending_sales().await {
            Ok(sales) => {
                report
                    .issues
                    .extend(sales.errors.iter().cloned().map(SyncIssue::Sale));
                report.sales = Some(sales);
            }
            Err(e) => {
                error!("Sales push aborted: {}", e);
                report.issues.push(SyncIssue::Storage(e.to_string()));
            }
        }

        match self.sync_catalog(on_progress).await {
            Ok(catalog) => report.catalog = Some(catalog),
            Err(e) => {
                error!("Catalog refresh failed: {}", e);
                report.issues.push(SyncIssue::Catalog(e.to_string()));
            }
        }

        report
    }
}
