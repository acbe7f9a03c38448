//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-process `RemoteService` double with scriptable failures
//! - Store and catalog fixtures
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;

use futures_util::future::BoxFuture;
use pos_offline::client::error::{RemoteError, RemoteResult};
use pos_offline::client::local_db::{LocalDatabase, StoreLocation};
use pos_offline::client::RemoteService;
use pos_offline::shared::{CatalogItem, CatalogPage, NewSale, PaymentMethod, SaleLine, SaleSubmission};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scriptable stand-in for the store server
#[derive(Default)]
pub struct MockRemote {
    catalog: Mutex<Vec<CatalogItem>>,
    /// Overrides the advertised total; `Some(None)` omits it
    reported_total: Mutex<Option<Option<u64>>>,
    /// Catalog requests at or past this offset fail
    fail_catalog_from: Mutex<Option<u64>>,
    /// Sales whose first line sells one of these products are rejected
    rejected_products: Mutex<HashSet<i64>>,
    submit_delay: Mutex<Option<Duration>>,
    unhealthy: AtomicBool,
    submitted: Mutex<Vec<SaleSubmission>>,
    page_requests: Mutex<Vec<(u64, u32)>>,
    health_checks: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(items: Vec<CatalogItem>) -> Self {
        let remote = Self::new();
        remote.set_catalog(items);
        remote
    }

    pub fn set_catalog(&self, items: Vec<CatalogItem>) {
        *self.catalog.lock().unwrap() = items;
    }

    pub fn set_reported_total(&self, total: Option<u64>) {
        *self.reported_total.lock().unwrap() = Some(total);
    }

    pub fn fail_catalog_from(&self, skip: u64) {
        *self.fail_catalog_from.lock().unwrap() = Some(skip);
    }

    pub fn reject_product(&self, product_id: i64) {
        self.rejected_products.lock().unwrap().insert(product_id);
    }

    pub fn accept_all(&self) {
        self.rejected_products.lock().unwrap().clear();
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn submitted(&self) -> Vec<SaleSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    /// Product id of the first line of every accepted submission, in order
    pub fn submitted_products(&self) -> Vec<i64> {
        self.submitted()
            .iter()
            .map(|s| s.lines[0].product_id)
            .collect()
    }

    pub fn page_requests(&self) -> Vec<(u64, u32)> {
        self.page_requests.lock().unwrap().clone()
    }

    pub fn health_checks(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    fn page(&self, skip: u64, limit: u32) -> RemoteResult<CatalogPage> {
        self.page_requests.lock().unwrap().push((skip, limit));

        if let Some(from) = *self.fail_catalog_from.lock().unwrap() {
            if skip >= from {
                return Err(RemoteError::Status {
                    status: 503,
                    body: "catalog unavailable".into(),
                });
            }
        }

        let catalog = self.catalog.lock().unwrap();
        let start = (skip as usize).min(catalog.len());
        let end = (start + limit as usize).min(catalog.len());
        let total = match *self.reported_total.lock().unwrap() {
            Some(total) => total,
            None => Some(catalog.len() as u64),
        };

        Ok(CatalogPage {
            items: catalog[start..end].to_vec(),
            total,
            has_more: end < catalog.len(),
        })
    }
}

impl RemoteService for MockRemote {
    fn fetch_catalog_page(&self, skip: u64, limit: u32) -> BoxFuture<'_, RemoteResult<CatalogPage>> {
        Box::pin(async move { self.page(skip, limit) })
    }

    fn submit_sale<'a>(&'a self, sale: &'a SaleSubmission) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            let delay = *self.submit_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let product = sale.lines.first().map(|l| l.product_id);
            let rejected = product.is_some_and(|p| self.rejected_products.lock().unwrap().contains(&p));
            if rejected {
                return Err(RemoteError::Status {
                    status: 400,
                    body: "insufficient stock".into(),
                });
            }

            self.submitted.lock().unwrap().push(sale.clone());
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            self.health_checks.fetch_add(1, Ordering::SeqCst);
            if self.unhealthy.load(Ordering::SeqCst) {
                Err(RemoteError::Network("connection refused".into()))
            } else {
                Ok(())
            }
        })
    }
}

/// Fresh, initialized in-memory store
pub async fn memory_store() -> Arc<LocalDatabase> {
    Arc::new(
        LocalDatabase::open(StoreLocation::InMemory)
            .await
            .expect("in-memory store should open"),
    )
}

pub fn catalog_item(id: i64) -> CatalogItem {
    CatalogItem {
        id,
        name: format!("Product {}", id),
        category: Some(if id % 2 == 0 { "Drinks" } else { "Snacks" }.to_string()),
        barcode: Some(format!("779{:010}", id)),
        unit_cost: 1.0,
        unit_price: 2.5,
        stock: 20,
        min_stock: 5,
    }
}

/// Items with ids `1..=count`
pub fn catalog(count: i64) -> Vec<CatalogItem> {
    (1..=count).map(catalog_item).collect()
}

/// A one-line cash sale of `product_id`
pub fn sale_of(product_id: i64) -> NewSale {
    NewSale::new(vec![SaleLine::new(product_id, 1, 2.5)], PaymentMethod::Cash)
}
