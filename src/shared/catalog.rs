//! Catalog Data Structures
//!
//! The sellable product records the client caches locally, and the
//! paginated envelope the store server returns them in.
//!
//! The server speaks Spanish field names (`nombre`, `precio_venta`,
//! `codigo_barras`, ...). Those are accepted as aliases on input; the
//! English names are what this crate serializes.

use serde::{Deserialize, Serialize};

/// A cached, sellable product record
///
/// Identifiers are assigned by the server. Barcodes are optional and are not
/// guaranteed to be unique in the local cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Server-assigned identifier
    pub id: i64,
    /// Display name
    #[serde(alias = "nombre")]
    pub name: String,
    /// Product category
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    /// Barcode as printed on the package
    #[serde(default, alias = "codigo_barras")]
    pub barcode: Option<String>,
    /// Unit cost
    #[serde(default, alias = "precio_costo")]
    pub unit_cost: f64,
    /// Unit sale price
    #[serde(alias = "precio_venta")]
    pub unit_price: f64,
    /// Units in stock
    #[serde(default)]
    pub stock: i64,
    /// Threshold under which the product counts as low on stock
    #[serde(default, alias = "stock_minimo")]
    pub min_stock: i64,
}

impl CatalogItem {
    /// Whether the stock is below the minimum-stock threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }

    /// Case-insensitive substring match against name, category and barcode
    ///
    /// `needle` must already be lowercased and trimmed. An empty needle
    /// matches every item.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        let contains = |field: &str| field.to_lowercase().contains(needle);

        contains(&self.name)
            || self.category.as_deref().is_some_and(contains)
            || self.barcode.as_deref().is_some_and(contains)
    }
}

/// One page of the remote catalog
///
/// `has_more` is authoritative for pagination; `total` is informational and
/// only used for progress reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogPage {
    /// Items on this page
    #[serde(alias = "productos")]
    pub items: Vec<CatalogItem>,
    /// Total number of items on the server, when reported
    #[serde(default)]
    pub total: Option<u64>,
    /// Whether another page follows this one
    #[serde(default, alias = "hasMore")]
    pub has_more: bool,
}
