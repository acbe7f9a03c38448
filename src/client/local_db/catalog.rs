//! Catalog Cache Operations
//!
//! The catalog table is owned by the local store and replaced wholesale on
//! each successful catalog sync. The replace runs as one transaction, so a
//! reader either sees the previous catalog or the new one, never a mix.

use crate::client::error::StoreResult;
use crate::client::local_db::sync::{upsert_config, LAST_CATALOG_SYNC_KEY};
use crate::client::local_db::{encode_timestamp, LocalDatabase};
use crate::shared::CatalogItem;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const CATALOG_COLUMNS: &str =
    "id, name, category, barcode, unit_cost, unit_price, stock, min_stock";

fn item_from_row(row: &SqliteRow) -> StoreResult<CatalogItem> {
    Ok(CatalogItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        barcode: row.try_get("barcode")?,
        unit_cost: row.try_get("unit_cost")?,
        unit_price: row.try_get("unit_price")?,
        stock: row.try_get("stock")?,
        min_stock: row.try_get("min_stock")?,
    })
}

impl LocalDatabase {
    /// Replace the whole catalog cache
    ///
    /// Clears the table and inserts every item inside one write transaction,
    /// then stamps [`LAST_CATALOG_SYNC_KEY`]. Any failure rolls everything
    /// back and leaves the previous catalog intact.
    pub async fn replace_catalog(&self, items: &[CatalogItem]) -> StoreResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM catalog_items")
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO catalog_items
                    (id, name, category, barcode, unit_cost, unit_price, stock, min_stock)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.category)
            .bind(&item.barcode)
            .bind(item.unit_cost)
            .bind(item.unit_price)
            .bind(item.stock)
            .bind(item.min_stock)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| {
                tracing::error!(item_id = item.id, error = %e, "Catalog replace aborted");
            })?;
        }

        let now = Utc::now();
        upsert_config(&mut *tx, LAST_CATALOG_SYNC_KEY, &encode_timestamp(now), now).await?;

        tx.commit().await?;

        tracing::info!(count = items.len(), "Catalog cache replaced");
        Ok(())
    }

    /// All cached catalog items, by id
    pub async fn get_all_catalog_items(&self) -> StoreResult<Vec<CatalogItem>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM catalog_items ORDER BY id ASC",
            CATALOG_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Point lookup by id
    pub async fn get_catalog_item(&self, id: i64) -> StoreResult<Option<CatalogItem>> {
        let pool = self.pool().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM catalog_items WHERE id = ?",
            CATALOG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    /// First cached item carrying `code`
    ///
    /// Barcodes are not unique locally; the lowest id wins.
    pub async fn find_catalog_item_by_barcode(&self, code: &str) -> StoreResult<Option<CatalogItem>> {
        let pool = self.pool().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM catalog_items WHERE barcode = ? ORDER BY id ASC LIMIT 1",
            CATALOG_COLUMNS
        ))
        .bind(code)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    /// Case-insensitive substring search over name, category and barcode
    ///
    /// Matching runs in Rust rather than through `LIKE`, which only folds
    /// ASCII case.
    pub async fn search_catalog_items(&self, text: &str) -> StoreResult<Vec<CatalogItem>> {
        let needle = text.trim().to_lowercase();
        let items = self.get_all_catalog_items().await?;
        Ok(items.into_iter().filter(|item| item.matches(&needle)).collect())
    }

    /// Cached items whose stock is below their threshold
    pub async fn low_stock_items(&self) -> StoreResult<Vec<CatalogItem>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM catalog_items WHERE stock < min_stock ORDER BY stock ASC, id ASC",
            CATALOG_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Overwrite the stock of one cached item
    ///
    /// Returns `false` when the id is not cached.
    pub async fn update_catalog_item_stock(&self, id: i64, new_stock: i64) -> StoreResult<bool> {
        let pool = self.pool().await?;
        let result = sqlx::query("UPDATE catalog_items SET stock = ? WHERE id = ?")
            .bind(new_stock)
            .bind(id)
            .execute(pool)
            .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            tracing::debug!(item_id = id, stock = new_stock, "Cached stock updated");
        }
        Ok(updated)
    }

    /// Number of cached catalog items
    pub async fn count_catalog_items(&self) -> StoreResult<u64> {
        let pool = self.pool().await?;
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM catalog_items")
            .fetch_one(pool)
            .await?
            .try_get("count")?;
        Ok(count as u64)
    }
}
