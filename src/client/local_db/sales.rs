//! # Pending Sales Queue
//!
//! Sales recorded at the point of sale are appended here with an
//! auto-incrementing local id and `synchronized = false`. The sync engine
//! drains them in id order and flips the flag once the server confirms each
//! one. Synchronized entries are kept for an audit window and then purged.
//!
//! A sale counts as pending iff `synchronized = 0`.

use crate::client::error::{StoreError, StoreResult};
use crate::client::local_db::{decode_timestamp, encode_timestamp, LocalDatabase};
use crate::shared::{NewSale, PaymentMethod, PendingSale, SaleLine};
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const SALE_COLUMNS: &str = "id, lines, payment_method, created_at, synchronized, synced_at";

fn sale_from_row(row: &SqliteRow) -> StoreResult<PendingSale> {
    let lines: String = row.try_get("lines")?;
    let lines: Vec<SaleLine> = serde_json::from_str(&lines)?;

    let payment_method: String = row.try_get("payment_method")?;
    let payment_method: PaymentMethod = payment_method
        .parse()
        .map_err(|e| StoreError::corrupt(format!("sale payment method: {}", e)))?;

    let created_at: String = row.try_get("created_at")?;
    let synced_at: Option<String> = row.try_get("synced_at")?;

    Ok(PendingSale {
        id: row.try_get("id")?,
        lines,
        payment_method,
        created_at: decode_timestamp(&created_at)?,
        synchronized: row.try_get("synchronized")?,
        synced_at: synced_at.as_deref().map(decode_timestamp).transpose()?,
    })
}

impl LocalDatabase {
    /// Append a sale to the queue and return its local id
    ///
    /// The sale is validated first; invalid sales are rejected with
    /// [`StoreError::Rejected`] and nothing is written.
    pub async fn enqueue_pending_sale(&self, sale: &NewSale) -> StoreResult<i64> {
        sale.validate()?;

        let pool = self.pool().await?;
        let lines = serde_json::to_string(&sale.lines)?;

        let result = sqlx::query(
            "INSERT INTO pending_sales (lines, payment_method, created_at, synchronized)
             VALUES (?, ?, ?, 0)",
        )
        .bind(&lines)
        .bind(sale.payment_method.as_str())
        .bind(encode_timestamp(Utc::now()))
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(sale_id = id, total = sale.total(), "Sale queued locally");
        Ok(id)
    }

    /// All sales not yet confirmed by the server, in enqueue order
    pub async fn list_pending_sales(&self) -> StoreResult<Vec<PendingSale>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(&format!(
            "SELECT {} FROM pending_sales WHERE synchronized = 0 ORDER BY id ASC",
            SALE_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        rows.iter().map(sale_from_row).collect()
    }

    /// Point lookup of a queue entry, synchronized or not
    pub async fn get_pending_sale(&self, id: i64) -> StoreResult<Option<PendingSale>> {
        let pool = self.pool().await?;
        let row = sqlx::query(&format!("SELECT {} FROM pending_sales WHERE id = ?", SALE_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(sale_from_row).transpose()
    }

    /// Flag a sale as confirmed by the server, stamped now
    ///
    /// Returns `false` if the sale is absent or already synchronized.
    pub async fn mark_sale_synchronized(&self, id: i64) -> StoreResult<bool> {
        self.mark_sale_synchronized_at(id, Utc::now()).await
    }

    /// Flag a sale as confirmed by the server at `synced_at`
    pub async fn mark_sale_synchronized_at(
        &self,
        id: i64,
        synced_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let pool = self.pool().await?;
        let result = sqlx::query(
            "UPDATE pending_sales SET synchronized = 1, synced_at = ?
             WHERE id = ? AND synchronized = 0",
        )
        .bind(encode_timestamp(synced_at))
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete synchronized sales older than the retention window
    pub async fn purge_old_synchronized_sales(&self, retention: Duration) -> StoreResult<u64> {
        self.purge_synchronized_sales_before(Utc::now() - retention).await
    }

    /// Delete synchronized sales confirmed before `cutoff`
    ///
    /// Pending sales are never touched.
    pub async fn purge_synchronized_sales_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let pool = self.pool().await?;
        let result = sqlx::query(
            "DELETE FROM pending_sales
             WHERE synchronized = 1 AND synced_at IS NOT NULL AND synced_at < ?",
        )
        .bind(encode_timestamp(cutoff))
        .execute(pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!(removed, "Purged old synchronized sales");
        }
        Ok(removed)
    }

    /// Number of sales with `synchronized = false`
    pub async fn count_pending_sales(&self) -> StoreResult<u64> {
        self.count_sales(false).await
    }

    /// Number of synchronized sales still retained
    pub async fn count_synchronized_sales(&self) -> StoreResult<u64> {
        self.count_sales(true).await
    }

    pub async fn has_pending_sales(&self) -> StoreResult<bool> {
        Ok(self.count_pending_sales().await? > 0)
    }

    async fn count_sales(&self, synchronized: bool) -> StoreResult<u64> {
        let pool = self.pool().await?;
        let count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM pending_sales WHERE synchronized = ?")
                .bind(synchronized)
                .fetch_one(pool)
                .await?
                .try_get("count")?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::local_db::StoreLocation;

    fn sale(product_id: i64) -> NewSale {
        NewSale::new(vec![SaleLine::new(product_id, 2, 150.0)], PaymentMethod::Cash)
    }

    #[tokio::test]
    async fn test_enqueue_assigns_increasing_ids() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();

        let first = db.enqueue_pending_sale(&sale(1)).await.unwrap();
        let second = db.enqueue_pending_sale(&sale(2)).await.unwrap();
        assert!(second > first);

        let pending = db.list_pending_sales().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first);
        assert!(!pending[0].synchronized);
        assert!(pending[0].synced_at.is_none());
        assert_eq!(pending[0].lines, sale(1).lines);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_invalid_sale() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();
        let empty = NewSale::new(vec![], PaymentMethod::Cash);

        let result = db.enqueue_pending_sale(&empty).await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert_eq!(db.count_pending_sales().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_synchronized() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();
        let id = db.enqueue_pending_sale(&sale(1)).await.unwrap();

        assert!(db.mark_sale_synchronized(id).await.unwrap());
        assert_eq!(db.count_pending_sales().await.unwrap(), 0);
        assert_eq!(db.count_synchronized_sales().await.unwrap(), 1);

        let stored = db.get_pending_sale(id).await.unwrap().unwrap();
        assert!(stored.synchronized);
        assert!(stored.synced_at.is_some());

        // Second flip and unknown ids are no-ops
        assert!(!db.mark_sale_synchronized(id).await.unwrap());
        assert!(!db.mark_sale_synchronized(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_pending_sales() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();
        assert!(!db.has_pending_sales().await.unwrap());
        db.enqueue_pending_sale(&sale(1)).await.unwrap();
        assert!(db.has_pending_sales().await.unwrap());
    }
}
