//! # Sync Metadata Operations
//!
//! Scalar configuration entries (key, value, timestamp) used for sync
//! bookkeeping such as the time of the last catalog refresh. Entries are
//! upserted by key; no history is kept.

use crate::client::error::StoreResult;
use crate::client::local_db::{decode_timestamp, encode_timestamp, LocalDatabase};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Row, Sqlite};

/// Key stamped by every successful catalog replace
pub const LAST_CATALOG_SYNC_KEY: &str = "last_catalog_sync";

/// One configuration entry
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Upsert through any executor so callers can include it in a transaction
pub(crate) async fn upsert_config<'e, E>(
    executor: E,
    key: &str,
    value: &str,
    at: DateTime<Utc>,
) -> StoreResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO config (key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(encode_timestamp(at))
    .execute(executor)
    .await?;
    Ok(())
}

impl LocalDatabase {
    /// Set a configuration entry
    pub async fn set_config(&self, key: &str, value: &str) -> StoreResult<()> {
        let pool = self.pool().await?;
        upsert_config(pool, key, value, Utc::now()).await
    }

    /// Get a configuration entry
    pub async fn get_config(&self, key: &str) -> StoreResult<Option<ConfigEntry>> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT key, value, updated_at FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => {
                let updated_at: String = row.try_get("updated_at")?;
                Ok(Some(ConfigEntry {
                    key: row.try_get("key")?,
                    value: row.try_get("value")?,
                    updated_at: decode_timestamp(&updated_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// When the catalog cache was last replaced
    pub async fn last_catalog_sync(&self) -> StoreResult<Option<DateTime<Utc>>> {
        match self.get_config(LAST_CATALOG_SYNC_KEY).await? {
            Some(entry) => Ok(Some(decode_timestamp(&entry.value)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::local_db::{LocalDatabase, StoreLocation};

    #[tokio::test]
    async fn test_config_entries() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();

        db.set_config("terminal", "caja-1").await.unwrap();
        let entry = db.get_config("terminal").await.unwrap().unwrap();
        assert_eq!(entry.value, "caja-1");

        // Upsert replaces, no history
        db.set_config("terminal", "caja-2").await.unwrap();
        let entry = db.get_config("terminal").await.unwrap().unwrap();
        assert_eq!(entry.value, "caja-2");
        assert!(entry.updated_at <= chrono::Utc::now());

        assert!(db.get_config("non_existent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_catalog_sync_absent_initially() {
        let db = LocalDatabase::open(StoreLocation::InMemory).await.unwrap();
        assert!(db.last_catalog_sync().await.unwrap().is_none());
    }
}
