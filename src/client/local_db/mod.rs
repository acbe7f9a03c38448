//! # Local Database Module
//!
//! This module provides the local SQLite store backing the offline-first
//! point of sale. It is the only shared mutable resource in the client.
//!
//! ## Architecture
//!
//! One versioned database holds three logical tables:
//! - **`catalog_items`**: cached catalog, replaced wholesale on every catalog sync
//! - **`pending_sales`**: queue of sales recorded locally, flagged once synchronized
//! - **`config`**: scalar key/value/timestamp bookkeeping entries
//!
//! Schema upgrades are additive only (new tables and indexes), tracked in a
//! `schema_migrations` table.
//!
//! ## Key Components
//!
//! - `LocalDatabase`: connection management, schema, statistics
//! - `schema.rs`: schema version and migration list
//! - `catalog.rs`: catalog cache operations
//! - `sales.rs`: pending-sales queue operations
//! - `sync.rs`: configuration entries and sync bookkeeping
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pos_offline::client::local_db::{LocalDatabase, StoreLocation};
//!
//! # async fn example() -> pos_offline::client::error::StoreResult<()> {
//! let db = LocalDatabase::new(StoreLocation::File("pos.db".into()));
//! db.initialize().await?;
//!
//! let pending = db.count_pending_sales().await?;
//! println!("{} sales waiting for the server", pending);
//! # Ok(())
//! # }
//! ```

pub mod schema;
pub mod catalog;
pub mod sales;
pub mod sync;

pub use sync::{ConfigEntry, LAST_CATALOG_SYNC_KEY};

use crate::client::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use tokio::sync::OnceCell;

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// On-disk database file, created on first run
    File(PathBuf),
    /// Private in-memory database that lives as long as the store
    InMemory,
}

/// Local database connection manager
///
/// Opening is lazy and idempotent: every operation goes through the same
/// pool, initialized once no matter how many callers race to initialize it.
#[derive(Debug)]
pub struct LocalDatabase {
    location: StoreLocation,
    pool: OnceCell<SqlitePool>,
}

impl LocalDatabase {
    /// Describe a store without opening it
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            pool: OnceCell::new(),
        }
    }

    /// Create and initialize a store in one step
    pub async fn open(location: StoreLocation) -> StoreResult<Self> {
        let db = Self::new(location);
        db.initialize().await?;
        Ok(db)
    }

    /// Open (creating on first run) the database and apply migrations
    ///
    /// Safe to call repeatedly and concurrently; all callers share one pool.
    pub async fn initialize(&self) -> StoreResult<()> {
        self.pool().await.map(|_| ())
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Get connection pool reference, opening the database if needed
    pub(crate) async fn pool(&self) -> StoreResult<&SqlitePool> {
        self.pool
            .get_or_try_init(|| Self::connect(&self.location))
            .await
    }

    async fn connect(location: &StoreLocation) -> StoreResult<SqlitePool> {
        let (options, max_connections) = match location {
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .foreign_keys(true);
                (options, 4)
            }
            // A single never-recycled connection keeps the in-memory database alive
            StoreLocation::InMemory => {
                let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
                (options, 1)
            }
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        tracing::info!(?location, "Local database ready");
        Ok(pool)
    }

    /// Run database migrations
    ///
    /// Checks the current schema version and applies any pending migrations,
    /// each in its own transaction.
    async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        let current_version: i32 =
            sqlx::query("SELECT COALESCE(MAX(version), 0) AS version FROM schema_migrations")
                .fetch_one(pool)
                .await?
                .try_get("version")?;

        if !schema::needs_migration(current_version) {
            return Ok(());
        }

        for migration in schema::pending_migrations(current_version) {
            let mut tx = pool.begin().await?;
            // Multi-statement scripts run through the connection executor
            sqlx::Executor::execute(&mut *tx, migration.sql).await?;
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(migration.version)
                .bind(encode_timestamp(Utc::now()))
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(version = migration.version, "Applied schema migration");
        }

        Ok(())
    }

    /// Current schema version of the opened database
    pub async fn schema_version(&self) -> StoreResult<i32> {
        let pool = self.pool().await?;
        let version: i32 =
            sqlx::query("SELECT COALESCE(MAX(version), 0) AS version FROM schema_migrations")
                .fetch_one(pool)
                .await?
                .try_get("version")?;
        Ok(version)
    }

    /// Get database statistics
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        Ok(StoreStats {
            catalog_items: self.count_catalog_items().await?,
            pending_sales: self.count_pending_sales().await?,
            synchronized_sales: self.count_synchronized_sales().await?,
            last_catalog_sync: self.last_catalog_sync().await?,
        })
    }

    /// Wipe every table in one transaction
    pub async fn clear_all(&self) -> StoreResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM catalog_items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM pending_sales").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM config").execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::warn!("Local database cleared");
        Ok(())
    }

    /// Close the pool; later operations fail
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    /// Items in the catalog cache
    pub catalog_items: u64,
    /// Sales not yet confirmed by the server
    pub pending_sales: u64,
    /// Confirmed sales still inside the retention window
    pub synchronized_sales: u64,
    /// When the catalog cache was last replaced
    pub last_catalog_sync: Option<DateTime<Utc>>,
}

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(format!("invalid timestamp '{}': {}", raw, e)))
}
