//! POS Offline - Main Library
//!
//! Offline-resilience layer for a point-of-sale web client. Sales keep being
//! recorded while the connection to the store server is down, the product
//! catalog stays searchable from a local cache, and everything is reconciled
//! with the server once connectivity returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - Catalog items and paginated catalog responses
//!   - Sales, sale lines and payment methods
//!   - Shared error and configuration types
//!
//! - **`client`** - Local-first machinery
//!   - `local_db`: SQLite cache of the catalog, pending-sales queue and config
//!   - `sync`: connectivity monitor, sync engine and sync coordinator
//!   - `api`: remote service trait and its HTTP implementation
//!   - `context`: the application context that owns one of each
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pos_offline::client::{AppContext, Config, HttpRemote};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new();
//! let remote = Arc::new(HttpRemote::new(&config)?);
//! let ctx = AppContext::start(config, remote, None).await?;
//!
//! let status = ctx.status().await;
//! println!("online: {}, pending: {}", status.is_online, status.pending_count);
//!
//! ctx.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! All components are `Send + Sync` and designed to run on a tokio runtime.
//! The local store is the only shared mutable resource; the coordinator's
//! in-memory "syncing" flag is the only mutual-exclusion mechanism.

/// Shared types and data structures
pub mod shared;

/// Local-first client: storage, connectivity and synchronization
pub mod client;
