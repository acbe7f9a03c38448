//! Offline Client Module
//!
//! This module provides the local-first machinery of the point-of-sale
//! client: the SQLite cache, connectivity detection and synchronization
//! with the store server.
//!
//! # Architecture
//!
//! The client module is organized into focused submodules:
//!
//! - **`config`** - Configuration management (server URL, token, database path)
//! - **`error`** - Store, remote and sync error types
//! - **`types`** - Operator session and roles
//! - **`api`** - Remote service trait and its HTTP implementation
//! - **`local_db`** - Local SQLite database for offline functionality
//! - **`sync`** - Connectivity monitor, sync engine and coordinator
//! - **`context`** - Application context wiring one of each together
//! - **`main`** - Headless sync agent entry point (binary)
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - pos-sync-agent entry point
//! ├── config.rs       - Configuration management
//! ├── error.rs        - Error types
//! ├── types.rs        - Session and roles
//! ├── api.rs          - Remote service client
//! ├── context.rs      - Application context
//! ├── local_db/       - SQLite store
//! └── sync/           - Connectivity and synchronization
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! // Run the headless sync agent:
//! // cargo run --bin pos-sync-agent -- pos.toml
//! ```

pub mod config;
pub mod error;
pub mod types;
pub mod api;
pub mod local_db;
pub mod sync;
pub mod context;

// Re-export commonly used types
pub use config::Config;
pub use error::{RemoteError, StoreError, SyncError};
pub use types::{Role, Session};
pub use api::{HttpRemote, RemoteService};
pub use local_db::{LocalDatabase, StoreLocation, StoreStats};
pub use sync::{ConnectionStatus, ConnectivityMonitor, SyncCoordinator, SyncEngine, SyncOutcome, SyncStatus};
pub use context::AppContext;
