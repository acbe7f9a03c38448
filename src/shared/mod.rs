//! Shared Module
//!
//! This module contains the types exchanged between the point-of-sale client
//! and the store server, plus the configuration and error types both the
//! local store and the sync machinery build on.
//!
//! # Overview
//!
//! All types here are platform-agnostic and serializable. Wire names follow
//! the store server's JSON (`nombre`, `precio_venta`, `has_more`, ...) and are
//! accepted as serde aliases; the canonical Rust names are English.

/// Catalog item and paginated catalog response
pub mod catalog;

/// Sales, sale lines and payment methods
pub mod sale;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use catalog::{CatalogItem, CatalogPage};
pub use sale::{NewSale, PaymentMethod, PendingSale, SaleLine, SaleSubmission};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
