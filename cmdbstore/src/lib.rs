//! Client crate for the downstream configuration-management datastore.
//!
//! The CMDB addresses records by opaque instance ids but upserts by a caller
//! supplied key field set; this crate owns the paginated search walk, the
//! batch upsert, partial updates, deletes, relation appends and the
//! stale-record sweep built on top of them.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::CmdbClient;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
