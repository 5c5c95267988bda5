//! Client crate for a storage array's management REST API.
//!
//! Owns the authenticated session (device id + token + cookie), the resource
//! path catalog, and the pure translation helpers (vendor code tables,
//! capacity conversion, tolerant field access) that collectors build on.

pub mod capacity;
pub mod client;
pub mod codes;
pub mod error;
pub mod fields;
pub mod resources;

pub use client::ArrayClient;
pub use error::{FetchError, Result};
