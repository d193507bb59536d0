//! Persistence layer for encrypted file blobs.
//!
//! A thin wrapper around the `object_store` crate: whole-buffer writes and
//! reads keyed by locator, with in-memory and local-filesystem backends.
//! Locators are constructed by the upload path; this layer treats them as
//! opaque keys and performs no sanitization of its own.

mod error;
mod store;

pub use error::{BlobStoreError, Result};
pub use store::{BlobStore, BlobStoreConfig};
