//! Encrypted file storage and access service for VaultDrop.
//!
//! This crate provides everything between the HTTP socket and the disk:
//! - Database (SQLite metadata catalog for file records)
//! - Cache (short-TTL key/value store fronting metadata reads)
//! - Rate limiter (fixed-window per-user counters on the cache store)
//! - Auth (bearer-token verification resolving a user id)
//! - File operations (upload, retrieve, share, search, delete)
//! - Expiry worker (retention sweep + blob/metadata reconciliation)
//! - HTTP server (axum routes mapping operation errors to status codes)

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod expiry;
pub mod files;
pub mod http_server;
pub mod ratelimit;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use database::{Database, DatabaseSetupError};
pub use expiry::ExpiryWorker;
pub use state::{State as ServiceState, StateSetupError};
