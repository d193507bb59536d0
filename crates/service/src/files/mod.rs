//! File operations: the encrypt-on-write / decrypt-on-read pipeline and the
//! cache-accelerated access paths around it.
//!
//! Reads (retrieve, share, search) are cache-aside: check the cache, fall
//! back to the database on miss, repopulate, return. Writes and destroys
//! (upload, delete) go straight to the source of truth; staleness in the
//! cache is bounded by TTL, never corrected by invalidation.

pub mod delete;
pub mod retrieve;
pub mod search;
pub mod share;
pub mod upload;

pub use delete::{delete_file, DeleteError};
pub use retrieve::{open_file, OpenFile, RetrieveError};
pub use search::{search_files, SearchError};
pub use share::{share_link, ShareError};
pub use upload::{store_file, StoredFile, UploadError};
