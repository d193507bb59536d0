use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One uploaded file. Every field is write-once: records are created by the
/// upload path and destroyed by delete or the expiry worker, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub owner_id: i64,
    pub display_name: String,
    pub content_type: String,
    /// Store-relative path of the encrypted blob.
    pub storage_locator: String,
    /// Keyring id the blob was sealed with.
    pub key_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields for a not-yet-inserted file record; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub owner_id: i64,
    pub display_name: String,
    pub content_type: String,
    pub storage_locator: String,
    pub key_id: String,
    pub created_at: OffsetDateTime,
}

/// Conjunctive search predicates, all scoped to one owner.
///
/// Unset predicates are omitted from the query entirely; set predicates are
/// ANDed in a fixed order (id, type, name, locator).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFilter {
    /// Exact id match.
    pub file_id: Option<i64>,
    /// Exact content-type match.
    pub file_type: Option<String>,
    /// Substring match on the display name.
    pub file_name: Option<String>,
    /// Substring match on the storage locator.
    pub file_path: Option<String>,
}

impl FileFilter {
    /// Deterministic cache key for this predicate tuple.
    ///
    /// The owner is part of the key, so two identities never see each
    /// other's cached results.
    pub fn cache_key(&self, owner_id: i64) -> String {
        let fmt_id = self.file_id.map(|id| id.to_string()).unwrap_or_default();
        format!(
            "search:user:{}:file_id={}:file_type={}:file_name={}:file_path={}",
            owner_id,
            fmt_id,
            self.file_type.as_deref().unwrap_or(""),
            self.file_name.as_deref().unwrap_or(""),
            self.file_path.as_deref().unwrap_or(""),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_scopes_by_owner() {
        let filter = FileFilter {
            file_name: Some("report".to_string()),
            ..Default::default()
        };

        assert_ne!(filter.cache_key(1), filter.cache_key(2));
    }

    #[test]
    fn test_cache_key_distinguishes_predicates() {
        let by_name = FileFilter {
            file_name: Some("a".to_string()),
            ..Default::default()
        };
        let by_path = FileFilter {
            file_path: Some("a".to_string()),
            ..Default::default()
        };

        assert_ne!(by_name.cache_key(1), by_path.cache_key(1));
    }
}
