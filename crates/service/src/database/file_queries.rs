use sqlx::QueryBuilder;
use time::OffsetDateTime;

use super::models::{FileFilter, FileRecord, NewFileRecord};
use super::Database;

impl Database {
    /// Insert a file record and return the store-assigned id.
    pub async fn insert_file(&self, file: &NewFileRecord) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO files (owner_id, display_name, content_type, storage_locator, key_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(file.owner_id)
        .bind(&file.display_name)
        .bind(&file.content_type)
        .bind(&file.storage_locator)
        .bind(&file.key_id)
        .bind(file.created_at)
        .execute(&**self)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a file record by id, regardless of owner.
    ///
    /// This backs capability retrieval: holding the id is the credential.
    pub async fn file_by_id(&self, id: i64) -> Result<Option<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, owner_id, display_name, content_type, storage_locator, key_id, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&**self)
        .await
    }

    /// Fetch a file record by id, only if the given user owns it.
    pub async fn file_owned(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, owner_id, display_name, content_type, storage_locator, key_id, created_at
            FROM files
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&**self)
        .await
    }

    /// Conjunctive predicate search over one owner's files.
    ///
    /// Predicates are applied in a fixed order; unset predicates add no
    /// clause at all.
    pub async fn search_files(
        &self,
        owner_id: i64,
        filter: &FileFilter,
    ) -> Result<Vec<FileRecord>, sqlx::Error> {
        let mut builder = QueryBuilder::new(
            "SELECT id, owner_id, display_name, content_type, storage_locator, key_id, created_at \
             FROM files WHERE owner_id = ",
        );
        builder.push_bind(owner_id);

        if let Some(id) = filter.file_id {
            builder.push(" AND id = ").push_bind(id);
        }
        if let Some(ref file_type) = filter.file_type {
            builder.push(" AND content_type = ").push_bind(file_type);
        }
        if let Some(ref name) = filter.file_name {
            builder
                .push(" AND display_name LIKE ")
                .push_bind(format!("%{}%", name));
        }
        if let Some(ref path) = filter.file_path {
            builder
                .push(" AND storage_locator LIKE ")
                .push_bind(format!("%{}%", path));
        }
        builder.push(" ORDER BY id");

        builder
            .build_query_as::<FileRecord>()
            .fetch_all(&**self)
            .await
    }

    /// List records created strictly before the cutoff (oldest first).
    pub async fn files_created_before(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<Vec<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, owner_id, display_name, content_type, storage_locator, key_id, created_at
            FROM files
            WHERE created_at < ?
            ORDER BY created_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&**self)
        .await
    }

    /// Bulk-delete records created strictly before the cutoff.
    /// Returns the number of rows removed.
    pub async fn delete_files_created_before(
        &self,
        cutoff: OffsetDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE created_at < ?")
            .bind(cutoff)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a single record, only if the given user owns it.
    /// Returns whether a row was actually removed.
    pub async fn delete_file(&self, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&**self)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every storage locator currently referenced by a record.
    ///
    /// Used by the reconciliation pass to spot orphaned blobs.
    pub async fn all_locators(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT storage_locator FROM files")
            .fetch_all(&**self)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&url).await.unwrap()
    }

    fn record(owner_id: i64, name: &str, content_type: &str) -> NewFileRecord {
        NewFileRecord {
            owner_id,
            display_name: name.to_string(),
            content_type: content_type.to_string(),
            storage_locator: format!("{}_{}.enc", owner_id, name),
            key_id: "v1".to_string(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_db().await;

        let id = db.insert_file(&record(1, "a.txt", "text/plain")).await.unwrap();
        assert!(id > 0);

        let fetched = db.file_by_id(id).await.unwrap().unwrap();
        assert_eq!(fetched.display_name, "a.txt");
        assert_eq!(fetched.owner_id, 1);
        assert_eq!(fetched.storage_locator, "1_a.txt.enc");

        assert!(db.file_owned(id, 1).await.unwrap().is_some());
        assert!(db.file_owned(id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_predicates_are_conjunctive() {
        let db = test_db().await;

        db.insert_file(&record(1, "notes.txt", "text/plain")).await.unwrap();
        db.insert_file(&record(1, "notes.pdf", "application/pdf")).await.unwrap();
        db.insert_file(&record(2, "notes.txt", "text/plain")).await.unwrap();

        // owner scoping alone
        let all = db.search_files(1, &FileFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        // name substring AND exact type
        let filter = FileFilter {
            file_name: Some("notes".to_string()),
            file_type: Some("application/pdf".to_string()),
            ..Default::default()
        };
        let hits = db.search_files(1, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display_name, "notes.pdf");

        // another owner's files never leak in
        let other = db.search_files(3, &FileFilter::default()).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_cutoff_queries() {
        let db = test_db().await;

        let mut old = record(1, "old.txt", "text/plain");
        old.created_at = OffsetDateTime::now_utc() - time::Duration::hours(2);
        db.insert_file(&old).await.unwrap();
        db.insert_file(&record(1, "new.txt", "text/plain")).await.unwrap();

        let cutoff = OffsetDateTime::now_utc() - time::Duration::hours(1);

        let expired = db.files_created_before(cutoff).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].display_name, "old.txt");

        let removed = db.delete_files_created_before(cutoff).await.unwrap();
        assert_eq!(removed, 1);

        let locators = db.all_locators().await.unwrap();
        assert_eq!(locators, vec!["1_new.txt.enc".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_is_owner_checked() {
        let db = test_db().await;

        let id = db.insert_file(&record(1, "mine.txt", "text/plain")).await.unwrap();

        assert!(!db.delete_file(id, 2).await.unwrap());
        assert!(db.file_by_id(id).await.unwrap().is_some());

        assert!(db.delete_file(id, 1).await.unwrap());
        assert!(db.file_by_id(id).await.unwrap().is_none());
    }
}
