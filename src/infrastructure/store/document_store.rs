use crate::infrastructure::store::rows::{AttachmentRow, RecordRow, StoredDocument};
use crate::shared::error::{AppError, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::str::FromStr;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const UPSERT_RECORD: &str = r#"
    INSERT INTO records (
        collection, id, parent_id, body, synced, offline,
        attempts, last_attempt_at, last_error, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(collection, id) DO UPDATE SET
        parent_id = excluded.parent_id,
        body = excluded.body,
        synced = excluded.synced,
        offline = excluded.offline,
        attempts = excluded.attempts,
        last_attempt_at = excluded.last_attempt_at,
        last_error = excluded.last_error,
        updated_at = excluded.updated_at
"#;

/// Durable, transactional storage for all syncable collections and their
/// binary attachments. Holds pending work only: confirmed records are
/// deleted, never flagged.
#[derive(Clone)]
pub struct DocumentStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct AttachmentData {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|err| AppError::Configuration(err.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Insert-or-replace by identifier. Replacement keeps the original
    /// `created_at`: edits rewrite the payload, never the identity.
    pub async fn put(&self, collection: &str, doc: &StoredDocument) -> Result<()> {
        let body = serde_json::to_string(&doc.body)?;
        sqlx::query(UPSERT_RECORD)
            .bind(collection)
            .bind(&doc.id)
            .bind(&doc.parent_id)
            .bind(&body)
            .bind(doc.synced)
            .bind(doc.offline)
            .bind(doc.attempts as i64)
            .bind(doc.last_attempt_at.map(|t| t.timestamp()))
            .bind(&doc.last_error)
            .bind(doc.created_at.timestamp())
            .bind(doc.updated_at.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record plus binary in one atomic unit, so a photo can never exist
    /// without its bytes or the other way around.
    pub async fn put_with_attachment(
        &self,
        collection: &str,
        doc: &StoredDocument,
        attachment: &AttachmentData,
    ) -> Result<()> {
        let body = serde_json::to_string(&doc.body)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(UPSERT_RECORD)
            .bind(collection)
            .bind(&doc.id)
            .bind(&doc.parent_id)
            .bind(&body)
            .bind(doc.synced)
            .bind(doc.offline)
            .bind(doc.attempts as i64)
            .bind(doc.last_attempt_at.map(|t| t.timestamp()))
            .bind(&doc.last_error)
            .bind(doc.created_at.timestamp())
            .bind(doc.updated_at.timestamp())
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO attachments (record_id, filename, content_type, bytes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(record_id) DO UPDATE SET
                filename = excluded.filename,
                content_type = excluded.content_type,
                bytes = excluded.bytes
            "#,
        )
        .bind(&doc.id)
        .bind(&attachment.filename)
        .bind(&attachment.content_type)
        .bind(&attachment.bytes)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM records WHERE collection = ?1 AND id = ?2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RecordRow::into_document).transpose()
    }

    pub async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM records WHERE collection = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordRow::into_document).collect()
    }

    /// The pending queue view: an indexed filter, not separate storage.
    pub async fn query_pending(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT * FROM records
            WHERE collection = ?1 AND synced = 0
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordRow::into_document).collect()
    }

    pub async fn query_by_parent(
        &self,
        collection: &str,
        parent_id: &str,
    ) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT * FROM records
            WHERE collection = ?1 AND parent_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(collection)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordRow::into_document).collect()
    }

    pub async fn query_created_between(
        &self,
        collection: &str,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
    ) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT * FROM records
            WHERE collection = ?1 AND created_at >= ?2 AND created_at <= ?3
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(collection)
        .bind(from.timestamp())
        .bind(to.timestamp())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordRow::into_document).collect()
    }

    pub async fn delete_by_id(&self, collection: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transient flip used by syncers immediately before deletion. If the
    /// process dies between this and the delete, the recovery sweep removes
    /// the leftover on next startup.
    pub async fn mark_synced(&self, collection: &str, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE records SET synced = 1, updated_at = ?3
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_attempt(&self, collection: &str, id: &str, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE records
            SET attempts = attempts + 1, last_attempt_at = ?3, last_error = ?4
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Utc::now().timestamp())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count(&self, collection: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn count_pending(&self, collection: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM records WHERE collection = ?1 AND synced = 0",
        )
        .bind(collection)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn attachment_bytes(&self, record_id: &str) -> Result<Option<AttachmentData>> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "SELECT * FROM attachments WHERE record_id = ?1",
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| AttachmentData {
            filename: row.filename,
            content_type: row.content_type,
            bytes: row.bytes,
        }))
    }

    /// Scoped multi-statement atomic unit. The whole closure commits or the
    /// whole closure rolls back; partial state never survives.
    pub async fn run_transaction<T, F>(&self, work: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Transaction<'static, Sqlite>) -> BoxFuture<'t, Result<T>>
            + Send,
    {
        let mut tx = self.pool.begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    /// Delete a parent together with every dependent record (and their
    /// binaries) in one transaction. Returns the number of records removed.
    pub async fn delete_cascade(
        &self,
        collection: &str,
        id: &str,
        dependents: &[&str],
    ) -> Result<u64> {
        let collection = collection.to_string();
        let id = id.to_string();
        let dependents: Vec<String> = dependents.iter().map(|d| d.to_string()).collect();

        self.run_transaction(move |tx| {
            Box::pin(async move {
                let mut removed = 0u64;
                for dependent in &dependents {
                    sqlx::query(
                        r#"
                        DELETE FROM attachments WHERE record_id IN (
                            SELECT id FROM records WHERE collection = ?1 AND parent_id = ?2
                        )
                        "#,
                    )
                    .bind(dependent)
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;

                    let result = sqlx::query(
                        "DELETE FROM records WHERE collection = ?1 AND parent_id = ?2",
                    )
                    .bind(dependent)
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
                    removed += result.rows_affected();
                }

                sqlx::query("DELETE FROM attachments WHERE record_id = ?1")
                    .bind(&id)
                    .execute(&mut **tx)
                    .await?;
                let result =
                    sqlx::query("DELETE FROM records WHERE collection = ?1 AND id = ?2")
                        .bind(&collection)
                        .bind(&id)
                        .execute(&mut **tx)
                        .await?;
                removed += result.rows_affected();

                Ok(removed)
            })
        })
        .await
    }

    /// Startup recovery: a record left with `synced = 1` was confirmed by
    /// the remote system but its deletion was interrupted. Removing it is
    /// idempotent cleanup, not data loss.
    pub async fn remove_synced_leftovers(&self) -> Result<u64> {
        self.run_transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    r#"
                    DELETE FROM attachments WHERE record_id IN (
                        SELECT id FROM records WHERE synced = 1
                    )
                    "#,
                )
                .execute(&mut **tx)
                .await?;
                let result = sqlx::query("DELETE FROM records WHERE synced = 1")
                    .execute(&mut **tx)
                    .await?;
                Ok(result.rows_affected())
            })
        })
        .await
    }
}
