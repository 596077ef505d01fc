use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::database::constraint_violation;
use crate::core::error::{AppError, Result};
use crate::features::attachments::models::{Attachment, NewAttachment};

const ATTACHMENT_COLUMNS: &str = "id, object_key, cover_object_key, original_name, mime_type, \
     content_hash, cover_content_hash, file_size, status, created_at, updated_at";

/// Persistence for attachment records
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Start a transaction for a batch of inserts
    async fn begin(&self) -> Result<Box<dyn AttachmentTransaction>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>>;

    async fn find_completed_by_id(&self, id: Uuid) -> Result<Option<Attachment>>;

    /// Completed rows among `ids`; unknown or unfinished ids are skipped
    async fn find_completed_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>>;

    /// Flip the row to `completed`. Re-completing a completed row is a no-op.
    /// Fails with `Conflict` when another completed row already owns the hash.
    async fn mark_completed(&self, id: Uuid) -> Result<Attachment>;
}

/// Unit of work for an upload batch. Dropping it without `commit` rolls back.
#[async_trait]
pub trait AttachmentTransaction: Send {
    async fn find_completed_by_hash(&mut self, content_hash: &str) -> Result<Option<Attachment>>;

    async fn insert(&mut self, attachment: &NewAttachment) -> Result<Attachment>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn begin(&self) -> Result<Box<dyn AttachmentTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAttachmentTransaction { tx }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Attachment>> {
        let sql = format!("SELECT {} FROM attachments WHERE id = $1", ATTACHMENT_COLUMNS);
        let attachment = sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attachment)
    }

    async fn find_completed_by_id(&self, id: Uuid) -> Result<Option<Attachment>> {
        let sql = format!(
            "SELECT {} FROM attachments WHERE id = $1 AND status = 'completed'",
            ATTACHMENT_COLUMNS
        );
        let attachment = sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(attachment)
    }

    async fn find_completed_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Attachment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM attachments WHERE id = ANY($1) AND status = 'completed'",
            ATTACHMENT_COLUMNS
        );
        let attachments = sqlx::query_as::<_, Attachment>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(attachments)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<Attachment> {
        let sql = format!(
            r#"
            UPDATE attachments
            SET status = 'completed',
                updated_at = CASE WHEN status = 'completed' THEN updated_at ELSE NOW() END
            WHERE id = $1
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ErrorKind::UniqueViolation) => AppError::Conflict(
                    "Identical content was completed concurrently; request the upload again"
                        .to_string(),
                ),
                _ => AppError::Database(e),
            })?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))
    }
}

struct PgAttachmentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AttachmentTransaction for PgAttachmentTransaction {
    async fn find_completed_by_hash(&mut self, content_hash: &str) -> Result<Option<Attachment>> {
        let sql = format!(
            r#"
            SELECT {} FROM attachments
            WHERE content_hash = $1 AND status = 'completed'
            ORDER BY created_at
            LIMIT 1
            "#,
            ATTACHMENT_COLUMNS
        );
        let attachment = sqlx::query_as::<_, Attachment>(&sql)
            .bind(content_hash)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(attachment)
    }

    async fn insert(&mut self, attachment: &NewAttachment) -> Result<Attachment> {
        let sql = format!(
            r#"
            INSERT INTO attachments (
                id, object_key, cover_object_key, original_name, mime_type,
                content_hash, cover_content_hash, file_size
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ATTACHMENT_COLUMNS
        );

        sqlx::query_as::<_, Attachment>(&sql)
            .bind(attachment.id)
            .bind(&attachment.object_key)
            .bind(&attachment.cover_object_key)
            .bind(&attachment.original_name)
            .bind(&attachment.mime_type)
            .bind(&attachment.content_hash)
            .bind(&attachment.cover_content_hash)
            .bind(attachment.file_size)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ErrorKind::UniqueViolation) => AppError::Conflict(format!(
                    "Object key {} is already in use",
                    attachment.object_key
                )),
                Some(ErrorKind::CheckViolation) => {
                    AppError::Validation("Attachment fields violate table constraints".to_string())
                }
                _ => AppError::Database(e),
            })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
