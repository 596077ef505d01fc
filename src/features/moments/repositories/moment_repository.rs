use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::database::constraint_violation;
use crate::core::error::{AppError, Result};
use crate::features::moments::models::{LinkedAttachment, Moment, MomentAttachmentLink};

const POSITION_CONSTRAINT: &str = "uq_moment_attachments_position";

#[async_trait]
pub trait MomentRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn MomentTransaction>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Moment>>;

    /// Up to `limit` moments created strictly before `before`, newest first
    async fn list_page(&self, before: Option<DateTime<Utc>>, limit: i64) -> Result<Vec<Moment>>;

    /// Links of a moment ordered by position
    async fn find_linked_attachments(&self, moment_id: Uuid) -> Result<Vec<LinkedAttachment>>;

    /// Returns false when no such link exists
    async fn remove_link(&self, moment_id: Uuid, attachment_id: Uuid) -> Result<bool>;

    /// Deletes the moment and its links. Attachments are left untouched.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Unit of work spanning a moment insert and its attachment links.
/// Dropping it without `commit` rolls back.
#[async_trait]
pub trait MomentTransaction: Send {
    async fn insert_moment(&mut self, id: Uuid, content: &str) -> Result<Moment>;

    async fn find_moment(&mut self, id: Uuid) -> Result<Option<Moment>>;

    /// Fails with `Conflict` on a taken position or an already linked
    /// attachment, and `NotFound` for an unknown attachment.
    async fn insert_link(&mut self, moment_id: Uuid, link: MomentAttachmentLink) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

pub struct PgMomentRepository {
    pool: PgPool,
}

impl PgMomentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MomentRepository for PgMomentRepository {
    async fn begin(&self) -> Result<Box<dyn MomentTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgMomentTransaction { tx }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Moment>> {
        let moment = sqlx::query_as::<_, Moment>(
            "SELECT id, content, created_at, updated_at FROM moments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(moment)
    }

    async fn list_page(&self, before: Option<DateTime<Utc>>, limit: i64) -> Result<Vec<Moment>> {
        let moments = sqlx::query_as::<_, Moment>(
            r#"
            SELECT id, content, created_at, updated_at
            FROM moments
            WHERE $1::timestamptz IS NULL OR created_at < $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(moments)
    }

    async fn find_linked_attachments(&self, moment_id: Uuid) -> Result<Vec<LinkedAttachment>> {
        let links = sqlx::query_as::<_, LinkedAttachment>(
            r#"
            SELECT ma.attachment_id, ma.position, a.status, a.mime_type, a.original_name
            FROM moment_attachments ma
            JOIN attachments a ON a.id = ma.attachment_id
            WHERE ma.moment_id = $1
            ORDER BY ma.position
            "#,
        )
        .bind(moment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    async fn remove_link(&self, moment_id: Uuid, attachment_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM moment_attachments WHERE moment_id = $1 AND attachment_id = $2",
        )
        .bind(moment_id)
        .bind(attachment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM moments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

struct PgMomentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MomentTransaction for PgMomentTransaction {
    async fn insert_moment(&mut self, id: Uuid, content: &str) -> Result<Moment> {
        let moment = sqlx::query_as::<_, Moment>(
            r#"
            INSERT INTO moments (id, content)
            VALUES ($1, $2)
            RETURNING id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(moment)
    }

    async fn find_moment(&mut self, id: Uuid) -> Result<Option<Moment>> {
        let moment = sqlx::query_as::<_, Moment>(
            "SELECT id, content, created_at, updated_at FROM moments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(moment)
    }

    async fn insert_link(&mut self, moment_id: Uuid, link: MomentAttachmentLink) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO moment_attachments (moment_id, attachment_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(moment_id)
        .bind(link.attachment_id)
        .bind(link.position)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| link_error(e, link))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

fn link_error(error: sqlx::Error, link: MomentAttachmentLink) -> AppError {
    let constraint = match &error {
        sqlx::Error::Database(db_error) => db_error.constraint().map(str::to_string),
        _ => None,
    };

    match constraint_violation(&error) {
        Some(ErrorKind::UniqueViolation) if constraint.as_deref() == Some(POSITION_CONSTRAINT) => {
            AppError::Conflict(format!("Position {} is already taken", link.position))
        }
        Some(ErrorKind::UniqueViolation) => AppError::Conflict(format!(
            "Attachment {} is already linked",
            link.attachment_id
        )),
        Some(ErrorKind::ForeignKeyViolation) => {
            AppError::NotFound(format!("Attachment {} not found", link.attachment_id))
        }
        Some(ErrorKind::CheckViolation) => {
            AppError::Validation(format!("Position {} is out of range", link.position))
        }
        _ => AppError::Database(error),
    }
}
