use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use super::AttachmentLinker;
use crate::core::error::{AppError, Result};
use crate::features::moments::dtos::{
    AttachmentLinkDto, CreateMomentDto, MomentPageDto, MomentResponseDto,
};
use crate::features::moments::models::{Moment, MomentAttachmentLink};
use crate::features::moments::repositories::MomentRepository;
use crate::shared::types::CursorQuery;

pub struct MomentService {
    repository: Arc<dyn MomentRepository>,
}

impl MomentService {
    pub fn new(repository: Arc<dyn MomentRepository>) -> Self {
        Self { repository }
    }

    /// Insert the moment and its attachment links atomically
    pub async fn create_moment(&self, dto: CreateMomentDto) -> Result<MomentResponseDto> {
        let links: Vec<MomentAttachmentLink> =
            dto.attachments.into_iter().map(Into::into).collect();
        let moment_id = Uuid::now_v7();

        let mut tx = self.repository.begin().await?;
        tx.insert_moment(moment_id, &dto.content).await?;
        AttachmentLinker::link(tx.as_mut(), moment_id, &links).await?;
        tx.commit().await?;

        info!(
            "Created moment {} with {} attachment(s)",
            moment_id,
            links.len()
        );

        self.get_moment(moment_id).await
    }

    pub async fn get_moment(&self, moment_id: Uuid) -> Result<MomentResponseDto> {
        let moment = self
            .repository
            .find_by_id(moment_id)
            .await?
            .ok_or_else(|| moment_not_found(moment_id))?;

        self.with_attachments(moment).await
    }

    /// Newest-first page of moments with their attachments. `next_cursor` is
    /// the creation time (unix ms) of the last item when more moments exist.
    pub async fn list_moments(&self, query: &CursorQuery) -> Result<MomentPageDto> {
        let limit = query.limit();
        let mut moments = self.repository.list_page(query.before(), limit + 1).await?;

        let has_next = moments.len() as i64 > limit;
        moments.truncate(limit as usize);
        let next_cursor = if has_next {
            moments.last().map(|m| m.created_at.timestamp_millis())
        } else {
            None
        };

        let items = try_join_all(moments.into_iter().map(|moment| self.with_attachments(moment)))
            .await?;

        debug!(
            "Listed {} moment(s), next cursor {:?}",
            items.len(),
            next_cursor
        );

        Ok(MomentPageDto { items, next_cursor })
    }

    async fn with_attachments(&self, moment: Moment) -> Result<MomentResponseDto> {
        let attachments = self.repository.find_linked_attachments(moment.id).await?;
        Ok(MomentResponseDto::from_parts(moment, attachments))
    }

    pub async fn add_attachment(
        &self,
        moment_id: Uuid,
        dto: AttachmentLinkDto,
    ) -> Result<MomentResponseDto> {
        let mut tx = self.repository.begin().await?;
        tx.find_moment(moment_id)
            .await?
            .ok_or_else(|| moment_not_found(moment_id))?;
        AttachmentLinker::link(tx.as_mut(), moment_id, &[dto.into()]).await?;
        tx.commit().await?;

        info!(
            "Linked attachment {} to moment {} at position {}",
            dto.attachment_id, moment_id, dto.position
        );

        self.get_moment(moment_id).await
    }

    /// Unlinks the attachment; the attachment row and blob stay
    pub async fn remove_attachment(&self, moment_id: Uuid, attachment_id: Uuid) -> Result<()> {
        if !self.repository.remove_link(moment_id, attachment_id).await? {
            return Err(AppError::NotFound(format!(
                "Attachment {} is not linked to moment {}",
                attachment_id, moment_id
            )));
        }

        info!("Unlinked attachment {} from moment {}", attachment_id, moment_id);
        Ok(())
    }

    pub async fn delete_moment(&self, moment_id: Uuid) -> Result<()> {
        if !self.repository.delete(moment_id).await? {
            return Err(moment_not_found(moment_id));
        }

        info!("Deleted moment {}", moment_id);
        Ok(())
    }
}

fn moment_not_found(moment_id: Uuid) -> AppError {
    AppError::NotFound(format!("Moment {} not found", moment_id))
}
