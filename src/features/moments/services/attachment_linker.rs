use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::moments::models::MomentAttachmentLink;
use crate::features::moments::repositories::MomentTransaction;
use crate::shared::constants::MAX_ATTACHMENT_POSITION;

/// Attaches uploaded files to a moment inside the caller's transaction.
///
/// Positions are range-checked before any row is written. A taken position
/// surfaces as `Conflict` from the store and the caller's transaction must be
/// abandoned. Attachments do not have to be completed to be linked.
pub struct AttachmentLinker;

impl AttachmentLinker {
    pub async fn link(
        tx: &mut dyn MomentTransaction,
        moment_id: Uuid,
        links: &[MomentAttachmentLink],
    ) -> Result<()> {
        if let Some(bad) = links
            .iter()
            .find(|link| !(0..=MAX_ATTACHMENT_POSITION).contains(&link.position))
        {
            return Err(AppError::Validation(format!(
                "Attachment position {} is outside 0-{}",
                bad.position, MAX_ATTACHMENT_POSITION
            )));
        }

        for link in links {
            tx.insert_link(moment_id, *link).await?;
        }

        debug!("Linked {} attachment(s) to moment {}", links.len(), moment_id);
        Ok(())
    }
}
