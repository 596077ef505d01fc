use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::{
    add_attachment, create_moment, delete_moment, get_moment, list_moments, remove_attachment,
};
use super::services::MomentService;

/// Create routes for the moments feature
pub fn routes(moment_service: Arc<MomentService>) -> Router {
    Router::new()
        .route("/api/moments", get(list_moments).post(create_moment))
        .route("/api/moments/{id}", get(get_moment).delete(delete_moment))
        .route("/api/moments/{id}/attachments", post(add_attachment))
        .route(
            "/api/moments/{id}/attachments/{attachment_id}",
            delete(remove_attachment),
        )
        .with_state(moment_service)
}
