use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::{
    confirm_upload, get_access_url, get_access_urls, get_cover_access_url,
    request_presigned_upload,
};
use super::services::{AccessUrlService, UploadService};

/// Create routes for the storage (attachment upload) feature
pub fn routes(
    upload_service: Arc<UploadService>,
    access_url_service: Arc<AccessUrlService>,
) -> Router {
    let upload_routes = Router::new()
        .route("/api/storage/presigned/upload", post(request_presigned_upload))
        .route("/api/storage/{attachment_id}/completed", post(confirm_upload))
        .with_state(upload_service);

    let access_routes = Router::new()
        .route("/api/storage/urls", post(get_access_urls))
        .route("/api/storage/{attachment_id}/url", get(get_access_url))
        .route(
            "/api/storage/{attachment_id}/cover-url",
            get(get_cover_access_url),
        )
        .with_state(access_url_service);

    upload_routes.merge(access_routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UploadPolicy;
    use crate::features::attachments::dtos::{AccessUrlResponseDto, PresignedUploadResponseDto};
    use crate::shared::test_helpers::{with_test_user, FakeObjectStore, InMemoryDb};
    use crate::shared::types::ApiResponse;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    const MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn server(db: &Arc<InMemoryDb>, store: &Arc<FakeObjectStore>) -> TestServer {
        let policy = UploadPolicy::default();
        let app = routes(
            Arc::new(UploadService::new(db.clone(), store.clone(), policy)),
            Arc::new(AccessUrlService::new(db.clone(), store.clone(), policy)),
        );
        TestServer::new(with_test_user(app)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_confirm_and_fetch_url() {
        let db = InMemoryDb::new();
        let store = FakeObjectStore::new();
        let server = server(&db, &store);

        let response = server
            .post("/api/storage/presigned/upload")
            .json(&json!([{
                "file_name": "a.png",
                "mime_type": "image/png",
                "file_size": 1024,
                "md5": MD5
            }]))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: ApiResponse<Vec<PresignedUploadResponseDto>> = response.json();
        let instruction = body.data.unwrap().remove(0);
        assert!(!instruction.is_duplicate);
        assert!(instruction.object_key.ends_with(".png"));
        assert!(instruction
            .upload_url
            .as_deref()
            .is_some_and(|url| url.starts_with("https://")));

        // Not downloadable until confirmed
        server
            .get(&format!("/api/storage/{}/url", instruction.attachment_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        store.put_object(&instruction.object_key, MD5, 1024);

        server
            .post(&format!(
                "/api/storage/{}/completed",
                instruction.attachment_id
            ))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let response = server
            .get(&format!("/api/storage/{}/url", instruction.attachment_id))
            .await;
        response.assert_status_ok();
        let body: ApiResponse<AccessUrlResponseDto> = response.json();
        let access = body.data.unwrap();
        assert!(access.url.starts_with("https://"));
        assert_eq!(
            access.expires_in,
            UploadPolicy::default().access_url_expiry_secs
        );
    }

    #[tokio::test]
    async fn test_confirm_before_upload_is_unprocessable() {
        let db = InMemoryDb::new();
        let store = FakeObjectStore::new();
        let pending = db.seed_uploading("a.png", MD5);

        server(&db, &store)
            .post(&format!("/api/storage/{}/completed", pending.id))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let db = InMemoryDb::new();
        let store = FakeObjectStore::new();

        server(&db, &store)
            .get("/api/storage/not-a-uuid/url")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_batch_is_bad_request() {
        let db = InMemoryDb::new();
        let store = FakeObjectStore::new();

        server(&db, &store)
            .post("/api/storage/presigned/upload")
            .json(&json!([]))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_batch_urls_endpoint() {
        let db = InMemoryDb::new();
        let store = FakeObjectStore::new();
        let done = db.seed_completed("a.png", MD5, None);

        let response = server(&db, &store)
            .post("/api/storage/urls")
            .json(&json!({ "attachment_ids": [done.id] }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["items"][0]["attachment_id"], json!(done.id));
    }
}
