//! Management API tests over the real router with a temp-dir store.

mod helpers;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chunkscribe::pipeline::Pipeline;
use chunkscribe::server::{AppState, router};
use chunkscribe::storage::{ArtifactStore, Collection};
use helpers::{StubSegmenter, StubTranscriber, temp_store};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app(store: ArtifactStore) -> Router {
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        Arc::new(StubSegmenter::splitting_into(1)),
        Arc::new(StubTranscriber::succeeding()),
        u64::MAX,
        false,
    ));
    router(AppState { store, pipeline }, 1024 * 1024)
}

fn fixture() -> (TempDir, ArtifactStore, Router) {
    let (dir, store) = temp_store();
    let app = app(store.clone());
    (dir, store, app)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::delete(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let (_dir, _store, app) = fixture();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn list_empty_collection() {
    let (_dir, _store, app) = fixture();
    for uri in ["/api/uploads", "/api/chunks", "/api/documents"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 0);
        assert_eq!(body["items"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn list_uploads_reports_metadata() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Uploads);
    std::fs::write(dir.join("call.mp3"), vec![0u8; 1536]).unwrap();

    let (status, body) = get(&app, "/api/uploads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let item = &body["items"][0];
    assert_eq!(item["name"], "call.mp3");
    assert_eq!(item["size"], 1536);
    assert_eq!(item["sizeFormatted"], "1.5 KB");
    assert!(item["createdAt"].is_string());
    assert!(item["modifiedAt"].is_string());
}

#[tokio::test]
async fn listing_is_read_only() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Uploads);
    std::fs::write(dir.join("a.mp3"), b"aa").unwrap();
    std::fs::write(dir.join("b.mp3"), b"bb").unwrap();

    let (_, first) = get(&app, "/api/uploads").await;
    let (_, second) = get(&app, "/api/uploads").await;
    assert_eq!(first, second);
    assert_eq!(store.list(Collection::Uploads).unwrap().len(), 2);
}

#[tokio::test]
async fn delete_one_upload() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Uploads);
    std::fs::write(dir.join("gone.mp3"), b"x").unwrap();
    std::fs::write(dir.join("kept.mp3"), b"x").unwrap();

    let (status, body) = delete(&app, "/api/uploads/gone.mp3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!dir.join("gone.mp3").exists());
    assert!(dir.join("kept.mp3").exists());
}

#[tokio::test]
async fn delete_missing_item_is_404() {
    let (_dir, _store, app) = fixture();
    let (status, body) = delete(&app, "/api/uploads/absent.mp3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn delete_traversal_name_is_400_with_no_mutation() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Uploads);
    std::fs::write(dir.join("keep.mp3"), b"x").unwrap();

    let (status, body) = delete(&app, "/api/uploads/evil..name.mp3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(dir.join("keep.mp3").exists());
}

#[tokio::test]
async fn delete_all_on_empty_collection_reports_zero() {
    let (_dir, _store, app) = fixture();
    let (status, body) = delete(&app, "/api/documents").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn delete_all_counts_removed_items() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Uploads);
    std::fs::write(dir.join("a.mp3"), b"x").unwrap();
    std::fs::write(dir.join("b.mp3"), b"x").unwrap();

    let (status, body) = delete(&app, "/api/uploads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(store.list(Collection::Uploads).unwrap().len(), 0);
}

#[tokio::test]
async fn delete_chunk_group_removes_whole_directory() {
    let (_dir, store, app) = fixture();
    let group = store.collection_dir(Collection::Chunks).join("g1");
    std::fs::create_dir_all(&group).unwrap();
    std::fs::write(group.join("chunk_000.mp3"), b"x").unwrap();

    let (status, _) = delete(&app, "/api/chunks/g1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!group.exists());
}

#[tokio::test]
async fn group_files_listed_in_segment_order() {
    let (_dir, store, app) = fixture();
    let group = store.collection_dir(Collection::Chunks).join("g1");
    std::fs::create_dir_all(&group).unwrap();
    std::fs::write(group.join("chunk_001.mp3"), b"x").unwrap();
    std::fs::write(group.join("chunk_000.mp3"), b"xy").unwrap();

    let (status, body) = get(&app, "/api/chunks/g1/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["items"][0]["name"], "chunk_000.mp3");
    assert_eq!(body["items"][1]["name"], "chunk_001.mp3");
}

#[tokio::test]
async fn group_files_of_missing_group_is_404() {
    let (_dir, _store, app) = fixture();
    let (status, _) = get(&app, "/api/chunks/absent/files").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_group_file_as_attachment() {
    let (_dir, store, app) = fixture();
    let group = store.collection_dir(Collection::Chunks).join("g1");
    std::fs::create_dir_all(&group).unwrap();
    std::fs::write(group.join("chunk_000.mp3"), b"audio-bytes").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/chunks/g1/files/chunk_000.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/mpeg"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"chunk_000.mp3\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"audio-bytes");
}

#[tokio::test]
async fn download_document_as_pdf_attachment() {
    let (_dir, store, app) = fixture();
    let dir = store.collection_dir(Collection::Documents);
    std::fs::write(dir.join("meeting.pdf"), b"%PDF-1.4 fake").unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/documents/meeting.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn download_document_with_wrong_extension_is_400() {
    let (_dir, _store, app) = fixture();
    let (status, body) = get(&app, "/api/documents/notes.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn download_missing_document_is_404() {
    let (_dir, _store, app) = fixture();
    let (status, _) = get(&app, "/api/documents/absent.pdf").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
