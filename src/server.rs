//! HTTP surface: the transcription endpoint and the Management API.
//!
//! The transcription endpoint accepts a multipart upload and answers with a
//! streaming newline-delimited JSON body fed by the pipeline run. Management
//! routes are plain CRUD over the artifact store's three collections and
//! never depend on pipeline run state.

use crate::error::ChunkscribeError;
use crate::pipeline::{EventSink, Pipeline};
use crate::storage::{ArtifactStore, Collection};
use axum::body::{Body, Bytes};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Shared state injected into every handler.
///
/// The pipeline holds trait objects for the segmenter and transcriber, so
/// tests exercise the full HTTP surface with in-process doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: ArtifactStore,
    pub pipeline: Arc<Pipeline>,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/transcribe", axum::routing::post(transcribe))
        .route("/api/uploads", get(list_uploads).delete(delete_all_uploads))
        .route("/api/uploads/{name}", axum::routing::delete(delete_upload))
        .route("/api/chunks", get(list_chunks).delete(delete_all_chunks))
        .route("/api/chunks/{name}", axum::routing::delete(delete_chunk_group))
        .route("/api/chunks/{group}/files", get(list_group_files))
        .route("/api/chunks/{group}/files/{name}", get(download_group_file))
        .route(
            "/api/documents",
            get(list_documents).delete(delete_all_documents),
        )
        .route(
            "/api/documents/{name}",
            get(download_document).delete(delete_document),
        )
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Transcription endpoint
// ---------------------------------------------------------------------------

/// `POST /api/transcribe`: accept the upload, then stream progress events.
///
/// The response body is NDJSON, one event per line, flushed as soon as each
/// event is produced and always terminated by exactly one `complete` or
/// `error` event.
async fn transcribe(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut saved: Option<PathBuf> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(mut field)) => {
                if field.name() == Some("audio") {
                    let original = field.file_name().unwrap_or("upload").to_string();
                    let path = match state.store.upload_destination(&original) {
                        Ok(path) => path,
                        Err(e) => return error_response(e),
                    };
                    if let Err(response) = stream_field_to_disk(&mut field, &path).await {
                        if let Err(e) = tokio::fs::remove_file(&path).await {
                            debug!(path = %path.display(), error = %e, "partial upload cleanup failed");
                        }
                        return response;
                    }
                    saved = Some(path);
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => return multipart_error(e),
        }
    }

    let Some(upload) = saved else {
        return bad_request("No audio file provided".to_string());
    };

    info!(upload = %upload.display(), "upload accepted");

    let (sink, rx) = EventSink::channel();
    let pipeline = Arc::clone(&state.pipeline);
    tokio::spawn(async move {
        pipeline.run(upload, sink).await;
    });

    // Sink drop after the terminal event closes the channel and ends the body.
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<Bytes, Infallible>(Bytes::from(event.to_line())), rx))
    });

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(stream))
    {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Write one multipart field to `path` chunk by chunk.
///
/// Uploads can run to the configured body limit, so the content never sits
/// fully in memory on its way to the uploads collection.
async fn stream_field_to_disk(
    field: &mut Field<'_>,
    path: &std::path::Path,
) -> std::result::Result<(), Response> {
    let mut file = match tokio::fs::File::create(path).await {
        Ok(file) => file,
        Err(e) => return Err(error_response(e.into())),
    };
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = file.write_all(&chunk).await {
                    return Err(error_response(e.into()));
                }
            }
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        }
    }
    match file.flush().await {
        Ok(()) => Ok(()),
        Err(e) => Err(error_response(e.into())),
    }
}

/// Multipart read failures keep their transport status: 413 for bodies over
/// the configured limit, 400 for malformed payloads.
fn multipart_error(err: MultipartError) -> Response {
    (
        err.status(),
        Json(json!({"error": format!("Upload failed: {}", err)})),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Management API
// ---------------------------------------------------------------------------

async fn list_uploads(State(state): State<AppState>) -> Response {
    list_collection(&state, Collection::Uploads)
}

async fn list_chunks(State(state): State<AppState>) -> Response {
    list_collection(&state, Collection::Chunks)
}

async fn list_documents(State(state): State<AppState>) -> Response {
    list_collection(&state, Collection::Documents)
}

async fn delete_upload(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    delete_item(&state, Collection::Uploads, &name)
}

async fn delete_chunk_group(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    delete_item(&state, Collection::Chunks, &name)
}

async fn delete_document(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    delete_item(&state, Collection::Documents, &name)
}

async fn delete_all_uploads(State(state): State<AppState>) -> Response {
    delete_collection(&state, Collection::Uploads)
}

async fn delete_all_chunks(State(state): State<AppState>) -> Response {
    delete_collection(&state, Collection::Chunks)
}

async fn delete_all_documents(State(state): State<AppState>) -> Response {
    delete_collection(&state, Collection::Documents)
}

async fn list_group_files(State(state): State<AppState>, Path(group): Path<String>) -> Response {
    match state.store.group_members(&group) {
        Ok(items) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": items.len(),
                "items": items,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn download_group_file(
    State(state): State<AppState>,
    Path((group, name)): Path<(String, String)>,
) -> Response {
    match state.store.member_path(&group, &name) {
        Ok(path) => serve_file(&path, &name, "audio/mpeg").await,
        Err(e) => error_response(e),
    }
}

async fn download_document(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.document_path(&name) {
        Ok(path) => serve_file(&path, &name, "application/pdf").await,
        Err(e) => error_response(e),
    }
}

async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

fn list_collection(state: &AppState, collection: Collection) -> Response {
    match state.store.list(collection) {
        Ok(items) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": items.len(),
                "items": items,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

fn delete_item(state: &AppState, collection: Collection, name: &str) -> Response {
    match state.store.delete_one(collection, name) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("{} deleted", name),
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

fn delete_collection(state: &AppState, collection: Collection) -> Response {
    match state.store.delete_all(collection) {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": count,
                "message": format!("{} items deleted", count),
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Binary download with an attachment disposition.
///
/// A delete racing the read surfaces as 404, not 500.
async fn serve_file(path: &std::path::Path, name: &str, content_type: &str) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(ChunkscribeError::NotFound {
                name: name.to_string(),
            })
        }
        Err(e) => error_response(e.into()),
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

/// Map the error taxonomy onto HTTP statuses with the uniform management
/// error shape.
fn error_response(err: ChunkscribeError) -> Response {
    let status = match &err {
        ChunkscribeError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        ChunkscribeError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({"success": false, "error": err.to_string()})),
    )
        .into_response()
}
