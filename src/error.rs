//! Error types for chunkscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkscribeError {
    // Request validation errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // Pipeline stage errors
    #[error("Segmentation process exited with code {code}")]
    SegmentationFailed { code: i32 },

    #[error("Transcription service returned {status}: {body}")]
    TranscriptionFailed { status: u16, body: String },

    #[error("Document rendering failed: {message}")]
    RenderingFailed { message: String },

    // Artifact store errors
    #[error("Not found: {name}")]
    NotFound { name: String },

    #[error("Storage operation failed: {message}")]
    Storage { message: String },

    // Transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ChunkscribeError>;
