//! chunkscribe - Chunked audio transcription server
//!
//! Accepts audio uploads, splits oversized files into time-bounded segments
//! with ffmpeg, transcribes each segment through a speech-to-text API, and
//! streams progress to the caller as newline-delimited JSON.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod segmenter;
pub mod server;
pub mod storage;
pub mod transcriber;

// Core traits (split → transcribe)
pub use segmenter::{FfmpegSegmenter, Segmenter};
pub use transcriber::{OpenAiTranscriber, Transcriber};

// Pipeline
pub use pipeline::{EventSink, Pipeline};
pub use progress::{LineDecoder, ProgressEvent};

// Storage
pub use storage::{ArtifactEntry, ArtifactStore, Collection};

// HTTP surface
pub use server::{AppState, router};

// Error handling
pub use error::{ChunkscribeError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
