//! Default configuration constants for chunkscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Pass-through cutoff in bytes.
///
/// Uploads at or below this size are sent to the transcription API as a single
/// segment. The threshold only gates whether splitting happens at all; it does
/// not bound the size of individual segments (those are cut on time).
pub const PASS_THROUGH_BYTES: u64 = 25 * 1024 * 1024;

/// Segment length in seconds for the external splitter.
///
/// 600 seconds (10 minutes) keeps each stream-copied segment comfortably under
/// typical API payload limits for speech audio without re-encoding.
pub const SEGMENT_SECS: u32 = 600;

/// Maximum accepted upload size in bytes.
///
/// Requests above this are rejected before any processing begins.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Filename prefix the splitter uses for segment files.
///
/// Segments carry a zero-padded sequential index (`chunk_000`, `chunk_001`, …)
/// so lexical order equals temporal order.
pub const CHUNK_PREFIX: &str = "chunk_";

/// Default extension for segment files.
pub const CHUNK_EXT: &str = "mp3";

/// Default external splitter binary.
pub const FFMPEG_BIN: &str = "ffmpeg";

/// Default remote transcription endpoint.
pub const TRANSCRIPTION_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default remote transcription model.
pub const DEFAULT_MODEL: &str = "whisper-1";

/// Default language code sent with each transcription request.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default storage root, relative to the working directory.
pub const STORAGE_ROOT: &str = "data";

/// Extension for rendered transcript documents.
pub const DOCUMENT_EXT: &str = "pdf";

/// Placeholder value for the `duration` field of the terminal `complete` event.
///
/// The wire contract has always reported a constant here rather than a probed
/// audio duration; consumers treat it as opaque.
pub const DURATION_PLACEHOLDER: u64 = 0;
