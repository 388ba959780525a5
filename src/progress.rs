//! Progress channel wire format.
//!
//! One transcription run emits an append-only sequence of status events,
//! serialized one JSON object per line and flushed as soon as produced.
//! Exactly one terminal event (`complete` or `error`) appears per run, always
//! last. The state machine core deals only in [`ProgressEvent`] values; the
//! line encoding happens at the boundary.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One status event in a run's progress stream.
///
/// Field names follow the established wire contract (camelCase, snake_case
/// status tags), so consumers written against the original protocol keep
/// working unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The input exceeded the pass-through threshold and splitting started.
    Splitting { message: String },
    /// Segmentation finished (or was skipped); carries the segment count.
    SplitComplete {
        #[serde(rename = "chunkCount")]
        chunk_count: usize,
        message: String,
    },
    /// About to transcribe one segment. Emitted before the remote call.
    Transcribing { progress: u8, message: String },
    /// Terminal success: full transcript plus run metadata.
    Complete {
        transcription: String,
        #[serde(rename = "chunkCount")]
        chunk_count: usize,
        duration: u64,
        #[serde(
            rename = "pdfFilename",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        pdf_filename: Option<String>,
        message: String,
    },
    /// Terminal failure at any stage.
    Error { message: String },
}

impl ProgressEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    /// Serialize to one newline-terminated JSON line.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"status":"error","message":"event serialization failed: {}"}}"#,
                e
            )
        });
        line.push('\n');
        line
    }
}

/// Incremental decoder for a newline-delimited progress stream.
///
/// Consumers read the stream in arbitrary byte chunks; a trailing partial line
/// is held over until the next feed completes it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of stream data, returning every event completed by it.
    pub fn feed(&mut self, chunk: &str) -> Result<Vec<ProgressEvent>> {
        self.buf.push_str(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line)?);
        }
        Ok(events)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> &str {
        &self.buf
    }
}
