//! Transcription pipeline orchestrator.
//!
//! Drives one run through its stages: threshold gate → split → per-segment
//! transcription → assembly → optional document rendering, emitting progress
//! events along the way. Stages run strictly sequentially; progress percent is
//! meaningful only because work is strictly ordered.
//!
//! All stage failures are converted into exactly one terminal `error` event;
//! nothing escapes past the progress channel boundary.

use crate::error::Result;
use crate::progress::ProgressEvent;
use crate::render;
use crate::segmenter::Segmenter;
use crate::storage::ArtifactStore;
use crate::transcriber::Transcriber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Order-preserving, write-once event sink for one run.
///
/// Backed by an unbounded channel so emitting never blocks behind the HTTP
/// writer. A dropped receiver (caller disconnected) turns later emits into
/// no-ops; in-flight work runs to completion.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            debug!("progress receiver dropped; run continues without a listener");
        }
    }
}

/// Outcome of a successful run, carried into the terminal `complete` event.
struct RunOutcome {
    transcription: String,
    chunk_count: usize,
    pdf_filename: Option<String>,
}

/// The pipeline orchestrator.
///
/// Holds no per-run state; multiple runs may execute concurrently, each with
/// its own uniquely named chunk-group directory.
pub struct Pipeline {
    store: ArtifactStore,
    segmenter: Arc<dyn Segmenter>,
    transcriber: Arc<dyn Transcriber>,
    threshold_bytes: u64,
    render_documents: bool,
}

impl Pipeline {
    pub fn new(
        store: ArtifactStore,
        segmenter: Arc<dyn Segmenter>,
        transcriber: Arc<dyn Transcriber>,
        threshold_bytes: u64,
        render_documents: bool,
    ) -> Self {
        Self {
            store,
            segmenter,
            transcriber,
            threshold_bytes,
            render_documents,
        }
    }

    /// Run one transcription job to its terminal event.
    ///
    /// Always emits exactly one terminal event (`complete` or `error`) and
    /// never panics on stage failure.
    pub async fn run(&self, upload: PathBuf, sink: EventSink) {
        info!(upload = %upload.display(), "transcription run started");
        match self.execute(&upload, &sink).await {
            Ok(outcome) => {
                info!(
                    upload = %upload.display(),
                    chunks = outcome.chunk_count,
                    "transcription run complete"
                );
                sink.emit(ProgressEvent::Complete {
                    transcription: outcome.transcription,
                    chunk_count: outcome.chunk_count,
                    duration: crate::defaults::DURATION_PLACEHOLDER,
                    pdf_filename: outcome.pdf_filename,
                    message: "Transcription complete".to_string(),
                });
            }
            Err(message) => {
                warn!(upload = %upload.display(), error = %message, "transcription run failed");
                sink.emit(ProgressEvent::Error { message });
            }
        }
    }

    /// Execute all stages, returning the caller-facing message on failure.
    async fn execute(&self, upload: &Path, sink: &EventSink) -> std::result::Result<RunOutcome, String> {
        let group_dir = self
            .store
            .fresh_group_dir()
            .map_err(|e| format!("Failed to prepare chunk directory: {}", e))?;

        let segments = self.split(upload, &group_dir, sink).await?;
        let total = segments.len();

        let mut fragments = Vec::with_capacity(total);
        for (i, segment) in segments.iter().enumerate() {
            let index = i + 1;
            // Emitted before the remote call: the caller sees "starting
            // segment i", not "finished segment i".
            sink.emit(ProgressEvent::Transcribing {
                progress: percent(index, total),
                message: format!("Transcribing part {} of {}...", index, total),
            });
            let text = self
                .transcriber
                .transcribe(segment)
                .await
                .map_err(|e| format!("Failed to transcribe part {} of {}: {}", index, total, e))?;
            fragments.push(text);
        }

        let transcription = fragments.join(" ");

        let pdf_filename = if self.render_documents {
            match render::render_document(&self.store, upload, &transcription) {
                Ok(name) => Some(name),
                Err(e) => {
                    // Rendering is best-effort: the run still completes.
                    warn!(upload = %upload.display(), error = %e, "document rendering failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(RunOutcome {
            transcription,
            chunk_count: total,
            pdf_filename,
        })
    }

    /// Threshold gate plus external split.
    ///
    /// At or below the threshold the upload itself is the single segment and
    /// no `splitting` event is emitted. Above it, the external splitter runs;
    /// a clean exit with zero output segments is a run-fatal error, not a
    /// vacuous success.
    async fn split(
        &self,
        upload: &Path,
        group_dir: &Path,
        sink: &EventSink,
    ) -> std::result::Result<Vec<PathBuf>, String> {
        let size = file_size(upload).map_err(|e| format!("Failed to read upload: {}", e))?;

        if size <= self.threshold_bytes {
            sink.emit(ProgressEvent::SplitComplete {
                chunk_count: 1,
                message: "File is small enough, no split required".to_string(),
            });
            return Ok(vec![upload.to_path_buf()]);
        }

        sink.emit(ProgressEvent::Splitting {
            message: "Splitting audio file...".to_string(),
        });

        let segments = self
            .segmenter
            .segment(upload, group_dir)
            .await
            .map_err(|e| format!("Failed to split audio: {}", e))?;

        if segments.is_empty() {
            return Err("Segmentation produced no output segments".to_string());
        }

        sink.emit(ProgressEvent::SplitComplete {
            chunk_count: segments.len(),
            message: format!("Audio split into {} parts", segments.len()),
        });
        Ok(segments)
    }
}

/// Progress percent for starting segment `index` of `total`, 1-based.
pub(crate) fn percent(index: usize, total: usize) -> u8 {
    ((index as f64 / total as f64) * 100.0).round() as u8
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}
