//! Shared test doubles and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use chunkscribe::error::{ChunkscribeError, Result};
use chunkscribe::pipeline::{EventSink, Pipeline};
use chunkscribe::progress::ProgressEvent;
use chunkscribe::segmenter::Segmenter;
use chunkscribe::storage::ArtifactStore;
use chunkscribe::transcriber::Transcriber;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Segmenter double: fabricates `chunk_count` segment files, or fails.
pub struct StubSegmenter {
    pub chunk_count: usize,
    pub fail_code: Option<i32>,
    pub calls: AtomicUsize,
}

impl StubSegmenter {
    pub fn splitting_into(chunk_count: usize) -> Self {
        Self {
            chunk_count,
            fail_code: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            chunk_count: 0,
            fail_code: Some(code),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Segmenter for StubSegmenter {
    async fn segment(&self, _input: &Path, group_dir: &Path) -> Result<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.fail_code {
            return Err(ChunkscribeError::SegmentationFailed { code });
        }
        let mut segments = Vec::new();
        for i in 0..self.chunk_count {
            let path = group_dir.join(format!("chunk_{:03}.mp3", i));
            std::fs::write(&path, b"segment")?;
            segments.push(path);
        }
        Ok(segments)
    }
}

/// Transcriber double: returns `text{n}` per call, optionally failing at one
/// 1-based call index, optionally sleeping to simulate slow remote calls.
pub struct StubTranscriber {
    pub fail_at: Option<usize>,
    pub delays_ms: Vec<u64>,
    pub calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn succeeding() -> Self {
        Self {
            fail_at: None,
            delays_ms: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::succeeding()
        }
    }

    pub fn with_delays(delays_ms: Vec<u64>) -> Self {
        Self {
            delays_ms,
            ..Self::succeeding()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _segment: &Path) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delays_ms.get(call - 1) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.fail_at == Some(call) {
            return Err(ChunkscribeError::TranscriptionFailed {
                status: 502,
                body: "upstream exploded".to_string(),
            });
        }
        Ok(format!("text{}", call))
    }
}

/// A store over a fresh temp directory with all collections created.
pub fn temp_store() -> (TempDir, ArtifactStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = ArtifactStore::new(dir.path());
    store.ensure_dirs().expect("create collection dirs");
    (dir, store)
}

/// Build a pipeline over the given doubles with document rendering off.
pub fn test_pipeline(
    store: ArtifactStore,
    segmenter: Arc<StubSegmenter>,
    transcriber: Arc<StubTranscriber>,
    threshold_bytes: u64,
) -> Pipeline {
    Pipeline::new(store, segmenter, transcriber, threshold_bytes, false)
}

/// Run one pipeline job and collect its full event stream.
pub async fn collect_events(pipeline: &Pipeline, upload: PathBuf) -> Vec<ProgressEvent> {
    let (sink, mut rx) = EventSink::channel();
    pipeline.run(upload, sink).await;
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Create an upload fixture of exactly `size` bytes (sparse, no real I/O cost).
pub fn upload_of_size(dir: &Path, name: &str, size: u64) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).expect("create upload fixture");
    file.set_len(size).expect("size upload fixture");
    path
}

/// Encode one multipart/form-data body with a single file field.
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "chunkscribe-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/mpeg\r\n\r\n",
            boundary, field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}
