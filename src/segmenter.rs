//! Audio segmentation via an external splitter process.
//!
//! Splitting is delegated to ffmpeg's fixed-interval segment muxer with
//! stream-copy semantics (no re-encoding): cuts land on a time interval, so
//! individual segment sizes are not bounded by the pass-through threshold.

use crate::config::SegmenterConfig;
use crate::defaults;
use crate::error::{ChunkscribeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Capability interface for splitting one audio artifact into ordered segments.
///
/// This trait allows swapping implementations (real ffmpeg vs a test double
/// that fabricates segment lists without spawning a process).
#[async_trait]
pub trait Segmenter: Send + Sync {
    /// Split `input` into segment files inside `group_dir`.
    ///
    /// # Returns
    /// Segment paths in lexical (= temporal) order. An empty list means the
    /// splitter exited cleanly but produced nothing; callers decide what that
    /// means for the run.
    async fn segment(&self, input: &Path, group_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Real splitter backed by an ffmpeg subprocess.
pub struct FfmpegSegmenter {
    ffmpeg_bin: String,
    segment_secs: u32,
    chunk_ext: String,
}

impl FfmpegSegmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            segment_secs: config.segment_secs,
            chunk_ext: config.chunk_ext.clone(),
        }
    }
}

#[async_trait]
impl Segmenter for FfmpegSegmenter {
    async fn segment(&self, input: &Path, group_dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = group_dir.join(format!("{}%03d.{}", defaults::CHUNK_PREFIX, self.chunk_ext));

        let output = Command::new(&self.ffmpeg_bin)
            .arg("-i")
            .arg(input)
            .args(["-f", "segment"])
            .args(["-segment_time", &self.segment_secs.to_string()])
            .args(["-c", "copy"])
            .args(["-map", "0"])
            .arg(&pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        debug!(
            input = %input.display(),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "ffmpeg finished"
        );

        if !output.status.success() {
            return Err(ChunkscribeError::SegmentationFailed {
                code: output.status.code().unwrap_or(-1),
            });
        }

        collect_chunks(group_dir)
    }
}

/// Enumerate a group directory for splitter output, in lexical order.
///
/// Only files matching the segment naming convention are returned; anything
/// else in the directory is ignored.
pub fn collect_chunks(group_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut chunks = Vec::new();
    for entry in std::fs::read_dir(group_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name
            .to_string_lossy()
            .starts_with(defaults::CHUNK_PREFIX)
            && entry.file_type()?.is_file()
        {
            chunks.push(entry.path());
        }
    }
    chunks.sort();
    Ok(chunks)
}
