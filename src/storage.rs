//! Filesystem-backed artifact store.
//!
//! Three independent collections live under the storage root: raw uploads,
//! chunk-group directories produced by pipeline runs, and rendered transcript
//! documents. This module is pure CRUD and enumeration; it knows nothing about
//! pipeline state.

use crate::defaults;
use crate::error::{ChunkscribeError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;
use uuid::Uuid;

/// One of the three top-level artifact collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Uploads,
    Chunks,
    Documents,
}

impl Collection {
    /// Directory name under the storage root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Uploads => "uploads",
            Collection::Chunks => "chunks",
            Collection::Documents => "documents",
        }
    }
}

/// Metadata for one stored artifact, as exposed by the Management API.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub name: String,
    pub size: u64,
    pub size_formatted: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Filesystem-backed persistence for uploads, chunk groups and documents.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create all collection directories if they don't exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        for collection in [Collection::Uploads, Collection::Chunks, Collection::Documents] {
            fs::create_dir_all(self.collection_dir(collection))?;
        }
        Ok(())
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.dir_name())
    }

    /// List a collection, newest-modified first.
    pub fn list(&self, collection: Collection) -> Result<Vec<ArtifactEntry>> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            match artifact_entry(&entry.path(), name) {
                Ok(item) => entries.push(item),
                // Concurrent deletion between readdir and stat is fine
                Err(ChunkscribeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(entries)
    }

    /// Delete one artifact by name. Group directories are removed recursively.
    pub fn delete_one(&self, collection: Collection, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.collection_dir(collection).join(name);
        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChunkscribeError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let removal = if metadata.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|e| ChunkscribeError::Storage {
            message: format!("failed to delete {}: {}", name, e),
        })
    }

    /// Delete every artifact in a collection, best-effort per item.
    ///
    /// Returns the number of items actually removed.
    pub fn delete_all(&self, collection: Collection) -> Result<usize> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir)?;
        let mut deleted = 0;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete artifact");
                }
            }
        }
        Ok(deleted)
    }

    /// List the segment files inside one chunk group.
    pub fn group_members(&self, group: &str) -> Result<Vec<ArtifactEntry>> {
        validate_name(group)?;
        let dir = self.collection_dir(Collection::Chunks).join(group);
        if !dir.is_dir() {
            return Err(ChunkscribeError::NotFound {
                name: group.to_string(),
            });
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            match artifact_entry(&entry.path(), name) {
                Ok(item) => entries.push(item),
                // Concurrent deletion between readdir and stat is fine
                Err(ChunkscribeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Resolve the on-disk path of one segment inside a chunk group.
    pub fn member_path(&self, group: &str, name: &str) -> Result<PathBuf> {
        validate_name(group)?;
        validate_name(name)?;
        let path = self
            .collection_dir(Collection::Chunks)
            .join(group)
            .join(name);
        if !path.is_file() {
            return Err(ChunkscribeError::NotFound {
                name: format!("{}/{}", group, name),
            });
        }
        Ok(path)
    }

    /// Resolve the on-disk path of one rendered document.
    pub fn document_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        if !name.ends_with(&format!(".{}", defaults::DOCUMENT_EXT)) {
            return Err(ChunkscribeError::InvalidInput {
                message: format!("document name must end in .{}", defaults::DOCUMENT_EXT),
            });
        }
        let path = self.collection_dir(Collection::Documents).join(name);
        if !path.is_file() {
            return Err(ChunkscribeError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(path)
    }

    /// Reserve a unique on-disk destination for an uploaded file.
    ///
    /// The stored name is `{unix millis}-{original base name}` so listings sort
    /// naturally and re-uploads never collide. The caller writes the content;
    /// large uploads are streamed straight to this path rather than buffered.
    pub fn upload_destination(&self, original_filename: &str) -> Result<PathBuf> {
        let base = Path::new(original_filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty() && n != ".." && n != ".")
            .unwrap_or_else(|| "upload".to_string());
        let dir = self.collection_dir(Collection::Uploads);
        fs::create_dir_all(&dir)?;
        let name = format!("{}-{}", Utc::now().timestamp_millis(), base);
        Ok(dir.join(name))
    }

    /// Persist an uploaded file under a unique on-disk name.
    pub fn save_upload(&self, original_filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.upload_destination(original_filename)?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Create a fresh, uniquely named chunk-group directory for one run.
    pub fn fresh_group_dir(&self) -> Result<PathBuf> {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8]);
        let dir = self.collection_dir(Collection::Chunks).join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Reject artifact names that could escape a collection directory.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ChunkscribeError::InvalidInput {
            message: format!("invalid artifact name: {:?}", name),
        });
    }
    Ok(())
}

/// Human-readable byte count: 1024 base, up to two decimals, no trailing zeros.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    let exp = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let formatted = format!("{:.2}", value);
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", formatted, UNITS[exp])
}

fn artifact_entry(path: &Path, name: String) -> Result<ArtifactEntry> {
    let metadata = fs::metadata(path)?;
    let size = if metadata.is_dir() {
        dir_size(path)?
    } else {
        metadata.len()
    };
    let modified_at = to_datetime(metadata.modified()?);
    // Creation time is not available on every filesystem; fall back to mtime
    let created_at = metadata
        .created()
        .map(to_datetime)
        .unwrap_or(modified_at);
    Ok(ArtifactEntry {
        name,
        size,
        size_formatted: format_bytes(size),
        created_at,
        modified_at,
    })
}

fn dir_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        total += if metadata.is_dir() {
            dir_size(&entry.path())?
        } else {
            metadata.len()
        };
    }
    Ok(total)
}

fn to_datetime(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}
