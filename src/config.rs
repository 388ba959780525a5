use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub segmenter: SegmenterConfig,
    pub transcription: TranscriptionConfig,
    pub render: RenderConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: u64,
}

/// Artifact store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
}

/// External splitter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SegmenterConfig {
    pub ffmpeg_bin: String,
    pub threshold_bytes: u64,
    pub segment_secs: u32,
    pub chunk_ext: String,
}

/// Remote transcription API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub model: String,
    pub language: String,
    /// API key. Usually left unset here and provided via environment instead.
    pub api_key: Option<String>,
}

/// Transcript document rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::DEFAULT_PORT,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(defaults::STORAGE_ROOT),
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: defaults::FFMPEG_BIN.to_string(),
            threshold_bytes: defaults::PASS_THROUGH_BYTES,
            segment_secs: defaults::SEGMENT_SECS,
            chunk_ext: defaults::CHUNK_EXT.to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::TRANSCRIPTION_ENDPOINT.to_string(),
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            api_key: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl TranscriptionConfig {
    /// Resolve the API key: explicit config value first, then
    /// `CHUNKSCRIBE_API_KEY`, then `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Some(key.clone());
        }
        for var in ["CHUNKSCRIBE_API_KEY", "OPENAI_API_KEY"] {
            if let Ok(key) = std::env::var(var)
                && !key.is_empty()
            {
                return Some(key);
            }
        }
        None
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CHUNKSCRIBE_PORT → server.port
    /// - CHUNKSCRIBE_STORAGE_ROOT → storage.root
    /// - CHUNKSCRIBE_MODEL → transcription.model
    /// - CHUNKSCRIBE_LANGUAGE → transcription.language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("CHUNKSCRIBE_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }

        if let Ok(root) = std::env::var("CHUNKSCRIBE_STORAGE_ROOT")
            && !root.is_empty()
        {
            self.storage.root = PathBuf::from(root);
        }

        if let Ok(model) = std::env::var("CHUNKSCRIBE_MODEL")
            && !model.is_empty()
        {
            self.transcription.model = model;
        }

        if let Ok(language) = std::env::var("CHUNKSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.transcription.language = language;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/chunkscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("chunkscribe")
            .join("config.toml")
    }
}
