use anyhow::Context;
use chunkscribe::cli::Cli;
use chunkscribe::config::Config;
use chunkscribe::pipeline::Pipeline;
use chunkscribe::segmenter::FfmpegSegmenter;
use chunkscribe::server::{AppState, router};
use chunkscribe::storage::ArtifactStore;
use chunkscribe::transcriber::OpenAiTranscriber;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path).with_env_overrides();

    // CLI overrides win over config file and environment
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(root) = cli.storage_root {
        config.storage.root = root;
    }

    let store = ArtifactStore::new(&config.storage.root);
    store
        .ensure_dirs()
        .with_context(|| format!("failed to prepare storage root {}", config.storage.root.display()))?;

    let api_key = match config.transcription.resolve_api_key() {
        Some(key) => key,
        None => {
            warn!("no API key configured; transcription requests will be rejected upstream");
            String::new()
        }
    };

    let segmenter = Arc::new(FfmpegSegmenter::new(&config.segmenter));
    let transcriber = Arc::new(
        OpenAiTranscriber::new(&config.transcription, api_key)
            .context("failed to build transcription client")?,
    );
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        segmenter,
        transcriber,
        config.segmenter.threshold_bytes,
        config.render.enabled,
    ));

    let state = AppState {
        store,
        pipeline,
    };
    let app = router(state, config.server.max_upload_bytes as usize);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        version = %chunkscribe::version_string(),
        address = %addr,
        storage = %config.storage.root.display(),
        "chunkscribe listening"
    );

    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
