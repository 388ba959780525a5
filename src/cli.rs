//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chunkscribe", version, about = "Chunked audio transcription server")]
pub struct Cli {
    /// Path to config file (default: ~/.config/chunkscribe/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Storage root directory (overrides config)
    #[arg(long)]
    pub storage_root: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
