use std::path::PathBuf;

use clap::Parser;

/// Harbor: desktop host for a local backend and its web frontend.
#[derive(Parser, Debug)]
#[command(name = "harbor", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Skip the startup update check.
    #[arg(long)]
    pub skip_update_check: bool,

    /// Backend binary to run instead of the configured one.
    #[arg(long)]
    pub backend_path: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
