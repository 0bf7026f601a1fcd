use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Live feed for a media-stack dashboard.
///
/// Polls Sonarr, Radarr, SABnzbd, NZBGet, Overseerr and Tautulli and streams
/// per-service cards to browsers over server-sent events.
#[derive(Debug, Parser)]
#[command(name = "plexstax", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); defaults to plexstax.toml in the platform config dir
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen address (overrides BIND)
    #[arg(long, short = 'b', value_name = "ADDR")]
    pub bind: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
