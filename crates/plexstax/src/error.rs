//! Server error types with miette diagnostics.

use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;

use plexstax_config::ConfigError;
use plexstax_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const BIND: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    // ── Startup ──────────────────────────────────────────────────────

    #[error("Invalid configuration")]
    #[diagnostic(
        code(plexstax::config),
        help(
            "Settings are read from the TOML file given with --config (or plexstax.toml\n\
             in the platform config directory), then from environment variables such as\n\
             SONARR_URL, HTTP_TIMEOUT_MS and BIND. Blank values count as unset."
        )
    )]
    Config(#[from] ConfigError),

    #[error("Cannot set up the service adapters")]
    #[diagnostic(code(plexstax::setup))]
    Setup(#[from] CoreError),

    #[error("Cannot listen on {addr}")]
    #[diagnostic(
        code(plexstax::bind),
        help("Is another process using this port? Pick another with --bind or BIND.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    // ── Runtime ──────────────────────────────────────────────────────

    #[error("HTTP server failed")]
    #[diagnostic(code(plexstax::serve))]
    Serve(#[source] std::io::Error),
}

impl ServerError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::USAGE,
            Self::Bind { .. } => exit_code::BIND,
            Self::Setup(_) | Self::Serve(_) => exit_code::GENERAL,
        }
    }
}
