// ── Core error types ──
//
// Adapter failures never surface here: they are folded into `CardResult`
// cards. `CoreError` covers what remains above the adapters, namely a
// crashed adapter task and a client that could not be built.

use thiserror::Error;

use crate::service::Service;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Aggregation ──────────────────────────────────────────────────
    #[error("{service} adapter task failed: {message}")]
    AdapterJoin { service: Service, message: String },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Cannot build HTTP client: {reason}")]
    ClientBuild { reason: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<plexstax_api::Error> for CoreError {
    fn from(err: plexstax_api::Error) -> Self {
        match err {
            plexstax_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            plexstax_api::Error::InvalidHeader { name } => CoreError::Config {
                message: format!("Invalid value for {name}"),
            },
            other => CoreError::ClientBuild {
                reason: other.to_string(),
            },
        }
    }
}
