use thiserror::Error;

/// Longest slice of a failed response body carried in [`Error::HttpStatus`].
pub const SNIPPET_LEN: usize = 120;

/// Top-level error type for the `plexstax-api` crate.
///
/// Every outbound call resolves to a value or one of these. `plexstax-core`
/// folds them into card messages; nothing here is ever shown raw to the
/// dashboard except through [`Display`](std::fmt::Display).
#[derive(Debug, Error)]
pub enum Error {
    // ── Bounds ──────────────────────────────────────────────────────
    /// The call did not complete within its time bound.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The process-wide shutdown token fired while the call was in flight.
    #[error("Request cancelled")]
    Cancelled,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    ///
    /// The request URL is stripped on conversion: some services take their
    /// API key in the query string.
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (usually an API key) contained characters HTTP forbids.
    #[error("Invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    // ── Remote ──────────────────────────────────────────────────────
    /// The remote answered with a non-success status.
    #[error("HTTP {status}{}", describe_failure(.reason, .snippet))]
    HttpStatus {
        status: u16,
        reason: String,
        snippet: String,
    },

    /// A JSON-RPC endpoint returned an `error` member.
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// The remote answered 200 with an in-band failure envelope.
    #[error("API error: {message}")]
    Api { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl Error {
    /// Returns `true` if the call ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// The HTTP status code, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn http_status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            snippet: body.trim().chars().take(SNIPPET_LEN).collect(),
        }
    }
}

fn describe_failure(reason: &str, snippet: &str) -> String {
    let mut out = String::new();
    if !reason.is_empty() {
        out.push(' ');
        out.push_str(reason);
    }
    if !snippet.is_empty() {
        out.push_str(": ");
        out.push_str(snippet);
    }
    out
}
