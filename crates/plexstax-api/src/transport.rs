// Bounded remote calls
//
// Every outbound request goes through `HttpClient::call`, which arms a
// per-call cancellation token and fires it once the bound elapses. Firing
// drops the in-flight reqwest future, which tears down the connection, so
// nothing keeps running past the bound from the caller's point of view.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Default bound applied when neither the request nor the client overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// TLS verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Accept any certificate (for self-signed home-lab services).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Process-wide default bound for a single call.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build an [`HttpClient`] from this config.
    ///
    /// `shutdown` is the parent of every per-call deadline token; cancelling
    /// it aborts all in-flight calls with [`Error::Cancelled`].
    pub fn build_client(&self, shutdown: CancellationToken) -> Result<HttpClient, Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.timeout)
            .user_agent(concat!("plexstax/", env!("CARGO_PKG_VERSION")));

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;
        Ok(HttpClient {
            http,
            default_timeout: self.timeout,
            shutdown,
        })
    }
}

// ── CallRequest ──────────────────────────────────────────────────────

/// One outbound call: target, method, headers, optional JSON body and bound.
#[derive(Clone)]
pub struct CallRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    basic_auth: Option<(String, Option<String>)>,
    timeout: Option<Duration>,
}

impl CallRequest {
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            basic_auth: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach the `X-Api-Key` header used by the *arr family and Overseerr.
    pub fn api_key(self, key: &str) -> Result<Self, Error> {
        let mut value =
            HeaderValue::from_str(key).map_err(|_| Error::InvalidHeader { name: "X-Api-Key" })?;
        value.set_sensitive(true);
        Ok(self.header(HeaderName::from_static("x-api-key"), value))
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.basic_auth = Some((username.into(), password));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Override the client's default bound for this call only.
    pub fn timeout(mut self, bound: Duration) -> Self {
        self.timeout = Some(bound);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

// ── HttpClient ───────────────────────────────────────────────────────

/// Cheaply cloneable HTTP client enforcing a time bound on every call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    default_timeout: Duration,
    shutdown: CancellationToken,
}

impl HttpClient {
    /// Wrap a pre-built `reqwest::Client`. Used by tests and embedders that
    /// already manage their own client.
    pub fn from_reqwest(http: reqwest::Client, default_timeout: Duration) -> Self {
        Self {
            http,
            default_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Perform one bounded call and decode the JSON body.
    pub async fn call<T: DeserializeOwned>(&self, request: CallRequest) -> Result<T, Error> {
        let bound = request.timeout.unwrap_or(self.default_timeout);
        let timeout_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX);
        debug!(method = %request.method, url = %redacted(&request.url), timeout_ms, "outbound call");

        let deadline = self.shutdown.child_token();
        let _timer = arm_deadline(deadline.clone(), bound);

        match deadline.run_until_cancelled(self.execute(request)).await {
            Some(result) => result,
            None if self.shutdown.is_cancelled() => Err(Error::Cancelled),
            None => Err(Error::Timeout { timeout_ms }),
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: CallRequest) -> Result<T, Error> {
        let CallRequest {
            method,
            url,
            headers,
            body,
            basic_auth,
            ..
        } = request;

        let mut builder = self.http.request(method, url).headers(headers);
        if let Some((username, password)) = basic_auth {
            builder = builder.basic_auth(username, password);
        }
        if let Some(ref body) = body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text,
        })
    }
}

/// Spawn the timer that fires `token` once `bound` elapses. The handle aborts
/// the timer on drop, so a call that finishes early leaves no sleeping task.
fn arm_deadline(token: CancellationToken, bound: Duration) -> AbortOnDropHandle<()> {
    AbortOnDropHandle::new(tokio::spawn(async move {
        tokio::time::sleep(bound).await;
        token.cancel();
    }))
}

/// Strip query-string API keys before a URL reaches the logs.
fn redacted(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k.eq_ignore_ascii_case("apikey")) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k.eq_ignore_ascii_case("apikey") {
                "***".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut clean = url.clone();
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean.to_string()
}
