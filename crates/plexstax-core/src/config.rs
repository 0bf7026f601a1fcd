// ── Runtime stack configuration ──
//
// These types describe *which* services to poll and how hard. They carry
// credential data and tunables but never touch disk or the environment;
// `plexstax-config` builds a `StackConfig` and hands it in.

use std::time::Duration;

use plexstax_api::{TlsMode, TransportConfig, normalize_base_url};
use secrecy::{ExposeSecret, SecretString};

/// Address and credentials for one remote service.
///
/// Blank values are dropped on the way in, so "set to empty" and "absent"
/// are indistinguishable to the adapters.
#[derive(Debug, Clone, Default)]
pub struct ServiceCredentials {
    url: String,
    api_key: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
}

impl ServiceCredentials {
    /// Credentials for a service at `url` (normalized; blank means unset).
    pub fn new(url: &str) -> Self {
        Self {
            url: normalize_base_url(url),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = non_blank(key).map(|k| SecretString::from(k.to_owned()));
        self
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: Option<&str>, password: Option<&str>) -> Self {
        self.username = username.and_then(non_blank).map(str::to_owned);
        self.password = password
            .and_then(non_blank)
            .map(|p| SecretString::from(p.to_owned()));
        self
    }

    /// Normalized base URL, `None` when unset.
    pub fn base_url(&self) -> Option<&str> {
        (!self.url.is_empty()).then_some(self.url.as_str())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ExposeSecret::expose_secret)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Base URL and API key, when both are present.
    pub fn keyed(&self) -> Option<(&str, &str)> {
        Some((self.base_url()?, self.api_key()?))
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Everything the aggregator and streaming sessions need, read once at startup.
#[derive(Debug, Clone)]
pub struct StackConfig {
    pub sonarr: ServiceCredentials,
    pub radarr: ServiceCredentials,
    pub sabnzbd: ServiceCredentials,
    pub nzbget: ServiceCredentials,
    pub overseerr: ServiceCredentials,
    pub tautulli: ServiceCredentials,
    /// Default bound for one remote call.
    pub http_timeout: Duration,
    /// Shorter bound for liveness probes.
    pub probe_timeout: Duration,
    /// Period of the streaming tick.
    pub tick_interval: Duration,
    /// Emit per-item ribbon events on each tick.
    pub ribbons: bool,
    /// Push one snapshot right after the greeting instead of waiting a full interval.
    pub immediate_push: bool,
    /// Skip certificate verification for self-signed home-lab services.
    pub insecure_tls: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            sonarr: ServiceCredentials::default(),
            radarr: ServiceCredentials::default(),
            sabnzbd: ServiceCredentials::default(),
            nzbget: ServiceCredentials::default(),
            overseerr: ServiceCredentials::default(),
            tautulli: ServiceCredentials::default(),
            http_timeout: Duration::from_millis(4000),
            probe_timeout: Duration::from_millis(2000),
            tick_interval: Duration::from_millis(5000),
            ribbons: false,
            immediate_push: true,
            insecure_tls: false,
        }
    }
}

impl StackConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: if self.insecure_tls {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: self.http_timeout,
        }
    }
}
