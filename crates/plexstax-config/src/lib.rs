//! Configuration for the plexstax server.
//!
//! Settings come from serde defaults, then an optional TOML file, then the
//! process environment (`SONARR_URL`, `HTTP_TIMEOUT_MS`, ...), later layers
//! winning. Blank values anywhere count as unset. The result is translated
//! into an immutable `plexstax_core::StackConfig` once at startup.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;

use plexstax_core::{ServiceCredentials, StackConfig};

/// Listen address when neither the file, the environment nor the CLI set one.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 4000;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_TICK_INTERVAL_MS: u64 = 5000;

/// Environment variables read by [`load`], lowercased to match field names.
const ENV_KEYS: &[&str] = &[
    "sonarr_url",
    "sonarr_api_key",
    "radarr_url",
    "radarr_api_key",
    "sabnzbd_url",
    "sabnzbd_api_key",
    "nzbget_url",
    "nzbget_user",
    "nzbget_pass",
    "overseerr_url",
    "overseerr_api_key",
    "overseer_url",
    "overseer_api_key",
    "tautulli_url",
    "tautulli_api_key",
    "http_timeout_ms",
    "probe_timeout_ms",
    "tick_interval_ms",
    "ribbons",
    "immediate_push",
    "bind",
    "insecure_tls",
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.to_ascii_uppercase(),
        reason: reason.into(),
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Raw settings as read from the providers.
///
/// Every field is optional text: the environment cannot distinguish an API
/// key of `12345` from a number, so typing happens in [`Settings::stack_config`].
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "loose::text")]
    pub sonarr_url: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub sonarr_api_key: Option<SecretString>,
    #[serde(deserialize_with = "loose::text")]
    pub radarr_url: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub radarr_api_key: Option<SecretString>,
    #[serde(deserialize_with = "loose::text")]
    pub sabnzbd_url: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub sabnzbd_api_key: Option<SecretString>,
    #[serde(deserialize_with = "loose::text")]
    pub nzbget_url: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub nzbget_user: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub nzbget_pass: Option<SecretString>,
    #[serde(deserialize_with = "loose::text")]
    pub overseerr_url: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub overseerr_api_key: Option<SecretString>,
    /// Legacy spelling, used only when `overseerr_url` is unset.
    #[serde(deserialize_with = "loose::text")]
    pub overseer_url: Option<String>,
    /// Legacy spelling, used only when `overseerr_api_key` is unset.
    #[serde(deserialize_with = "loose::secret")]
    pub overseer_api_key: Option<SecretString>,
    #[serde(deserialize_with = "loose::text")]
    pub tautulli_url: Option<String>,
    #[serde(deserialize_with = "loose::secret")]
    pub tautulli_api_key: Option<SecretString>,

    #[serde(deserialize_with = "loose::text")]
    pub http_timeout_ms: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub probe_timeout_ms: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub tick_interval_ms: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub ribbons: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub immediate_push: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub insecure_tls: Option<String>,
    #[serde(deserialize_with = "loose::text")]
    pub bind: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sonarr_url", &self.sonarr_url)
            .field("radarr_url", &self.radarr_url)
            .field("sabnzbd_url", &self.sabnzbd_url)
            .field("nzbget_url", &self.nzbget_url)
            .field("overseerr_url", &self.overseerr_url)
            .field("tautulli_url", &self.tautulli_url)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("bind", &self.bind)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Validate and translate into the engine's configuration.
    pub fn stack_config(&self) -> Result<StackConfig, ConfigError> {
        let keyed = |url: &Option<String>, key: &Option<SecretString>| {
            ServiceCredentials::new(url.as_deref().unwrap_or_default())
                .with_api_key(key.as_ref().map_or("", ExposeSecret::expose_secret))
        };

        let overseerr_url = first_set(&self.overseerr_url, &self.overseer_url);
        let overseerr_key = first_set_secret(&self.overseerr_api_key, &self.overseer_api_key);

        Ok(StackConfig {
            sonarr: keyed(&self.sonarr_url, &self.sonarr_api_key),
            radarr: keyed(&self.radarr_url, &self.radarr_api_key),
            sabnzbd: keyed(&self.sabnzbd_url, &self.sabnzbd_api_key),
            nzbget: ServiceCredentials::new(self.nzbget_url.as_deref().unwrap_or_default())
                .with_basic_auth(
                    self.nzbget_user.as_deref(),
                    self.nzbget_pass.as_ref().map(ExposeSecret::expose_secret),
                ),
            overseerr: ServiceCredentials::new(overseerr_url.unwrap_or_default())
                .with_api_key(overseerr_key.unwrap_or_default()),
            tautulli: keyed(&self.tautulli_url, &self.tautulli_api_key),
            http_timeout: millis("http_timeout_ms", &self.http_timeout_ms, DEFAULT_HTTP_TIMEOUT_MS)?,
            probe_timeout: millis("probe_timeout_ms", &self.probe_timeout_ms, DEFAULT_PROBE_TIMEOUT_MS)?,
            tick_interval: millis("tick_interval_ms", &self.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS)?,
            ribbons: flag("ribbons", &self.ribbons, false)?,
            immediate_push: flag("immediate_push", &self.immediate_push, true)?,
            insecure_tls: flag("insecure_tls", &self.insecure_tls, false)?,
        })
    }

    /// Listen address, `override_addr` (the CLI flag) winning.
    pub fn bind_addr(&self, override_addr: Option<&str>) -> Result<SocketAddr, ConfigError> {
        let raw = override_addr
            .and_then(non_blank)
            .or_else(|| self.bind.as_deref().and_then(non_blank))
            .unwrap_or(DEFAULT_BIND);
        raw.parse()
            .map_err(|_| invalid("bind", format!("'{raw}' is not a socket address")))
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn first_set<'a>(primary: &'a Option<String>, legacy: &'a Option<String>) -> Option<&'a str> {
    primary
        .as_deref()
        .and_then(non_blank)
        .or_else(|| legacy.as_deref().and_then(non_blank))
}

fn first_set_secret<'a>(
    primary: &'a Option<SecretString>,
    legacy: &'a Option<SecretString>,
) -> Option<&'a str> {
    primary
        .as_ref()
        .map(ExposeSecret::expose_secret)
        .and_then(non_blank)
        .or_else(|| legacy.as_ref().map(ExposeSecret::expose_secret).and_then(non_blank))
}

fn millis(field: &str, raw: &Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let ms = match raw.as_deref().and_then(non_blank) {
        None => default,
        Some(text) => text
            .parse::<u64>()
            .map_err(|_| invalid(field, format!("'{text}' is not a whole number of milliseconds")))?,
    };
    if ms == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

fn flag(field: &str, raw: &Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(text) = raw.as_deref().and_then(non_blank) else {
        return Ok(default);
    };
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(field, format!("'{text}' is not a boolean"))),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Default config file location via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "plexstax", "plexstax").map_or_else(
        || PathBuf::from("plexstax.toml"),
        |dirs| dirs.config_dir().join("plexstax.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: TOML file at `path` (if it exists), then environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::raw().only(ENV_KEYS))
}

/// Load settings from `path`, or from [`config_path`] when `None`.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    Ok(figment(&path).extract()?)
}

// ── Lenient field readers ───────────────────────────────────────────

mod loose {
    use super::{Deserialize, Deserializer, SecretString, de, fmt};

    /// Accept a string, number or boolean and keep its text form.
    struct Text(String);

    impl<'de> Deserialize<'de> for Text {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct Visitor;

            impl de::Visitor<'_> for Visitor {
                type Value = Text;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a string, number or boolean")
                }

                fn visit_str<E: de::Error>(self, v: &str) -> Result<Text, E> {
                    Ok(Text(v.to_owned()))
                }

                fn visit_bool<E: de::Error>(self, v: bool) -> Result<Text, E> {
                    Ok(Text(v.to_string()))
                }

                fn visit_i64<E: de::Error>(self, v: i64) -> Result<Text, E> {
                    Ok(Text(v.to_string()))
                }

                fn visit_u64<E: de::Error>(self, v: u64) -> Result<Text, E> {
                    Ok(Text(v.to_string()))
                }

                fn visit_f64<E: de::Error>(self, v: f64) -> Result<Text, E> {
                    Ok(Text(v.to_string()))
                }
            }

            deserializer.deserialize_any(Visitor)
        }
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Text>::deserialize(d)?
            .map(|Text(s)| s.trim().to_owned())
            .filter(|s| !s.is_empty()))
    }

    pub(super) fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
        Ok(text(d)?.map(SecretString::from))
    }
}
