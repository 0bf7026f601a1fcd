// Per-service adapters
//
// Each module owns one remote system: its credential requirements, its
// endpoints and fallbacks, and the mapping onto its card payload.

mod arr;
pub mod nzbget;
pub mod overseerr;
pub mod radarr;
pub mod sabnzbd;
pub mod sonarr;
pub mod tautulli;

use url::Url;

pub use nzbget::{NzbgetAdapter, NzbgetCard};
pub use overseerr::{OverseerrAdapter, OverseerrCard};
pub use radarr::{RadarrAdapter, RadarrCard};
pub use sabnzbd::{SabnzbdAdapter, SabnzbdCard};
pub use sonarr::{SonarrAdapter, SonarrCard};
pub use tautulli::{SessionSummary, TautulliAdapter, TautulliCard};

/// Join a normalized base URL (which may carry a path prefix) and an
/// absolute API path.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url, plexstax_api::Error> {
    Ok(Url::parse(&format!("{base}{path}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = endpoint("http://media.lan/sonarr", "/api/v3/queue?page=1").unwrap();
        assert_eq!(url.as_str(), "http://media.lan/sonarr/api/v3/queue?page=1");
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        assert!(endpoint("http://exa mple", "/api").is_err());
    }
}
