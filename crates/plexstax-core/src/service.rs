use serde::Serialize;
use strum::{Display, EnumIter};

/// The six remote systems a stack can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
pub enum Service {
    Sonarr,
    Radarr,
    #[strum(to_string = "SABnzbd")]
    #[serde(rename = "SABnzbd")]
    Sabnzbd,
    #[strum(to_string = "NZBGet")]
    #[serde(rename = "NZBGet")]
    Nzbget,
    Overseerr,
    Tautulli,
}

impl Service {
    /// Key of this service in an `AggregateSnapshot` and in log fields.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sonarr => "sonarr",
            Self::Radarr => "radarr",
            Self::Sabnzbd => "sab",
            Self::Nzbget => "nzbget",
            Self::Overseerr => "overseerr",
            Self::Tautulli => "tautulli",
        }
    }

    /// Configuration keys that must be set before the adapter makes any call.
    pub const fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::Sonarr => &["SONARR_URL", "SONARR_API_KEY"],
            Self::Radarr => &["RADARR_URL", "RADARR_API_KEY"],
            Self::Sabnzbd => &["SABNZBD_URL", "SABNZBD_API_KEY"],
            Self::Nzbget => &["NZBGET_URL"],
            Self::Overseerr => &["OVERSEERR_URL", "OVERSEERR_API_KEY"],
            Self::Tautulli => &["TAUTULLI_URL", "TAUTULLI_API_KEY"],
        }
    }

    /// Hint shown on a `NotConfigured` card.
    pub fn setup_hint(self) -> String {
        format!("Set {}", self.required_keys().join(" and "))
    }
}
