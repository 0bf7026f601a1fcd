// ── Card results ──
//
// A card is the per-service summary the dashboard renders. Every adapter
// resolves to exactly one `CardResult` per tick, whatever happened remotely.

use serde::Serialize;

use crate::adapters::{
    NzbgetCard, OverseerrCard, RadarrCard, SabnzbdCard, SonarrCard, TautulliCard,
};
use crate::service::Service;

/// Message shown instead of the raw error when a call ran out of time.
pub const TIMEOUT_HINT: &str = "Timed out (increase HTTP_TIMEOUT_MS or check URL/network)";

/// Outcome of one adapter for one tick.
///
/// Serializes as `{"state":"ok","data":..}`, `{"state":"not_configured","message":..}`
/// or `{"state":"error","message":..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardResult<T> {
    NotConfigured { message: String },
    Ok { data: T },
    Error { message: String },
}

impl<T> CardResult<T> {
    pub fn not_configured(service: Service) -> Self {
        Self::NotConfigured {
            message: service.setup_hint(),
        }
    }

    pub fn from_error(err: &plexstax_api::Error) -> Self {
        let message = if err.is_timeout() {
            TIMEOUT_HINT.to_owned()
        } else {
            err.to_string()
        };
        Self::Error { message }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::NotConfigured { message } | Self::Error { message } => Some(message),
            Self::Ok { .. } => None,
        }
    }
}

/// One card per service, produced together by a single aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSnapshot {
    pub sonarr: CardResult<SonarrCard>,
    pub radarr: CardResult<RadarrCard>,
    pub sab: CardResult<SabnzbdCard>,
    pub nzbget: CardResult<NzbgetCard>,
    pub overseerr: CardResult<OverseerrCard>,
    pub tautulli: CardResult<TautulliCard>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn ok_card_carries_data_only() {
        let card: CardResult<u32> = CardResult::Ok { data: 3 };
        assert_eq!(serde_json::to_value(&card).unwrap(), json!({ "state": "ok", "data": 3 }));
        assert_eq!(card.message(), None);
    }

    #[test]
    fn not_configured_card_carries_hint() {
        let card: CardResult<u32> = CardResult::not_configured(Service::Overseerr);
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            json!({ "state": "not_configured", "message": "Set OVERSEERR_URL and OVERSEERR_API_KEY" })
        );
        assert!(card.data().is_none());
    }

    #[test]
    fn timeout_is_rewritten_to_hint() {
        let card: CardResult<u32> =
            CardResult::from_error(&plexstax_api::Error::Timeout { timeout_ms: 4000 });
        assert_eq!(card.message(), Some(TIMEOUT_HINT));
    }

    #[test]
    fn other_errors_are_shown_verbatim() {
        let card: CardResult<u32> = CardResult::from_error(&plexstax_api::Error::Api {
            message: "Invalid apikey".into(),
        });
        assert_eq!(card.message(), Some("API error: Invalid apikey"));
        assert!(!card.is_ok());
    }
}
