// Tautulli: Plex session tracker

use std::future::Future;

use plexstax_api::{CallRequest, Error, HttpClient};
use serde::Serialize;
use serde_json::Value;

use super::endpoint;
use crate::adapter::ServiceAdapter;
use crate::config::StackConfig;
use crate::lenient;
use crate::service::Service;

/// Most sessions carried on one card.
pub const MAX_SESSIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub user: String,
    pub title: String,
    pub percent: u8,
    /// Milliseconds, as reported by Plex.
    pub duration: u64,
    /// Milliseconds into the item.
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TautulliCard {
    pub total: u64,
    pub sessions: Vec<SessionSummary>,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct TautulliAdapter {
    client: HttpClient,
    base: String,
    api_key: String,
}

impl ServiceAdapter for TautulliAdapter {
    const SERVICE: Service = Service::Tautulli;
    type Data = TautulliCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        let (base, api_key) = config.tautulli.keyed()?;
        Some(Self {
            client: client.clone(),
            base: base.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    fn fetch(&self) -> impl Future<Output = Result<TautulliCard, Error>> + Send {
        async move {
            let mut url = endpoint(&self.base, "/api/v2")?;
            url.query_pairs_mut()
                .append_pair("apikey", &self.api_key)
                .append_pair("cmd", "get_activity");

            let body: Value = self.client.call(CallRequest::get(url)).await?;
            summarize(&body, &self.base)
        }
    }
}

fn summarize(body: &Value, link: &str) -> Result<TautulliCard, Error> {
    let response = body.get("response").unwrap_or(&Value::Null);
    if response.get("result").and_then(Value::as_str) == Some("error") {
        let message = lenient::first_str(response, &["message"]).unwrap_or("Tautulli reported an error");
        return Err(Error::Api {
            message: message.to_owned(),
        });
    }

    let data = response.get("data").unwrap_or(&Value::Null);
    let all = data.get("sessions").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
    let sessions: Vec<SessionSummary> = all.iter().take(MAX_SESSIONS).map(session).collect();

    let reported = lenient::count(data.get("stream_count")).unwrap_or(0);
    let total = if reported > 0 {
        reported
    } else {
        u64::try_from(sessions.len()).unwrap_or(u64::MAX)
    };

    Ok(TautulliCard {
        total,
        sessions,
        link: link.to_owned(),
    })
}

fn session(raw: &Value) -> SessionSummary {
    SessionSummary {
        user: lenient::first_str(raw, &["friendly_name", "username"])
            .unwrap_or("User")
            .to_owned(),
        title: lenient::first_str(raw, &["full_title", "title"])
            .unwrap_or_default()
            .to_owned(),
        percent: lenient::percent(lenient::number(raw.get("progress_percent")).unwrap_or(0.0)),
        duration: lenient::count(raw.get("duration")).unwrap_or(0),
        position: lenient::count(raw.get("view_offset")).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn sessions_are_capped_and_mapped() {
        let sessions: Vec<Value> = (0..7)
            .map(|i| json!({ "username": format!("u{i}"), "title": "Ep", "progress_percent": "42" }))
            .collect();
        let body = json!({ "response": { "result": "success", "data": { "stream_count": "7", "sessions": sessions } } });

        let card = summarize(&body, "http://t").unwrap();
        assert_eq!(card.total, 7);
        assert_eq!(card.sessions.len(), MAX_SESSIONS);
        assert_eq!(card.sessions[0].percent, 42);
        assert_eq!(card.sessions[4].user, "u4");
    }

    #[test]
    fn session_fields_fall_back() {
        let s = session(&json!({
            "friendly_name": "", "full_title": "Andor - S01E03",
            "progress_percent": 130, "duration": "3600000", "view_offset": 1200
        }));
        assert_eq!(
            s,
            SessionSummary {
                user: "User".into(),
                title: "Andor - S01E03".into(),
                percent: 100,
                duration: 3_600_000,
                position: 1200,
            }
        );
    }

    #[test]
    fn total_falls_back_to_session_count() {
        let body = json!({ "response": { "data": { "stream_count": 0, "sessions": [{}, {}] } } });
        assert_eq!(summarize(&body, "").unwrap().total, 2);
    }

    #[test]
    fn error_envelope_fails_the_card() {
        let body = json!({ "response": { "result": "error", "message": "Invalid apikey", "data": {} } });
        let err = summarize(&body, "").unwrap_err();
        assert_eq!(err.to_string(), "API error: Invalid apikey");
    }
}
