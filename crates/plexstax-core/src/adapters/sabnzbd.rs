// SABnzbd: usenet downloader

use std::future::Future;

use plexstax_api::{CallRequest, Error, HttpClient};
use serde::Serialize;
use serde_json::Value;

use super::endpoint;
use crate::adapter::ServiceAdapter;
use crate::config::StackConfig;
use crate::lenient;
use crate::service::Service;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SabnzbdCard {
    pub queue: u64,
    pub rate_down_bps: u64,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct SabnzbdAdapter {
    client: HttpClient,
    base: String,
    api_key: String,
}

impl ServiceAdapter for SabnzbdAdapter {
    const SERVICE: Service = Service::Sabnzbd;
    type Data = SabnzbdCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        let (base, api_key) = config.sabnzbd.keyed()?;
        Some(Self {
            client: client.clone(),
            base: base.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    fn fetch(&self) -> impl Future<Output = Result<SabnzbdCard, Error>> + Send {
        async move {
            let mut url = endpoint(&self.base, "/api")?;
            url.query_pairs_mut()
                .append_pair("mode", "queue")
                .append_pair("output", "json")
                .append_pair("apikey", &self.api_key);

            let body: Value = self.client.call(CallRequest::get(url)).await?;
            summarize(&body, &self.base)
        }
    }
}

/// SABnzbd answers bad keys with 200 and `{"status": false, "error": ..}`.
fn summarize(body: &Value, link: &str) -> Result<SabnzbdCard, Error> {
    if let Some(message) = body.get("error").and_then(Value::as_str) {
        return Err(Error::Api {
            message: message.to_owned(),
        });
    }

    let queue = body.get("queue").unwrap_or(&Value::Null);
    let slots = lenient::count(queue.get("noofslots")).unwrap_or_else(|| {
        queue
            .get("slots")
            .and_then(Value::as_array)
            .map_or(0, |s| u64::try_from(s.len()).unwrap_or(u64::MAX))
    });

    Ok(SabnzbdCard {
        queue: slots,
        rate_down_bps: kib_to_bytes(lenient::number(queue.get("kbpersec"))),
        link: link.to_owned(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn kib_to_bytes(kib: Option<f64>) -> u64 {
    let bytes = kib.unwrap_or(0.0) * 1024.0;
    if bytes.is_finite() && bytes > 0.0 {
        bytes.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn rate_is_converted_to_bytes() {
        let card = summarize(
            &json!({ "queue": { "noofslots": 3, "kbpersec": "12.5" } }),
            "http://sab:8080",
        )
        .unwrap();
        assert_eq!(
            card,
            SabnzbdCard {
                queue: 3,
                rate_down_bps: 12_800,
                link: "http://sab:8080".into()
            }
        );
    }

    #[test]
    fn slot_list_is_counted_without_noofslots() {
        let card = summarize(&json!({ "queue": { "slots": [{}, {}] } }), "").unwrap();
        assert_eq!(card.queue, 2);
        assert_eq!(card.rate_down_bps, 0);
    }

    #[test]
    fn error_envelope_fails_the_card() {
        let err = summarize(&json!({ "status": false, "error": "API Key Incorrect" }), "").unwrap_err();
        assert!(matches!(err, Error::Api { ref message } if message == "API Key Incorrect"));
    }

    #[test]
    fn unusable_rates_are_zero() {
        assert_eq!(kib_to_bytes(None), 0);
        assert_eq!(kib_to_bytes(Some(f64::INFINITY)), 0);
        assert_eq!(kib_to_bytes(Some(-2.0)), 0);
    }
}
