// Shared v3 API client for the *arr queue managers
//
// Sonarr and Radarr expose the same `/api/v3` surface for status, queue and
// history, authenticated with an `X-Api-Key` header.

use std::time::Duration;

use chrono::{DateTime, Utc};
use plexstax_api::{CallRequest, Error, HttpClient};
use serde_json::Value;
use tracing::debug;

use super::endpoint;
use crate::config::ServiceCredentials;
use crate::lenient;
use crate::ribbon::{self, RibbonEvent};
use crate::service::Service;

const STATUS_PATH: &str = "/api/v3/system/status";
const HISTORY_PATH: &str = "/api/v3/history?page=1&pageSize=100&sortKey=date&sortDirection=descending";

#[derive(Debug, Clone)]
pub(super) struct ArrApi {
    service: Service,
    client: HttpClient,
    base: String,
    api_key: String,
    probe_timeout: Duration,
}

impl ArrApi {
    pub(super) fn new(
        service: Service,
        creds: &ServiceCredentials,
        client: &HttpClient,
        probe_timeout: Duration,
    ) -> Option<Self> {
        let (base, api_key) = creds.keyed()?;
        Some(Self {
            service,
            client: client.clone(),
            base: base.to_owned(),
            api_key: api_key.to_owned(),
            probe_timeout,
        })
    }

    pub(super) fn link(&self) -> &str {
        &self.base
    }

    fn request(&self, path: &str) -> Result<CallRequest, Error> {
        CallRequest::get(endpoint(&self.base, path)?).api_key(&self.api_key)
    }

    pub(super) async fn get(&self, path: &str) -> Result<Value, Error> {
        self.client.call(self.request(path)?).await
    }

    /// Cheap liveness check under the short probe bound.
    pub(super) async fn probe(&self) -> Result<(), Error> {
        let request = self.request(STATUS_PATH)?.timeout(self.probe_timeout);
        let _: Value = self.client.call(request).await?;
        Ok(())
    }

    /// Item count of a paged (or unpaged) listing endpoint.
    pub(super) async fn count(&self, path: &str) -> Result<u64, Error> {
        Ok(total_records(&self.get(path).await?))
    }

    /// Download and import events recorded within the trailing `window`.
    /// History is best-effort: a failing call counts as zero.
    pub(super) async fn moved_within(&self, window: chrono::Duration) -> u64 {
        match self.get(HISTORY_PATH).await {
            Ok(history) => count_moved(&history, Utc::now() - window),
            Err(err) => {
                debug!(service = self.service.key(), error = %err, "history unavailable");
                0
            }
        }
    }

    /// Queue records at `path` that are done downloading but not yet
    /// imported. Best-effort like the history figure.
    pub(super) async fn awaiting_import(&self, path: &str) -> u64 {
        match self.get(path).await {
            Ok(queue) => {
                let n = records(&queue).iter().filter(|r| ribbon::awaiting_import(r)).count();
                u64::try_from(n).unwrap_or(u64::MAX)
            }
            Err(err) => {
                debug!(service = self.service.key(), error = %err, "queue page unavailable");
                0
            }
        }
    }

    /// One ribbon per record of the queue page at `path`.
    pub(super) async fn queue_ribbons(
        &self,
        path: &str,
        title_paths: &[&str],
        fallback_title: &str,
    ) -> Result<Vec<RibbonEvent>, Error> {
        let queue = self.get(path).await?;
        Ok(records(&queue)
            .iter()
            .map(|record| {
                RibbonEvent::from_queue_record(self.service, record, title_paths, fallback_title)
            })
            .collect())
    }
}

/// `totalRecords`, else the length of `records`, else the length of a bare
/// array, else zero.
pub(super) fn total_records(value: &Value) -> u64 {
    if let Some(total) = lenient::count(value.get("totalRecords")) {
        return total;
    }
    let len = value
        .get("records")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .map_or(0, Vec::len);
    u64::try_from(len).unwrap_or(u64::MAX)
}

fn records(value: &Value) -> &[Value] {
    value
        .get("records")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .map_or(&[], Vec::as_slice)
}

fn count_moved(history: &Value, cutoff: DateTime<Utc>) -> u64 {
    let moved = records(history)
        .iter()
        .filter(|r| {
            r.get("date")
                .and_then(Value::as_str)
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .is_some_and(|d| d >= cutoff)
        })
        .filter(|r| {
            let kind = r
                .get("eventType")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_ascii_lowercase();
            kind.contains("download") || kind.contains("import")
        })
        .count();
    u64::try_from(moved).unwrap_or(u64::MAX)
}
