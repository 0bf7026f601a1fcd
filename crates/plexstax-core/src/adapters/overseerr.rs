// Overseerr: media request broker

use std::future::Future;

use plexstax_api::{CallRequest, Error, HttpClient};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::endpoint;
use crate::adapter::ServiceAdapter;
use crate::config::StackConfig;
use crate::lenient;
use crate::service::Service;

const COUNT_PATH: &str = "/api/v1/request/count";
const PENDING_PAGE: &str = "/api/v1/request?take=1&skip=0&filter=pending";
const AVAILABLE_PAGE: &str = "/api/v1/request?take=1&skip=0&filter=available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverseerrCard {
    pub pending: u64,
    pub available: u64,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct OverseerrAdapter {
    client: HttpClient,
    base: String,
    api_key: String,
}

impl OverseerrAdapter {
    async fn get(&self, path: &str) -> Result<Value, Error> {
        let request = CallRequest::get(endpoint(&self.base, path)?).api_key(&self.api_key)?;
        self.client.call(request).await
    }

    /// Total of one filtered request listing; failures count as zero.
    async fn filtered_total(&self, path: &str) -> u64 {
        match self.get(path).await {
            Ok(page) => lenient::count(lenient::path(&page, "pageInfo.results"))
                .or_else(|| lenient::count(page.get("total")))
                .unwrap_or(0),
            Err(err) => {
                debug!(path, error = %err, "filtered request count unavailable");
                0
            }
        }
    }
}

impl ServiceAdapter for OverseerrAdapter {
    const SERVICE: Service = Service::Overseerr;
    type Data = OverseerrCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        let (base, api_key) = config.overseerr.keyed()?;
        Some(Self {
            client: client.clone(),
            base: base.to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    fn fetch(&self) -> impl Future<Output = Result<OverseerrCard, Error>> + Send {
        async move {
            let (pending, available) = match self.get(COUNT_PATH).await {
                Ok(counts) => (stat(&counts, "pending"), stat(&counts, "available")),
                Err(err) => {
                    debug!(error = %err, "request count endpoint failed, using filtered listings");
                    tokio::join!(
                        self.filtered_total(PENDING_PAGE),
                        self.filtered_total(AVAILABLE_PAGE)
                    )
                }
            };

            Ok(OverseerrCard {
                pending,
                available,
                link: self.base.clone(),
            })
        }
    }
}

/// A figure from the count payload, top-level or nested under `requests`.
fn stat(counts: &Value, key: &str) -> u64 {
    lenient::count(counts.get(key))
        .or_else(|| lenient::count(counts.get("requests").and_then(|r| r.get(key))))
        .unwrap_or(0)
}
