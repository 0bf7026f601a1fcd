// ── Adapter contract ──
//
// Every service is a struct implementing `ServiceAdapter::fetch`. The
// surrounding `Adapter` wrapper owns the credential check and the failure
// boundary, so no adapter can raise past its own card.

use std::future::Future;
use std::time::Instant;

use plexstax_api::HttpClient;
use serde::Serialize;
use tracing::{debug, warn};

use crate::card::CardResult;
use crate::config::StackConfig;
use crate::service::Service;

/// One remote service reduced to a card payload.
pub trait ServiceAdapter: Send + Sync + Sized + 'static {
    const SERVICE: Service;

    /// Card payload on success.
    type Data: Serialize + Send + 'static;

    /// Build the adapter if its required credentials are present.
    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self>;

    /// Perform the service's remote calls and reduce them to a payload.
    fn fetch(&self) -> impl Future<Output = Result<Self::Data, plexstax_api::Error>> + Send;

    /// `fetch` behind the failure boundary: any error becomes an `Error` card.
    fn card(&self) -> impl Future<Output = CardResult<Self::Data>> + Send {
        async move {
            let started = Instant::now();
            let result = self.fetch().await;
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            match result {
                Ok(data) => {
                    debug!(service = Self::SERVICE.key(), elapsed_ms, "card refreshed");
                    CardResult::Ok { data }
                }
                Err(err) => {
                    warn!(service = Self::SERVICE.key(), error = %err, elapsed_ms, "card failed");
                    CardResult::from_error(&err)
                }
            }
        }
    }
}

/// An adapter slot that may be unconfigured.
#[derive(Debug)]
pub struct Adapter<A>(Option<A>);

impl<A: ServiceAdapter> Adapter<A> {
    pub fn from_config(config: &StackConfig, client: &HttpClient) -> Self {
        let inner = A::from_config(config, client);
        if inner.is_none() {
            debug!(service = A::SERVICE.key(), "not configured");
        }
        Self(inner)
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&A> {
        self.0.as_ref()
    }

    /// The card for this tick. Unconfigured slots answer without any I/O.
    pub async fn card(&self) -> CardResult<A::Data> {
        match &self.0 {
            Some(adapter) => adapter.card().await,
            None => CardResult::not_configured(A::SERVICE),
        }
    }
}
