// ── Aggregator ──
//
// Fans one tick out to all six adapters, each on its own task, and joins
// the results into a single snapshot. Adapters are total, so the only
// failure left is a task that panicked.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use plexstax_api::HttpClient;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, warn};

use crate::adapter::{Adapter, ServiceAdapter};
use crate::adapters::{
    NzbgetAdapter, OverseerrAdapter, RadarrAdapter, SabnzbdAdapter, SonarrAdapter, TautulliAdapter,
};
use crate::card::{AggregateSnapshot, CardResult};
use crate::config::StackConfig;
use crate::error::CoreError;
use crate::ribbon::RibbonEvent;
use crate::service::Service;

#[derive(Debug)]
struct Adapters {
    sonarr: Adapter<SonarrAdapter>,
    radarr: Adapter<RadarrAdapter>,
    sabnzbd: Adapter<SabnzbdAdapter>,
    nzbget: Adapter<NzbgetAdapter>,
    overseerr: Adapter<OverseerrAdapter>,
    tautulli: Adapter<TautulliAdapter>,
}

/// Cheaply cloneable handle producing snapshots of the whole stack.
#[derive(Debug, Clone)]
pub struct Aggregator {
    adapters: Arc<Adapters>,
}

impl Aggregator {
    /// Build every adapter against a shared client.
    pub fn new(config: &StackConfig, client: &HttpClient) -> Self {
        Self {
            adapters: Arc::new(Adapters {
                sonarr: Adapter::from_config(config, client),
                radarr: Adapter::from_config(config, client),
                sabnzbd: Adapter::from_config(config, client),
                nzbget: Adapter::from_config(config, client),
                overseerr: Adapter::from_config(config, client),
                tautulli: Adapter::from_config(config, client),
            }),
        }
    }

    /// Build the shared client from `config` and every adapter on top of it.
    /// Cancelling `shutdown` aborts all in-flight remote calls.
    pub fn from_config(config: &StackConfig, shutdown: CancellationToken) -> Result<Self, CoreError> {
        let client = config.transport().build_client(shutdown)?;
        Ok(Self::new(config, &client))
    }

    /// Services whose credentials are present.
    pub fn configured(&self) -> Vec<Service> {
        let a = &self.adapters;
        [
            (Service::Sonarr, a.sonarr.is_configured()),
            (Service::Radarr, a.radarr.is_configured()),
            (Service::Sabnzbd, a.sabnzbd.is_configured()),
            (Service::Nzbget, a.nzbget.is_configured()),
            (Service::Overseerr, a.overseerr.is_configured()),
            (Service::Tautulli, a.tautulli.is_configured()),
        ]
        .into_iter()
        .filter_map(|(service, on)| on.then_some(service))
        .collect()
    }

    /// Run all adapters concurrently and wait for every one of them.
    pub async fn snapshot(&self) -> Result<AggregateSnapshot, CoreError> {
        let started = Instant::now();
        let (sonarr, radarr, sab, nzbget, overseerr, tautulli) = tokio::join!(
            self.spawn_card(|a| &a.sonarr),
            self.spawn_card(|a| &a.radarr),
            self.spawn_card(|a| &a.sabnzbd),
            self.spawn_card(|a| &a.nzbget),
            self.spawn_card(|a| &a.overseerr),
            self.spawn_card(|a| &a.tautulli),
        );
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(elapsed_ms, "snapshot complete");

        Ok(AggregateSnapshot {
            sonarr: sonarr?,
            radarr: radarr?,
            sab: sab?,
            nzbget: nzbget?,
            overseerr: overseerr?,
            tautulli: tautulli?,
        })
    }

    /// Ribbon events from both queue managers, Sonarr first. A queue
    /// manager that is unconfigured or failing contributes nothing.
    pub async fn ribbons(&self) -> Vec<RibbonEvent> {
        let a = &self.adapters;
        let (sonarr, radarr) = tokio::join!(
            async {
                match a.sonarr.get() {
                    Some(s) => s.ribbons().await,
                    None => Ok(Vec::new()),
                }
            },
            async {
                match a.radarr.get() {
                    Some(r) => r.ribbons().await,
                    None => Ok(Vec::new()),
                }
            },
        );

        let mut events = Vec::new();
        for (service, result) in [(Service::Sonarr, sonarr), (Service::Radarr, radarr)] {
            match result {
                Ok(batch) => events.extend(batch),
                Err(err) => warn!(service = service.key(), error = %err, "queue ribbons failed"),
            }
        }
        events
    }

    /// Run one adapter on its own task. Dropping the returned future aborts
    /// the task.
    fn spawn_card<A: ServiceAdapter>(
        &self,
        pick: fn(&Adapters) -> &Adapter<A>,
    ) -> impl Future<Output = Result<CardResult<A::Data>, CoreError>> + use<A> {
        let adapters = Arc::clone(&self.adapters);
        let task = AbortOnDropHandle::new(tokio::spawn(async move { pick(&adapters).card().await }));
        async move {
            task.await.map_err(|err| CoreError::AdapterJoin {
                service: A::SERVICE,
                message: err.to_string(),
            })
        }
    }
}
