// Sonarr: TV queue manager

use std::future::Future;

use plexstax_api::{Error, HttpClient};
use serde::Serialize;

use super::arr::ArrApi;
use crate::adapter::ServiceAdapter;
use crate::config::StackConfig;
use crate::ribbon::RibbonEvent;
use crate::service::Service;

const QUEUE_COUNT: &str = "/api/v3/queue?page=1&pageSize=1";
const WANTED_COUNT: &str = "/api/v3/wanted/missing?page=1&pageSize=1";
const SERIES_COUNT: &str = "/api/v3/series?page=1&pageSize=1&includeStatistics=false";
const RIBBON_QUEUE: &str = "/api/v3/queue?page=1&pageSize=100&includeUnknownSeriesItems=true";

/// Trailing window for the `moved` figure.
const MOVED_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrCard {
    pub queued: u64,
    pub wanted: u64,
    pub total_items: u64,
    /// Queue items finished downloading and waiting to be imported.
    pub to_move: u64,
    /// Downloads and imports in the last hour.
    pub moved: u64,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct SonarrAdapter {
    api: ArrApi,
}

impl SonarrAdapter {
    /// Current queue as ribbon events.
    pub async fn ribbons(&self) -> Result<Vec<RibbonEvent>, Error> {
        self.api
            .queue_ribbons(RIBBON_QUEUE, &["title", "series.title"], "Sonarr Item")
            .await
    }
}

impl ServiceAdapter for SonarrAdapter {
    const SERVICE: Service = Service::Sonarr;
    type Data = SonarrCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        ArrApi::new(Self::SERVICE, &config.sonarr, client, config.probe_timeout)
            .map(|api| Self { api })
    }

    fn fetch(&self) -> impl Future<Output = Result<SonarrCard, Error>> + Send {
        async move {
            self.api.probe().await?;

            let (queued, wanted, total_items, to_move, moved) = tokio::try_join!(
                self.api.count(QUEUE_COUNT),
                self.api.count(WANTED_COUNT),
                self.api.count(SERIES_COUNT),
                async { Ok::<_, Error>(self.api.awaiting_import(RIBBON_QUEUE).await) },
                async {
                    Ok::<_, Error>(self
                        .api
                        .moved_within(chrono::Duration::minutes(MOVED_WINDOW_MINUTES))
                        .await)
                },
            )?;

            Ok(SonarrCard {
                queued,
                wanted,
                total_items,
                to_move,
                moved,
                link: self.api.link().to_owned(),
            })
        }
    }
}
