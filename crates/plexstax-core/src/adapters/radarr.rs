// Radarr: movie queue manager

use std::future::Future;

use plexstax_api::{Error, HttpClient};
use serde::Serialize;
use tracing::debug;

use super::arr::ArrApi;
use crate::adapter::ServiceAdapter;
use crate::config::StackConfig;
use crate::lenient;
use crate::ribbon::RibbonEvent;
use crate::service::Service;

const QUEUE_COUNT: &str = "/api/v3/queue?page=1&pageSize=1";
const MOVIE_PAGE: &str = "/api/v3/movie?page=1&pageSize=1";
const MOVIE_LIST: &str = "/api/v3/movie";
const RIBBON_QUEUE: &str = "/api/v3/queue?page=1&pageSize=100&includeUnknownMovieItems=true";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrCard {
    pub queued: u64,
    pub total_items: u64,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct RadarrAdapter {
    api: ArrApi,
}

impl RadarrAdapter {
    pub async fn ribbons(&self) -> Result<Vec<RibbonEvent>, Error> {
        self.api
            .queue_ribbons(RIBBON_QUEUE, &["title", "movie.title"], "Radarr Item")
            .await
    }

    /// Library size. Not every Radarr release reports `totalRecords` on the
    /// movie endpoint, so a zero from the paged call falls back to counting
    /// the full list; only that second call may fail the card.
    async fn movie_total(&self) -> Result<u64, Error> {
        let paged = match self.api.get(MOVIE_PAGE).await {
            Ok(page) => lenient::count(page.get("totalRecords")).unwrap_or(0),
            Err(err) => {
                debug!(error = %err, "paged movie count unavailable");
                0
            }
        };
        if paged > 0 {
            return Ok(paged);
        }
        self.api.count(MOVIE_LIST).await
    }
}

impl ServiceAdapter for RadarrAdapter {
    const SERVICE: Service = Service::Radarr;
    type Data = RadarrCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        ArrApi::new(Self::SERVICE, &config.radarr, client, config.probe_timeout)
            .map(|api| Self { api })
    }

    fn fetch(&self) -> impl Future<Output = Result<RadarrCard, Error>> + Send {
        async move {
            self.api.probe().await?;
            let (queued, total_items) =
                tokio::try_join!(self.api.count(QUEUE_COUNT), self.movie_total())?;

            Ok(RadarrCard {
                queued,
                total_items,
                link: self.api.link().to_owned(),
            })
        }
    }
}
