// NZBGet: usenet downloader spoken to over JSON-RPC

use std::future::Future;

use plexstax_api::rpc::JSONRPC_PATH;
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
pub struct NzbgetCard {
    pub queue: u64,
    pub rate_down_bps: u64,
    /// Web UI address, without the RPC suffix.
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct NzbgetAdapter {
    client: HttpClient,
    rpc_url: String,
    link: String,
    auth: Option<(String, Option<String>)>,
}

impl NzbgetAdapter {
    fn endpoint(&self) -> Result<CallRequest, Error> {
        let request = CallRequest::post(endpoint(&self.rpc_url, "")?);
        Ok(match &self.auth {
            Some((user, pass)) => request.basic_auth(user.clone(), pass.clone()),
            None => request,
        })
    }
}

impl ServiceAdapter for NzbgetAdapter {
    const SERVICE: Service = Service::Nzbget;
    type Data = NzbgetCard;

    fn from_config(config: &StackConfig, client: &HttpClient) -> Option<Self> {
        let creds = &config.nzbget;
        let base = creds.base_url()?;
        let link = base.strip_suffix(JSONRPC_PATH).unwrap_or(base).to_owned();

        let auth = (creds.username().is_some() || creds.password().is_some()).then(|| {
            (
                creds.username().unwrap_or_default().to_owned(),
                creds.password().map(str::to_owned),
            )
        });

        Some(Self {
            client: client.clone(),
            rpc_url: format!("{link}{JSONRPC_PATH}"),
            link,
            auth,
        })
    }

    fn fetch(&self) -> impl Future<Output = Result<NzbgetCard, Error>> + Send {
        async move {
            let status: Value = self.client.json_rpc(self.endpoint()?, "status").await?;
            let groups: Vec<Value> = self.client.json_rpc(self.endpoint()?, "listgroups").await?;

            Ok(NzbgetCard {
                queue: u64::try_from(groups.len()).unwrap_or(u64::MAX),
                rate_down_bps: lenient::count(status.get("DownloadRate")).unwrap_or(0),
                link: self.link.clone(),
            })
        }
    }
}
