// JSON-RPC over HTTP POST
//
// NZBGet exposes its API as `POST /jsonrpc` with `{method, params, id}`
// bodies and `{result}` / `{error}` replies. The envelope is stripped here so
// callers only ever see `result`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::transport::{CallRequest, HttpClient};

/// Path suffix of the JSON-RPC endpoint.
pub const JSONRPC_PATH: &str = "/jsonrpc";

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl HttpClient {
    /// Invoke `method` with no parameters against the endpoint described by
    /// `endpoint` (URL, auth and bound). The body is replaced.
    pub async fn json_rpc<T: DeserializeOwned>(
        &self,
        endpoint: CallRequest,
        method: &str,
    ) -> Result<T, Error> {
        debug!(method, "json-rpc call");
        let request = endpoint.json(json!({ "method": method, "params": [], "id": 1 }));
        let envelope: RpcEnvelope<T> = self.call(request).await?;

        if let Some(err) = envelope.error.filter(|e| !e.is_null()) {
            return Err(Error::Rpc {
                message: rpc_error_message(&err),
            });
        }

        envelope.result.ok_or_else(|| Error::Rpc {
            message: format!("{method}: response carried no result"),
        })
    }
}

fn rpc_error_message(err: &serde_json::Value) -> String {
    err.get("message")
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| err.to_string(), str::to_owned)
}
