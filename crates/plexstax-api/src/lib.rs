// plexstax-api: bounded HTTP / JSON-RPC transport for media-automation services

pub mod error;
pub mod normalize;
pub mod rpc;
pub mod transport;

pub use error::Error;
pub use normalize::normalize_base_url;
pub use transport::{CallRequest, HttpClient, TlsMode, TransportConfig};
