// plexstax: HTTP surface over the aggregation engine.

pub mod cli;
pub mod error;
pub mod logging;
pub mod server;

pub use error::ServerError;
pub use server::AppState;
