// plexstax-core: Service adapters, fan-out aggregation and streaming sessions.

pub mod adapter;
pub mod adapters;
pub mod aggregator;
pub mod card;
pub mod config;
pub mod error;
pub mod lenient;
pub mod ribbon;
pub mod service;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{Adapter, ServiceAdapter};
pub use aggregator::Aggregator;
pub use card::{AggregateSnapshot, CardResult};
pub use config::{ServiceCredentials, StackConfig};
pub use error::CoreError;
pub use ribbon::{RibbonEvent, RibbonStage};
pub use service::Service;
pub use session::{
    Frame, SessionHandle, SessionOptions, SessionState, SnapshotSource, StreamMessage,
    StreamSession,
};
