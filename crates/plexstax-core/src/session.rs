// ── Streaming sessions ──
//
// One session per connected dashboard. The session task greets the client,
// re-aggregates on a fixed period and pushes each snapshot followed by a
// heartbeat into a bounded sink. It ends when the client goes away, when
// the handle is closed or dropped, or when the process shuts down, and it
// reaches `Closed` exactly once whichever of those happens first.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::card::AggregateSnapshot;
use crate::config::StackConfig;
use crate::error::CoreError;
use crate::ribbon::RibbonEvent;

/// Frames buffered per session before the tick loop waits on the client.
const DEFAULT_SINK_CAPACITY: usize = 32;

/// Shortest tick period a session will run at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ── Source ───────────────────────────────────────────────────────────

/// Whatever a session polls on each tick.
pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshot(&self) -> impl Future<Output = Result<AggregateSnapshot, CoreError>> + Send;

    fn ribbons(&self) -> impl Future<Output = Vec<RibbonEvent>> + Send;
}

impl SnapshotSource for Aggregator {
    fn snapshot(&self) -> impl Future<Output = Result<AggregateSnapshot, CoreError>> + Send {
        Aggregator::snapshot(self)
    }

    fn ribbons(&self) -> impl Future<Output = Vec<RibbonEvent>> + Send {
        Aggregator::ribbons(self)
    }
}

// ── Options ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Period between ticks. Raised to [`MIN_INTERVAL`] if shorter.
    pub interval: Duration,
    /// Run one tick right after the greeting.
    pub immediate_push: bool,
    /// Push ribbon events after each snapshot.
    pub ribbons: bool,
    pub sink_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            immediate_push: true,
            ribbons: false,
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            interval: config.tick_interval,
            immediate_push: config.immediate_push,
            ribbons: config.ribbons,
            ..Self::default()
        }
    }
}

// ── Wire messages ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Streaming,
    Closed,
}

/// Payload of one `data:` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StreamMessage {
    Hello,
    Cards { data: AggregateSnapshot },
    Ribbon { data: RibbonEvent },
    Error { message: String },
}

/// One unit written to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(StreamMessage),
    /// Keep-alive comment carrying the send time in Unix milliseconds.
    Heartbeat(i64),
}

impl Frame {
    /// Event-stream encoding: `data: <json>\n\n` or `:hb <ms>\n\n`.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Message(msg) => match serde_json::to_string(msg) {
                Ok(json) => format!("data: {json}\n\n"),
                Err(err) => {
                    warn!(error = %err, "dropping unserializable stream message");
                    "data: {\"kind\":\"error\",\"message\":\"encoding failed\"}\n\n".to_owned()
                }
            },
            Self::Heartbeat(ms) => format!(":hb {ms}\n\n"),
        }
    }

    pub fn message(&self) -> Option<&StreamMessage> {
        match self {
            Self::Message(msg) => Some(msg),
            Self::Heartbeat(_) => None,
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────

struct Shared {
    id: Uuid,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    ticks: AtomicU64,
}

impl Shared {
    fn enter_streaming(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == SessionState::Starting {
                *state = SessionState::Streaming;
                true
            } else {
                false
            }
        })
    }

    /// The single transition into `Closed`. Only the first caller wins.
    fn close(&self) -> bool {
        let closed = self.state.send_if_modified(|state| {
            if *state == SessionState::Closed {
                false
            } else {
                *state = SessionState::Closed;
                true
            }
        });
        self.cancel.cancel();
        if closed {
            info!(session = %self.id, ticks = self.ticks.load(Ordering::Relaxed), "stream closed");
        }
        closed
    }

    fn is_closed(&self) -> bool {
        *self.state.borrow() == SessionState::Closed
    }
}

/// Entry point for starting sessions.
pub struct StreamSession;

impl StreamSession {
    /// Start a session polling `source`. Frames arrive on the returned
    /// receiver; dropping it ends the session.
    pub fn spawn<S: SnapshotSource>(
        source: Arc<S>,
        options: SessionOptions,
    ) -> (SessionHandle, mpsc::Receiver<Frame>) {
        Self::spawn_with_shutdown(source, options, &CancellationToken::new())
    }

    /// As [`spawn`](Self::spawn), ending the session when `shutdown` fires.
    pub fn spawn_with_shutdown<S: SnapshotSource>(
        source: Arc<S>,
        options: SessionOptions,
        shutdown: &CancellationToken,
    ) -> (SessionHandle, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(options.sink_capacity.max(1));
        let (state, _) = watch::channel(SessionState::Starting);
        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            state,
            cancel: shutdown.child_token(),
            ticks: AtomicU64::new(0),
        });

        let task = tokio::spawn(run(Arc::clone(&shared), source, options, tx));
        (
            SessionHandle {
                shared,
                task: Some(task),
            },
            rx,
        )
    }
}

/// Owner's view of a running session. Dropping it closes the session.
pub struct SessionHandle {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Ticks started so far, including the immediate one.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Close the session. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    /// Wait for the session task to finish.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(session = %self.shared.id, error = %err, "session task failed");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shared.close();
    }
}

async fn run<S: SnapshotSource>(
    shared: Arc<Shared>,
    source: Arc<S>,
    options: SessionOptions,
    sink: mpsc::Sender<Frame>,
) {
    let cancel = shared.cancel.clone();
    tokio::select! {
        biased;
        () = cancel.cancelled() => debug!(session = %shared.id, "session cancelled"),
        () = sink.closed() => debug!(session = %shared.id, "client disconnected"),
        () = stream(&shared, source.as_ref(), &options, &sink) => {}
    }
    shared.close();
}

async fn stream<S: SnapshotSource>(
    shared: &Shared,
    source: &S,
    options: &SessionOptions,
    sink: &mpsc::Sender<Frame>,
) {
    if !shared.enter_streaming() {
        return;
    }
    let period = options.interval.max(MIN_INTERVAL);
    let interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
    info!(session = %shared.id, interval_ms, "stream open");

    if !push(shared, sink, Frame::Message(StreamMessage::Hello)).await {
        return;
    }
    if options.immediate_push && !tick(shared, source, options, sink).await {
        return;
    }

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if !tick(shared, source, options, sink).await {
            return;
        }
    }
}

/// One aggregation-and-push cycle. Returns `false` once the sink is gone.
async fn tick<S: SnapshotSource>(
    shared: &Shared,
    source: &S,
    options: &SessionOptions,
    sink: &mpsc::Sender<Frame>,
) -> bool {
    let n = shared.ticks.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(session = %shared.id, tick = n, "tick");

    let message = match source.snapshot().await {
        Ok(data) => StreamMessage::Cards { data },
        Err(err) => {
            warn!(session = %shared.id, error = %err, "aggregation failed, skipping tick");
            StreamMessage::Error {
                message: err.to_string(),
            }
        }
    };
    if !push(shared, sink, Frame::Message(message)).await {
        return false;
    }

    if options.ribbons {
        for event in source.ribbons().await {
            if !push(shared, sink, Frame::Message(StreamMessage::Ribbon { data: event })).await {
                return false;
            }
        }
    }

    push(shared, sink, Frame::Heartbeat(Utc::now().timestamp_millis())).await
}

async fn push(shared: &Shared, sink: &mpsc::Sender<Frame>, frame: Frame) -> bool {
    if shared.is_closed() {
        return false;
    }
    sink.send(frame).await.is_ok()
}
