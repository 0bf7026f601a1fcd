// ── HTTP surface ──
//
// Three routes: the event stream, a one-shot snapshot and a liveness probe.
// Each `/api/events` request owns one streaming session; the session lives
// exactly as long as the response body.

use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use plexstax_core::{Aggregator, Frame, SessionHandle, SessionOptions, StreamSession};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    options: SessionOptions,
    shutdown: CancellationToken,
}

impl AppState {
    /// `shutdown` ends every open stream and stops the server when fired.
    pub fn new(aggregator: Aggregator, options: SessionOptions, shutdown: CancellationToken) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            options,
            shutdown,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", get(events))
        .route("/api/cards", get(cards))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve until the state's shutdown token fires, then drain connections.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    let shutdown = state.shutdown.clone();
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

// ── Handlers ─────────────────────────────────────────────────────────

#[allow(clippy::unused_async)]
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let (handle, frames) = StreamSession::spawn_with_shutdown(
        Arc::clone(&state.aggregator),
        state.options.clone(),
        &state.shutdown,
    );
    debug!(session = %handle.id(), "event stream opened");

    let body = Body::from_stream(SessionBody {
        handle,
        frames: ReceiverStream::new(frames),
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        body,
    )
}

async fn cards(State(state): State<AppState>) -> Response {
    match state.aggregator.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => {
            warn!(error = %err, "snapshot failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": err.to_string() })),
            )
                .into_response()
        }
    }
}

// ── Response body ────────────────────────────────────────────────────

/// Event-stream body tied to its session: when hyper drops the body
/// (client gone, server shutting down) the handle drops and the session
/// closes.
struct SessionBody {
    handle: SessionHandle,
    frames: ReceiverStream<Frame>,
}

impl Stream for SessionBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames
            .poll_next_unpin(cx)
            .map(|frame| frame.map(|f| Ok(Bytes::from(f.to_wire()))))
    }
}

impl Drop for SessionBody {
    fn drop(&mut self) {
        debug!(session = %self.handle.id(), "event stream released");
    }
}
