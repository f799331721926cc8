//! WebSocket + HTTP gateway (Axum).
//!
//! - `GET /` and `GET /ws` upgrade to the query protocol.
//! - `GET /healthz` is a liveness probe.
//! - `GET /ready` reports corpus size, cache connectivity and embedding service state.

pub mod connection;
pub mod protocol;
pub mod state;


use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;

pub use connection::{ConnectionHandler, Inbound};
pub use protocol::ServerMessage;
pub use state::AppState;

use crate::cache::CacheBackend;
use crate::embedding::EmbeddingClient;

/// Response header carrying the probe outcome.
pub const PHRASAL_STATUS_HEADER: &str = "x-phrasal-status";

pub fn create_router_with_state<E, C>(state: AppState<E, C>) -> Router
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    Router::new()
        .route("/", get(ws_handler::<E, C>))
        .route("/ws", get(ws_handler::<E, C>))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<E, C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub vectors: usize,
    pub dimension: usize,
    pub cache: String,
    pub embedding: String,
    pub embedding_service: String,
}

pub async fn ws_handler<E, C>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<E, C>>,
) -> Response
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    let handler = state.connection_handler();
    ws.on_upgrade(move |socket| handler.serve_socket(socket))
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(PHRASAL_STATUS_HEADER, HeaderValue::from_static("ok"));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<E, C>(State(state): State<AppState<E, C>>) -> Response
where
    E: EmbeddingClient + 'static,
    C: CacheBackend + 'static,
{
    let processor = &state.processor;
    let (cache_ok, embedding) = tokio::join!(
        processor.cache().is_available(),
        processor.embedder().readiness()
    );

    let (status_code, status) = if cache_ok && embedding.is_available() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let mut headers = HeaderMap::new();
    headers.insert(PHRASAL_STATUS_HEADER, HeaderValue::from_static(status));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status.to_string(),
            vectors: processor.store().len(),
            dimension: processor.store().dimension(),
            cache: if cache_ok { "connected" } else { "disconnected" }.to_string(),
            embedding: processor.embedder().backend_name().to_string(),
            embedding_service: embedding.as_str().to_string(),
        }),
    )
        .into_response()
}
