use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clicktrail_common::IngestAck;
use clicktrail_store::EventLog;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::ingest;

#[derive(Clone)]
pub struct AppState {
    log: EventLog,
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(log: EventLog, trust_forwarded_for: bool) -> Self {
        Self {
            log,
            trust_forwarded_for,
        }
    }
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/api/events", post(record_event))
        .route("/api/eventLogs", get(event_logs))
        .route("/health", get(health))
        .with_state(Arc::new(state))
        .layer(cors)
        // Method and path only: request bodies carry user input.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Serve `app` with peer addresses available to handlers.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

// --- Handlers ---

async fn record_event(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let record = ingest::record_from_body(&body);
    let sender = ingest::sender_address(&headers, peer, state.trust_forwarded_for);
    info!(event_type = %record.event_type, data = %record.data, "Event received");

    match state.log.append(&record, &sender).await {
        Ok(_) => Json(IngestAck::recorded(&record.event_type)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to append event");
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to record event").into_response()
        }
    }
}

async fn event_logs(State(state): State<Arc<AppState>>) -> Response {
    match state.log.read_all().await {
        Ok(content) => content.into_response(),
        Err(e) => {
            error!(error = %e, "Error reading the log file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Unable to read logs").into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
