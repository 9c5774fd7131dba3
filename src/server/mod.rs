//! HTTP surface: health check, blocking menu endpoint and the event stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::app::MenuError;
use crate::delivery::{MenuResponse, MenuService, StreamEvent, StreamRequest};
use crate::domain::PlaceRef;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MenuService>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl From<MenuError> for ApiError {
    fn from(e: MenuError) -> Self {
        let status = if e.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %e, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            error: e.to_string(),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/menu", post(menu))
        .route("/api/menu/stream", post(menu_stream))
        .layer(build_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(state: AppState, address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address, "Listening");
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn menu(
    State(state): State<AppState>,
    Json(place): Json<PlaceRef>,
) -> Result<Json<MenuResponse>, ApiError> {
    let response = state.service.menu(&place).await?;
    Ok(Json(response))
}

async fn menu_stream(
    State(state): State<AppState>,
    Json(request): Json<StreamRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.service.spawn_stream(request);

    let events = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(to_sse(&event)), rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_sse(event: &StreamEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().data(json),
        Err(e) => Event::default().data(format!(
            r#"{{"type":"error","message":"event encoding failed: {}"}}"#,
            e
        )),
    }
}
