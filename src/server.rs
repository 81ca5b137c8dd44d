use crate::config::Config;
use crate::error::ConvertError;
use crate::job::{ConvertRequest, ConvertResponse, Converter};
use crate::storage::RemoteStorage;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub config: Arc<Config>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub version: String,
    pub storage_backend: String,
    pub page_concurrency: usize,
    pub download_attempts: u32,
    pub jpeg_quality: u8,
    pub max_request_size_bytes: usize,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn RemoteStorage>) -> Self {
        let converter = Converter::new(storage, config.job_settings());
        Self {
            converter: Arc::new(converter),
            config: Arc::new(config),
        }
    }
}

/// Build the router with its middleware
pub fn app(state: AppState) -> Router {
    let max_request_size = state.config.max_request_size;

    Router::new()
        .route("/convert", post(handle_convert))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config, storage: Arc<dyn RemoteStorage>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = app(AppState::new(config, storage));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle conversion requests
async fn handle_convert(
    State(state): State<AppState>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ConvertError> {
    let Json(request) = payload.map_err(|e| ConvertError::InvalidRequest(e.body_text()))?;

    match state.converter.convert(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Conversion failed: {}", e);
            Err(e)
        }
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage_backend: state.converter.storage().name().to_string(),
        page_concurrency: state.converter.settings().page_concurrency,
        download_attempts: state.config.retry.attempts,
        jpeg_quality: state.converter.settings().jpeg_quality,
        max_request_size_bytes: state.config.max_request_size,
    })
}
