//! HTTP API for the projects service.

mod config;
mod error;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use projects_geo::GeoLookup;
use projects_store::{CachedStore, RecordMap, WriteOutcome};
use projects_types::{resolve_visibility, ProjectRecord};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

/// Header carrying the original client address when behind a proxy.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Shared handler state, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CachedStore>,
    pub geo: Arc<dyn GeoLookup>,
    /// Where `/` redirects to. Without one `/` answers with a status document.
    pub welcome_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub backend: String,
    pub projects: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// The client address: first entry of `x-forwarded-for`, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

async fn root_handler(State(state): State<AppState>) -> Response {
    match &state.welcome_url {
        Some(url) => Redirect::temporary(url).into_response(),
        None => Json(StatusResponse {
            status: "running".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .into_response(),
    }
}

async fn list_handler(State(state): State<AppState>) -> Json<RecordMap> {
    Json(state.store.get_all().await)
}

async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ProjectRecord>, ApiError> {
    state
        .store
        .get(&key)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// Never 404s: a missing record and a hidden one both answer `{}`.
async fn region_gated_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    let Some(record) = state.store.get(&key).await else {
        return Json(json!({}));
    };

    let ip = client_ip(&headers);
    let country = state.geo.resolve_country(ip.as_deref()).await;
    let decision = resolve_visibility(&record, &country);
    debug!("Region check for {key:?} from {country}: {decision:?}");

    if decision.is_exposed() {
        Json(record.into_value())
    } else {
        Json(json!({}))
    }
}

async fn update_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let record = parse_record(&body)?;

    match state.store.put(&key, record).await {
        WriteOutcome::Committed => debug!("Project {key:?} updated"),
        WriteOutcome::CacheOnly(reason) => {
            warn!("Project {key:?} updated in cache only: {reason}");
        }
        WriteOutcome::Failed(reason) => error!("Project {key:?} was not stored: {reason}"),
    }
    Ok(Json(json!({})))
}

/// Any content type is accepted. An empty body is an empty record.
fn parse_record(body: &[u8]) -> Result<ProjectRecord, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProjectRecord::default());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
    ProjectRecord::from_value(value).map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.store.health().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        database: if health.connected {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
        backend: health.backend.to_string(),
        projects: health.records,
    })
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/p/all", get(list_handler))
        .route("/pp/{key}", get(get_handler))
        .route("/br/{key}", get(region_gated_handler))
        .route("/p/update/{key}", post(update_handler))
        .with_state(state)
}
