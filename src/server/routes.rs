//! Route handlers for the session node admin API.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::broadcast::BroadcastResult;
use crate::clock::VersionId;
use crate::error::ClientManagerError;
use crate::zone::{ClientManager, ConnectionRecord};

/// Shared application state
pub type AppState = Arc<ClientManager>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Body returned by every command endpoint, local or zone-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl CommonResponse {
    pub fn success() -> Self {
        CommonResponse {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CommonResponse {
            success: false,
            message: message.into(),
        }
    }
}

impl From<BroadcastResult> for CommonResponse {
    fn from(result: BroadcastResult) -> Self {
        match result {
            BroadcastResult::Success => CommonResponse::success(),
            BroadcastResult::Failure(message) => CommonResponse::failed(message),
            BroadcastResult::TimedOut => CommonResponse::failed("execute timeout"),
        }
    }
}

impl From<ClientManagerError> for CommonResponse {
    fn from(err: ClientManagerError) -> Self {
        CommonResponse::failed(err.to_string())
    }
}

#[derive(Deserialize, Debug)]
pub struct IpsForm {
    #[serde(default)]
    pub ips: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NextVersionResponse {
    pub id: VersionId,
    pub timestamp: u64,
    pub time: Option<String>,
}

/// Basic health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
    })
}

/// Issues a version id and decodes it, for diagnostics
pub async fn next_version(
    State(state): State<AppState>,
) -> Result<Json<NextVersionResponse>, (StatusCode, Json<CommonResponse>)> {
    let clock = state.clock();
    match clock.next_id() {
        Ok(id) => Ok(Json(NextVersionResponse {
            id,
            timestamp: clock.real_timestamp(id),
            time: id.real_time(&clock.layout()).map(|t| t.to_rfc3339()),
        })),
        Err(err) => {
            error!("failed to issue version id: {}", err);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(CommonResponse::failed(err.to_string())),
            ))
        }
    }
}

pub async fn client_off(
    State(state): State<AppState>,
    Form(form): Form<IpsForm>,
) -> Json<CommonResponse> {
    Json(match state.client_off(&form.ips) {
        Ok(_) => CommonResponse::success(),
        Err(err) => err.into(),
    })
}

pub async fn client_open(
    State(state): State<AppState>,
    Form(form): Form<IpsForm>,
) -> Json<CommonResponse> {
    Json(match state.client_open(&form.ips) {
        Ok(_) => CommonResponse::success(),
        Err(err) => err.into(),
    })
}

pub async fn zone_client_off(
    State(state): State<AppState>,
    Form(form): Form<IpsForm>,
) -> Json<CommonResponse> {
    let response: CommonResponse = match state.client_off_in_zone(&form.ips).await {
        Ok(result) => result.into(),
        Err(err) => err.into(),
    };
    info!(ips = %form.ips, success = response.success, "zone clientOff finished");
    Json(response)
}

pub async fn zone_client_open(
    State(state): State<AppState>,
    Form(form): Form<IpsForm>,
) -> Json<CommonResponse> {
    let response: CommonResponse = match state.client_open_in_zone(&form.ips).await {
        Ok(result) => result.into(),
        Err(err) => err.into(),
    };
    info!(ips = %form.ips, success = response.success, "zone clientOpen finished");
    Json(response)
}

pub async fn connections(State(state): State<AppState>) -> Json<Vec<ConnectionRecord>> {
    Json(state.connections().snapshot())
}

/// Creates and configures the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version/next", get(next_version))
        .route("/api/clientManager/clientOff", post(client_off))
        .route("/api/clientManager/clientOpen", post(client_open))
        .route("/api/clientManager/zone/clientOff", post(zone_client_off))
        .route("/api/clientManager/zone/clientOpen", post(zone_client_open))
        .route("/api/clientManager/connections.json", get(connections))
        .with_state(state)
}
