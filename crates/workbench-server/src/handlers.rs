//! Endpoint handlers and their wire types.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use workbench_core::env_store;
use workbench_core::files::{self, WriteError};
use workbench_core::simulate;

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub timestamp: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        environment: state.config.mode.as_str().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize, ToSchema)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub enabled: bool,
}

/// Static service metadata plus the endpoints enabled in the current mode.
#[utoipa::path(
    get,
    path = "/api/info",
    responses((status = 200, description = "Service metadata", body = InfoResponse))
)]
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let endpoint = |method: &str, path: &str, enabled: bool| EndpointInfo {
        method: method.to_string(),
        path: path.to_string(),
        enabled,
    };
    Json(InfoResponse {
        name: "cre-workbench".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.mode.as_str().to_string(),
        endpoints: vec![
            endpoint("GET", "/health", true),
            endpoint("GET", "/api/info", true),
            endpoint("GET", "/api/openapi.json", true),
            endpoint("POST", "/api/write-file", state.config.allow_file_writes),
            endpoint("POST", "/api/simulate", true),
            endpoint("GET", "/api/get-env-config", true),
            endpoint("POST", "/api/set-env-config", true),
        ],
    })
}

#[derive(Deserialize, ToSchema)]
pub struct WriteFileRequest {
    pub path: Option<String>,
    pub content: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct WriteFileResponse {
    pub success: bool,
    pub path: String,
}

/// Write a generated workflow source file under the orchestrator root.
///
/// The target path is always interpreted relative to the configured root;
/// absolute paths and `..` segments are rejected.
#[utoipa::path(
    post,
    path = "/api/write-file",
    request_body = WriteFileRequest,
    responses(
        (status = 200, description = "File written", body = WriteFileResponse),
        (status = 400, description = "Missing field or invalid path"),
        (status = 501, description = "File writes disabled in this mode"),
        (status = 500, description = "Filesystem failure"),
    )
)]
pub async fn write_file(
    State(state): State<AppState>,
    Json(request): Json<WriteFileRequest>,
) -> Result<Json<WriteFileResponse>, ApiError> {
    if !state.config.allow_file_writes {
        return Err(ApiError::Disabled);
    }

    let path = request
        .path
        .ok_or_else(|| ApiError::validation("missing required field: path"))?;
    let content = request
        .content
        .ok_or_else(|| ApiError::validation("missing required field: content"))?;

    match files::write_workflow_file(&state.config.orchestrator_root, &path, &content) {
        Ok(written) => {
            tracing::info!(path = %written.display(), bytes = content.len(), "wrote workflow file");
            Ok(Json(WriteFileResponse {
                success: true,
                path: written.display().to_string(),
            }))
        }
        Err(WriteError::InvalidPath(message)) => Err(ApiError::Validation(message)),
        Err(WriteError::Io(e)) => Err(state.internal(format!("failed to write {}: {}", path, e))),
    }
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    /// Accepted for backwards compatibility with older frontends and
    /// ignored — the server-resolved root is authoritative.
    pub orchestrator_path: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SimulateResponse {
    pub success: bool,
    pub output: String,
}

/// Run one workflow simulation and relay the CLI's console output.
///
/// Always responds 200; a failed simulation is reported in-band via
/// `success: false`.
#[utoipa::path(
    post,
    path = "/api/simulate",
    request_body(content = SimulateRequest, description = "Optional; the orchestrator path field is ignored"),
    responses((status = 200, description = "Simulation outcome", body = SimulateResponse))
)]
pub async fn simulate(
    State(state): State<AppState>,
    request: Option<Json<SimulateRequest>>,
) -> Json<SimulateResponse> {
    if let Some(Json(SimulateRequest {
        orchestrator_path: Some(supplied),
    })) = request
    {
        tracing::warn!(%supplied, "ignoring caller-supplied orchestrator path");
    }

    let result = simulate::run_simulation(
        &state.config.orchestrator_root,
        &state.config.cli_program,
    )
    .await;

    if !result.succeeded {
        tracing::warn!("simulation failed");
    }
    Json(SimulateResponse {
        success: result.succeeded,
        output: result.combined_output,
    })
}

#[derive(Serialize, ToSchema)]
pub struct EnvConfigResponse {
    pub configured: bool,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report whether a private key is configured. Never fails — an unreadable
/// file is reported as unconfigured with a diagnostic.
#[utoipa::path(
    get,
    path = "/api/get-env-config",
    responses((status = 200, description = "Key status", body = EnvConfigResponse))
)]
pub async fn get_env_config(State(state): State<AppState>) -> Json<EnvConfigResponse> {
    let status = env_store::read_private_key_status(&state.config.env_file);
    Json(EnvConfigResponse {
        configured: status.configured,
        path: status.path,
        error: status.error,
    })
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetEnvConfigRequest {
    pub private_key: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SetEnvConfigResponse {
    pub success: bool,
}

/// Store a private key (64 hex chars, optional 0x prefix) in the
/// orchestrator's `.env`, preserving unrelated entries.
#[utoipa::path(
    post,
    path = "/api/set-env-config",
    request_body = SetEnvConfigRequest,
    responses(
        (status = 200, description = "Key stored", body = SetEnvConfigResponse),
        (status = 400, description = "Missing or malformed key"),
        (status = 500, description = "Filesystem failure"),
    )
)]
pub async fn set_env_config(
    State(state): State<AppState>,
    Json(request): Json<SetEnvConfigRequest>,
) -> Result<Json<SetEnvConfigResponse>, ApiError> {
    let key = request
        .private_key
        .ok_or_else(|| ApiError::validation("missing required field: privateKey"))?;

    match env_store::write_private_key(&state.config.env_file, &key) {
        Ok(()) => {
            tracing::info!(path = %state.config.env_file.display(), "stored private key");
            Ok(Json(SetEnvConfigResponse { success: true }))
        }
        Err(env_store::EnvStoreError::InvalidKey(message)) => Err(ApiError::Validation(message)),
        Err(env_store::EnvStoreError::Io(e)) => Err(state.internal(format!(
            "failed to update {}: {}",
            state.config.env_file.display(),
            e
        ))),
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
