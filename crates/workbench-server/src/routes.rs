//! Router assembly, shared state, and the CORS policy.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use workbench_core::{RunMode, WorkbenchConfig};

use crate::error::ApiError;
use crate::handlers;

/// Shared request state: the immutable process configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WorkbenchConfig>,
}

impl AppState {
    /// Internal-error constructor that gates the detail on the run mode:
    /// production clients get a generic message, the full text still goes
    /// to the log.
    pub fn internal(&self, message: String) -> ApiError {
        tracing::error!("{}", message);
        ApiError::Internal {
            message,
            expose: self.config.mode != RunMode::Production,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CRE Workbench API",
        description = "Local backend bridging the workbench frontend to the cre CLI and the orchestrator checkout."
    ),
    paths(
        handlers::health,
        handlers::info,
        handlers::write_file,
        handlers::simulate,
        handlers::get_env_config,
        handlers::set_env_config,
    ),
    components(schemas(
        handlers::HealthResponse,
        handlers::InfoResponse,
        handlers::EndpointInfo,
        handlers::WriteFileRequest,
        handlers::WriteFileResponse,
        handlers::SimulateRequest,
        handlers::SimulateResponse,
        handlers::EnvConfigResponse,
        handlers::SetEnvConfigRequest,
        handlers::SetEnvConfigResponse,
    ))
)]
struct ApiDoc;

async fn openapi_doc() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the application router for the given configuration.
pub fn app(config: WorkbenchConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    let cors = cors_layer(&state.config.frontend_origin);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/info", get(handlers::info))
        .route("/api/openapi.json", get(openapi_doc))
        .route("/api/write-file", post(handlers::write_file))
        .route("/api/simulate", post(handlers::simulate))
        .route("/api/get-env-config", get(handlers::get_env_config))
        .route("/api/set-env-config", post(handlers::set_env_config))
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(state)
}

/// Deny-by-default CORS: exactly the configured frontend origin is allowed.
/// An unparseable origin disables cross-origin access entirely rather than
/// falling back to allow-all.
fn cors_layer(frontend_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                origin = frontend_origin,
                "invalid frontend origin; cross-origin requests will be refused"
            );
            layer
        }
    }
}
