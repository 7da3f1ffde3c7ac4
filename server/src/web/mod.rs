use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::Database;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::task::{DbTaskStore, TaskStore};

const DEFAULT_APP_TITLE: &str = "Task Tracker";
const DEFAULT_THEME_COLOR: &str = "#0066cc";
const DEFAULT_AWS_REGION: &str = "us-west-2";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::task::api::get_tasks_handler,
        crate::task::api::create_task_handler,
        health_check_handler,
        readiness_check_handler,
        get_config_handler,
    ),
    tags(
        (name = "Tasks", description = "Task management endpoints"),
        (name = "Probes", description = "Liveness and readiness probes"),
        (name = "Config", description = "UI configuration")
    )
)]
struct ApiDoc;

/// Response body for the liveness probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests
    status: String,
    /// Current server time, RFC 3339
    timestamp: String,
}

/// Response body for a passing readiness probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    /// `ready` when the store is reachable
    status: String,
    /// Current server time, RFC 3339
    timestamp: String,
}

/// Response body for a failing readiness probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotReadyResponse {
    /// Always `not ready`
    status: String,
    /// Human-readable cause of the failure
    reason: String,
    /// Current server time, RFC 3339
    timestamp: String,
}

/// Settings the browser client polls to restyle itself without a redeploy.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// Display title for the application
    app_title: String,
    /// Primary theme color as a hex string
    theme_color: String,
    /// Region label shown in the header badge
    aws_region: String,
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Task tracker running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let state = AppState {
        store: Arc::new(DbTaskStore::new(db)),
    };
    let app = create_app(state, &config.static_dir);

    // No connection draining: a termination signal logs one line and the
    // process exits with in-flight requests dropped.
    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received, exiting");
        }
    }
    Ok(())
}

/// Builds the full application router: task API, probes, config endpoint,
/// Swagger UI and the static client as the fallback.
pub fn create_app(state: AppState, static_dir: &str) -> Router {
    let task_router = crate::task::api::create_task_router(state.clone());
    let probe_router = Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .route("/ready", axum::routing::get(readiness_check_handler))
        .route("/api/config", axum::routing::get(get_config_handler))
        .with_state(state);

    Router::new()
        .merge(task_router)
        .merge(probe_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {}", err);
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

/// Handler for GET /health - liveness probe, no downstream calls.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is serving requests", body = HealthResponse)
    ),
    tag = "Probes"
)]
pub async fn health_check_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Handler for GET /ready - readiness probe backed by the store
/// connectivity check. Store failures become a 503, never a panic.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Store is reachable", body = ReadinessResponse),
        (status = 503, description = "Store is not reachable", body = NotReadyResponse)
    ),
    tag = "Probes"
)]
pub async fn readiness_check_handler(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<NotReadyResponse>)> {
    match state.store.probe_connectivity().await {
        Ok(()) => Ok(Json(ReadinessResponse {
            status: "ready".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        })),
        Err(err) => {
            tracing::error!("readiness check failed: {}", err);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(NotReadyResponse {
                    status: "not ready".to_string(),
                    reason: err.to_string(),
                    timestamp: Utc::now().to_rfc3339(),
                }),
            ))
        }
    }
}

/// Handler for GET /api/config - a pure function of the environment, read
/// at request time so externally-managed values propagate without a restart.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Current UI configuration", body = ConfigResponse)
    ),
    tag = "Config"
)]
pub async fn get_config_handler() -> Json<ConfigResponse> {
    Json(ConfigResponse {
        app_title: std::env::var("APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string()),
        theme_color: std::env::var("APP_THEME_COLOR")
            .unwrap_or_else(|_| DEFAULT_THEME_COLOR.to_string()),
        aws_region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string()),
    })
}
