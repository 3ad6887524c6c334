pub mod handlers;
pub mod middleware;
pub mod extractors;
pub mod pages;

use crate::{models::ModelManager, utils::error::ClassifyError, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: ModelManager,
}

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载模型，失败则直接退出
    let models = ModelManager::init(&config)?;

    let addr: SocketAddr = config.bind_addr
        .parse()
        .map_err(|e| ClassifyError::Config(
            format!("Invalid bind address {}: {}", config.bind_addr, e)
        ))?;

    let app = create_app(AppState { config, models });

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET/POST /            - Web form");
    tracing::info!("  GET/POST /dashboard   - Dashboard");
    tracing::info!("  POST /api/classify    - Multipart upload, JSON result");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ClassifyError::Internal(
            format!("Failed to bind to address {}: {}", addr, e)
        ))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ClassifyError::Internal(
            format!("Server failed: {}", e)
        ))?;

    tracing::info!("Server stopped");
    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        // 前端页面
        .route("/", get(handlers::form_page).post(handlers::form_submit))
        .route("/dashboard", get(handlers::dashboard_page).post(handlers::dashboard_submit))

        // API路由
        .route("/api/classify", post(handlers::classify_api_handler))

        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))

        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(TraceLayer::new_for_http())
        // 由 RequestBodyLimitLayer 统一限制请求体大小
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let models = state.models.clone();
    tokio::task::spawn_blocking(move || models.health_check())
        .await
        .map_err(|e| ClassifyError::Internal(format!("Health check task failed: {}", e)))??;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "Scalp Monitor",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": state.models.stats(),
        "presets": {
            "form": state.config.form_preset,
            "dashboard": state.config.dashboard_preset,
        }
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
