pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{
    models::ModelManager, tta::TtaEngine, utils::error::ClassifyError, Config, Result,
};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
};

/// 启动时构建一次、传给所有处理器的只读服务上下文
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub models: ModelManager,
    pub engine: Arc<TtaEngine>,
}

impl AppState {
    pub fn new(config: Config, models: ModelManager) -> Result<Self> {
        let engine = TtaEngine::new(
            config.tta_config.clone(),
            config.server_config.max_request_size,
        )?;

        Ok(Self {
            config: Arc::new(config),
            models,
            engine: Arc::new(engine),
        })
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    let models = ModelManager::load(&config);
    let state = AppState::new(config, models)?;
    let app = create_app(state)?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /          - Liveness message");
    tracing::info!("  POST /predict   - Multipart image upload");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  GET  /api/info  - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Result<Router> {
    let server_config = &state.config.server_config;
    let cors = cors_layer(&server_config.cors_origins, state.config.dev_mode)?;

    let app = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        // 用 RequestBodyLimitLayer 统一限制，关闭 axum 默认的 2MB 限制
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(cors)
        .with_state(state);

    Ok(app)
}

fn cors_layer(origins: &[String], dev_mode: bool) -> Result<CorsLayer> {
    if dev_mode {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| ClassifyError::Config(format!("Invalid CORS origin {}: {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    // 携带凭据时不能使用通配符，改为回显请求的方法和头
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
