use axum::{
    routing::{get, post, put},
    Router,
};
use database::{AlertSink, IndicatorStore};
use engine::SyncScheduler;
use risk::RiskEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub store: Arc<dyn IndicatorStore>,
    pub alerts: Arc<dyn AlertSink>,
    pub risk: Arc<RiskEngine>,
    /// Countries covered by `GET /api/risk/global`.
    pub risk_countries: Vec<String>,
    /// `None` disables `POST /api/sync`.
    pub scheduler: Option<Arc<SyncScheduler>>,
}

/// Builds the application routes around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/risk/country/:code", get(handlers::get_country_risk))
        .route("/api/risk/global", get(handlers::get_global_risk))
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/alerts/:id/acknowledge", put(handlers::acknowledge_alert))
        .route("/api/sync", post(handlers::trigger_sync))
        .route("/api/status", get(handlers::get_status))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
/// Tracing must already be initialized by the caller.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
