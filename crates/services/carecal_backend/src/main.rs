// File: services/carecal_backend/src/main.rs
use std::error::Error;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use carecal_common::{config_error, log_result};
use carecal_config::{load_config, AppConfig};
use carecal_schedule::routes::routes_with_service;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod app_state;
use app_state::AppState;

async fn health(State(config): State<Arc<AppConfig>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "time_zone": config.clinic.time_zone,
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Arc::new(load_config()?);
    carecal_common::init_from_str(&config.logging.level);

    let state = log_result(
        AppState::new(config.clone()).map_err(config_error),
        "Schedule service ready",
        "Failed to build schedule service",
    )?;

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the CareCal scheduling API!" }))
        .route("/health", get(health))
        .with_state(state.config.clone())
        .merge(routes_with_service(state.schedule.clone()));

    let app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
