// --- File: crates/carecal_schedule/src/routes.rs ---

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use carecal_config::AppConfig;

use crate::error::Result;
use crate::handlers::{
    add_rule_handler, delete_rule_handler, get_config_handler, get_schedule_handler,
    list_rules_handler, put_config_handler, seed_appointment_handler, ScheduleState,
};
use crate::service::ScheduleService;

/// Router for all provider schedule endpoints, backed by an in-memory store
/// seeded from `config.schedule.defaults`.
pub fn routes(config: Arc<AppConfig>) -> Result<Router> {
    let service = Arc::new(ScheduleService::from_app_config(&config)?);
    Ok(routes_with_service(service))
}

/// Same routes over an existing service.
pub fn routes_with_service(service: Arc<ScheduleService>) -> Router {
    let state = Arc::new(ScheduleState { service });

    Router::new()
        .route("/providers/{provider_id}/schedule", get(get_schedule_handler))
        .route(
            "/providers/{provider_id}/config",
            get(get_config_handler).put(put_config_handler),
        )
        .route(
            "/providers/{provider_id}/unavailability",
            get(list_rules_handler).post(add_rule_handler),
        )
        .route(
            "/providers/{provider_id}/unavailability/{rule_id}",
            delete(delete_rule_handler),
        )
        .route(
            "/providers/{provider_id}/appointments",
            post(seed_appointment_handler),
        )
        .with_state(state)
}
