// File: crates/carecal_schedule/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use carecal_common::{handle_json_result, CarecalError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{
    AppointmentRecord, DaySchedule, NewUnavailabilityRule, ScheduleConfig, UnavailabilityRule,
};
use crate::service::{DateQuery, ScheduleQuery, ScheduleService};

// Shared state for the schedule routes
#[derive(Clone)]
pub struct ScheduleState {
    pub service: Arc<ScheduleService>,
}

/// Header naming the caller's session. A newer schedule query in the same
/// session makes an unfinished older one fail with 409.
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Serialize, Deserialize, Debug)]
pub struct ScheduleResponse {
    pub provider_id: String,
    pub days: Vec<DaySchedule>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RulesResponse {
    pub provider_id: String,
    pub rules: Vec<UnavailabilityRule>,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, CarecalError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| CarecalError::ParseError(rejection.body_text()))
}

fn session_id(headers: &HeaderMap) -> Result<Option<&str>, CarecalError> {
    match headers.get(SESSION_HEADER) {
        None => Ok(None),
        Some(value) => {
            let session = value
                .to_str()
                .map_err(|_| CarecalError::ParseError(format!("{SESSION_HEADER} must be ASCII")))?
                .trim();
            Ok((!session.is_empty()).then_some(session))
        }
    }
}

/// Composed slots for one date (`?date=`) or a range (`?start_date=&end_date=`).
pub async fn get_schedule_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, CarecalError> {
    let query = DateQuery::try_from(query)?;
    let days = match session_id(&headers)? {
        Some(session) => {
            state
                .service
                .get_session_schedule(session, &provider_id, query)
                .await?
        }
        None => state.service.get_schedule(&provider_id, query).await?,
    };
    Ok(Json(ScheduleResponse { provider_id, days }))
}

pub async fn get_config_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
) -> Result<Json<ScheduleConfig>, CarecalError> {
    handle_json_result(state.service.get_schedule_config(&provider_id).await)
}

pub async fn put_config_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
    body: Result<Json<ScheduleConfig>, JsonRejection>,
) -> Result<Json<ScheduleConfig>, CarecalError> {
    let config = json_body(body)?;
    info!("Updating schedule config for provider {}", provider_id);
    let stored = state
        .service
        .update_schedule_config(&provider_id, config)
        .await?;
    Ok(Json(stored))
}

pub async fn list_rules_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
) -> Result<Json<RulesResponse>, CarecalError> {
    let rules = state
        .service
        .list_unavailability_rules(&provider_id)
        .await?;
    Ok(Json(RulesResponse { provider_id, rules }))
}

pub async fn add_rule_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
    body: Result<Json<NewUnavailabilityRule>, JsonRejection>,
) -> Result<(StatusCode, Json<UnavailabilityRule>), CarecalError> {
    let draft = json_body(body)?;
    let rule = state
        .service
        .add_unavailability_rule(&provider_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn delete_rule_handler(
    State(state): State<Arc<ScheduleState>>,
    Path((provider_id, rule_id)): Path<(String, String)>,
) -> Result<StatusCode, CarecalError> {
    state
        .service
        .remove_unavailability_rule(&provider_id, &rule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Seeds an appointment record into the store (stand-in for the booking
/// subsystem).
pub async fn seed_appointment_handler(
    State(state): State<Arc<ScheduleState>>,
    Path(provider_id): Path<String>,
    body: Result<Json<AppointmentRecord>, JsonRejection>,
) -> Result<StatusCode, CarecalError> {
    let record = json_body(body)?;
    state.service.seed_appointment(&provider_id, record).await?;
    Ok(StatusCode::CREATED)
}
