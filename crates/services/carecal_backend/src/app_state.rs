// --- File: crates/services/carecal_backend/src/app_state.rs ---
use std::sync::Arc;

use carecal_config::AppConfig;
use carecal_schedule::{ScheduleError, ScheduleService};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Provider schedules, backed by the in-memory store.
    pub schedule: Arc<ScheduleService>,
}

impl AppState {
    /// Builds the schedule service from the clinic settings in `config`.
    pub fn new(config: Arc<AppConfig>) -> Result<Self, ScheduleError> {
        let schedule = Arc::new(ScheduleService::from_app_config(&config)?);
        Ok(Self { config, schedule })
    }
}
