// --- File: crates/carecal_schedule/src/store.rs ---
//! Persistence seam for per-provider schedule state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, ScheduleError};
use crate::models::{AppointmentRecord, ScheduleConfig, UnavailabilityRule};

/// Everything composition needs for one provider, plus change counters.
///
/// Each counter is bumped whenever its part changes, so a
/// `(config_version, rules_version, appointments_version)` triple identifies
/// one exact set of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSchedule {
    pub config: ScheduleConfig,
    pub rules: Vec<UnavailabilityRule>,
    pub appointments: Vec<AppointmentRecord>,
    pub config_version: u64,
    pub rules_version: u64,
    pub appointments_version: u64,
}

impl ProviderSchedule {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
            appointments: Vec::new(),
            config_version: 0,
            rules_version: 0,
            appointments_version: 0,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Current state; providers never written to get the default config.
    async fn load(&self, provider_id: &str) -> Result<ProviderSchedule>;

    /// Replaces the provider's config. Callers validate first.
    async fn update_config(&self, provider_id: &str, config: ScheduleConfig) -> Result<()>;

    /// Appends a validated rule and returns its id.
    async fn add_rule(&self, provider_id: &str, rule: UnavailabilityRule) -> Result<String>;

    /// Fails with `NotFound` when the provider has no rule with that id.
    async fn remove_rule(&self, provider_id: &str, rule_id: &str) -> Result<()>;

    /// Inserts or replaces (by id) a raw appointment record.
    async fn put_appointment(&self, provider_id: &str, record: AppointmentRecord) -> Result<()>;
}

/// Process-local store. State is lost on restart.
pub struct InMemoryScheduleStore {
    defaults: ScheduleConfig,
    providers: RwLock<HashMap<String, ProviderSchedule>>,
}

impl InMemoryScheduleStore {
    pub fn new(defaults: ScheduleConfig) -> Self {
        Self {
            defaults,
            providers: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryScheduleStore {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn load(&self, provider_id: &str) -> Result<ProviderSchedule> {
        let providers = self.providers.read().await;
        Ok(providers
            .get(provider_id)
            .cloned()
            .unwrap_or_else(|| ProviderSchedule::new(self.defaults.clone())))
    }

    async fn update_config(&self, provider_id: &str, config: ScheduleConfig) -> Result<()> {
        let mut providers = self.providers.write().await;
        let schedule = providers
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderSchedule::new(self.defaults.clone()));
        schedule.config = config;
        schedule.config_version += 1;
        info!(
            "Stored config v{} for provider {}",
            schedule.config_version, provider_id
        );
        Ok(())
    }

    async fn add_rule(&self, provider_id: &str, rule: UnavailabilityRule) -> Result<String> {
        let mut providers = self.providers.write().await;
        let schedule = providers
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderSchedule::new(self.defaults.clone()));
        let id = rule.id.clone();
        schedule.rules.push(rule);
        schedule.rules_version += 1;
        debug!("Added rule {} for provider {}", id, provider_id);
        Ok(id)
    }

    async fn remove_rule(&self, provider_id: &str, rule_id: &str) -> Result<()> {
        let mut providers = self.providers.write().await;
        let not_found = || {
            ScheduleError::NotFound(format!(
                "unavailability rule {rule_id} for provider {provider_id}"
            ))
        };
        let schedule = providers.get_mut(provider_id).ok_or_else(not_found)?;
        let position = schedule
            .rules
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or_else(not_found)?;
        schedule.rules.remove(position);
        schedule.rules_version += 1;
        debug!("Removed rule {} for provider {}", rule_id, provider_id);
        Ok(())
    }

    async fn put_appointment(&self, provider_id: &str, record: AppointmentRecord) -> Result<()> {
        let mut providers = self.providers.write().await;
        let schedule = providers
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderSchedule::new(self.defaults.clone()));
        match schedule
            .appointments
            .iter_mut()
            .find(|existing| existing.id == record.id)
        {
            Some(existing) => *existing = record,
            None => schedule.appointments.push(record),
        }
        schedule.appointments_version += 1;
        Ok(())
    }
}
