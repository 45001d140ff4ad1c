// --- File: crates/carecal_schedule/src/service.rs ---
//! Boundary operations over a [`ScheduleStore`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use carecal_config::AppConfig;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, ScheduleError};
use crate::logic::{compose_day, parse_appointments, range_len};
use crate::models::{
    AppointmentRecord, DaySchedule, NewUnavailabilityRule, RecurrencePattern, RuleKind,
    ScheduleConfig, UnavailabilityRule,
};
use crate::store::{InMemoryScheduleStore, ProviderSchedule, ScheduleStore};
use crate::time::parse_date;

/// Which dates a schedule query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateQuery {
    Day(NaiveDate),
    /// Both ends inclusive.
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateQuery {
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            DateQuery::Day(date) => (date, date),
            DateQuery::Range { start, end } => (start, end),
        }
    }
}

/// Query-string form: either `date` or both `start_date` and `end_date`.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TryFrom<ScheduleQuery> for DateQuery {
    type Error = ScheduleError;

    fn try_from(query: ScheduleQuery) -> Result<Self> {
        match (query.date, query.start_date, query.end_date) {
            (Some(date), None, None) => Ok(DateQuery::Day(parse_date(&date)?)),
            (None, Some(start), Some(end)) => Ok(DateQuery::Range {
                start: parse_date(&start)?,
                end: parse_date(&end)?,
            }),
            _ => Err(ScheduleError::InvalidFormat(
                "expected either date or start_date and end_date".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    provider_id: String,
    date: NaiveDate,
    config_version: u64,
    rules_version: u64,
    appointments_version: u64,
}

impl MemoKey {
    fn new(provider_id: &str, date: NaiveDate, schedule: &ProviderSchedule) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            date,
            config_version: schedule.config_version,
            rules_version: schedule.rules_version,
            appointments_version: schedule.appointments_version,
        }
    }

    fn same_inputs(&self, other: &MemoKey) -> bool {
        self.config_version == other.config_version
            && self.rules_version == other.rules_version
            && self.appointments_version == other.appointments_version
    }

    fn is_stale_for(&self, current: &MemoKey) -> bool {
        self.provider_id == current.provider_id && !self.same_inputs(current)
    }
}

/// Composed days in insertion order, evicting the oldest past `capacity`.
struct MemoCache {
    capacity: usize,
    days: HashMap<MemoKey, DaySchedule>,
    order: VecDeque<MemoKey>,
}

impl MemoCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            days: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &MemoKey) -> Option<&DaySchedule> {
        self.days.get(key)
    }

    fn insert(&mut self, key: MemoKey, day: DaySchedule) {
        // Entries for older versions of this provider can never be hit again.
        self.order.retain(|existing| !existing.is_stale_for(&key));
        self.days.retain(|existing, _| !existing.is_stale_for(&key));

        if self.days.insert(key.clone(), day).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.days.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.days.len()
    }
}

/// Memo size used when none is configured.
pub const DEFAULT_MEMO_CAPACITY: usize = 512;

/// Fills in a missing monthly anchor with the day of `today`.
pub fn anchor_monthly(mut draft: NewUnavailabilityRule, today: NaiveDate) -> NewUnavailabilityRule {
    if let RuleKind::Recurring {
        pattern: RecurrencePattern::Monthly { day_of_month },
        ..
    } = &mut draft.kind
    {
        if day_of_month.is_none() {
            *day_of_month = Some(today.day());
        }
    }
    draft
}

pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    time_zone: Tz,
    memoize: bool,
    /// Latest query generation per session; only sessions with a query in
    /// flight have an entry.
    generations: Mutex<HashMap<String, Arc<AtomicU64>>>,
    memo: Mutex<MemoCache>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, time_zone: Tz, memoize: bool) -> Self {
        Self {
            store,
            time_zone,
            memoize,
            generations: Mutex::new(HashMap::new()),
            memo: Mutex::new(MemoCache::new(DEFAULT_MEMO_CAPACITY)),
        }
    }

    /// Caps the number of memoised days across all providers.
    pub fn with_memo_capacity(self, capacity: usize) -> Self {
        Self {
            memo: Mutex::new(MemoCache::new(capacity)),
            ..self
        }
    }

    /// Service over an in-memory store seeded with the configured defaults.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let time_zone: Tz = config.clinic.time_zone.parse().map_err(|err| {
            ScheduleError::InvalidConfig(format!(
                "unknown clinic time zone {:?}: {}",
                config.clinic.time_zone, err
            ))
        })?;
        let defaults = ScheduleConfig::from_defaults(&config.schedule.defaults)?;
        info!(
            "Schedule service using time zone {} (memoize: {}, capacity {})",
            time_zone, config.schedule.memoize, config.schedule.memo_capacity
        );
        Ok(Self::new(
            Arc::new(InMemoryScheduleStore::new(defaults)),
            time_zone,
            config.schedule.memoize,
        )
        .with_memo_capacity(config.schedule.memo_capacity))
    }

    /// Composes the provider's schedule for every date in `query`.
    ///
    /// Concurrent callers never affect each other; see
    /// [`get_session_schedule`](Self::get_session_schedule) for queries that
    /// replace one another.
    pub async fn get_schedule(
        &self,
        provider_id: &str,
        query: DateQuery,
    ) -> Result<Vec<DaySchedule>> {
        let (start, end) = query.bounds();
        let days = range_len(start, end)?;
        let schedule = self.store.load(provider_id).await?;
        Ok(self.compose_loaded(provider_id, &schedule, start, days))
    }

    /// Like [`get_schedule`](Self::get_schedule), but a later query from the
    /// same session supersedes this one, whatever provider or dates it asks
    /// for. If it starts before this one finishes loading, this call fails
    /// with `Superseded` instead of returning slots the caller moved away
    /// from. Other sessions never interfere.
    pub async fn get_session_schedule(
        &self,
        session_id: &str,
        provider_id: &str,
        query: DateQuery,
    ) -> Result<Vec<DaySchedule>> {
        let (start, end) = query.bounds();
        let days = range_len(start, end)?;
        let (counter, generation) = self.begin_query(session_id);

        let loaded = self.store.load(provider_id).await;
        let current = self.end_query(session_id, &counter, generation);
        let schedule = loaded?;
        if !current {
            debug!(
                "Dropping superseded query for provider {} in session {}",
                provider_id, session_id
            );
            return Err(ScheduleError::Superseded(provider_id.to_string()));
        }
        Ok(self.compose_loaded(provider_id, &schedule, start, days))
    }

    fn compose_loaded(
        &self,
        provider_id: &str,
        schedule: &ProviderSchedule,
        start: NaiveDate,
        days: usize,
    ) -> Vec<DaySchedule> {
        let (appointments, parse_diagnostics) = parse_appointments(&schedule.appointments);
        let mut result = Vec::with_capacity(days);
        for date in start.iter_days().take(days) {
            let day = if self.memoize {
                self.memoized_day(provider_id, date, schedule, || {
                    compose_day(date, &schedule.config, &appointments, &schedule.rules)
                })
            } else {
                compose_day(date, &schedule.config, &appointments, &schedule.rules)
            };
            result.push(day);
        }

        // Record-level problems are reported once per response.
        if let Some(first) = result.first_mut() {
            let mut diagnostics = parse_diagnostics;
            diagnostics.append(&mut first.diagnostics);
            first.diagnostics = diagnostics;
        }
        result
    }

    pub async fn get_schedule_config(&self, provider_id: &str) -> Result<ScheduleConfig> {
        Ok(self.store.load(provider_id).await?.config)
    }

    /// Validates, normalises and stores a new config for the provider.
    pub async fn update_schedule_config(
        &self,
        provider_id: &str,
        config: ScheduleConfig,
    ) -> Result<ScheduleConfig> {
        let config = config.normalized().map_err(|err| {
            warn!("Rejected config for provider {}: {}", provider_id, err);
            err
        })?;
        self.store
            .update_config(provider_id, config.clone())
            .await?;
        Ok(config)
    }

    pub async fn list_unavailability_rules(
        &self,
        provider_id: &str,
    ) -> Result<Vec<UnavailabilityRule>> {
        Ok(self.store.load(provider_id).await?.rules)
    }

    /// Assigns an id, anchors monthly rules, validates and stores the rule.
    /// An invalid rule leaves the provider's rule set untouched.
    pub async fn add_unavailability_rule(
        &self,
        provider_id: &str,
        draft: NewUnavailabilityRule,
    ) -> Result<UnavailabilityRule> {
        let draft = anchor_monthly(draft, self.today());
        let rule = draft.into_rule(Uuid::new_v4().to_string());
        rule.validate().map_err(|err| {
            warn!("Rejected rule for provider {}: {}", provider_id, err);
            err
        })?;
        self.store.add_rule(provider_id, rule.clone()).await?;
        info!("Provider {} added unavailability rule {}", provider_id, rule.id);
        Ok(rule)
    }

    pub async fn remove_unavailability_rule(&self, provider_id: &str, rule_id: &str) -> Result<()> {
        self.store.remove_rule(provider_id, rule_id).await?;
        info!(
            "Provider {} removed unavailability rule {}",
            provider_id, rule_id
        );
        Ok(())
    }

    /// Stores a raw appointment record as the booking subsystem would.
    /// The record is kept as-is; unreadable fields surface later as
    /// diagnostics.
    pub async fn seed_appointment(&self, provider_id: &str, record: AppointmentRecord) -> Result<()> {
        if record.id.trim().is_empty() {
            return Err(ScheduleError::InvalidFormat(
                "appointment id must not be empty".to_string(),
            ));
        }
        self.store.put_appointment(provider_id, record).await
    }

    /// Current date in the clinic time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.time_zone).date_naive()
    }

    fn begin_query(&self, session_id: &str) -> (Arc<AtomicU64>, u64) {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let counter = generations
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (counter, generation)
    }

    /// Returns whether `generation` is still the session's latest query. The
    /// latest query to finish removes the session's entry.
    fn end_query(&self, session_id: &str, counter: &Arc<AtomicU64>, generation: u64) -> bool {
        let mut generations = self
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if counter.load(Ordering::SeqCst) != generation {
            return false;
        }
        if generations
            .get(session_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, counter))
        {
            generations.remove(session_id);
        }
        true
    }

    fn memoized_day<F>(
        &self,
        provider_id: &str,
        date: NaiveDate,
        schedule: &ProviderSchedule,
        compose: F,
    ) -> DaySchedule
    where
        F: FnOnce() -> DaySchedule,
    {
        let key = MemoKey::new(provider_id, date, schedule);
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(day) = memo.get(&key) {
            debug!("Memo hit for provider {} on {}", provider_id, date);
            return day.clone();
        }
        let day = compose();
        memo.insert(key, day.clone());
        day
    }

    #[cfg(test)]
    pub(crate) fn memo_len(&self) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub(crate) fn open_sessions(&self) -> usize {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
