// --- File: crates/carecal_schedule/src/models.rs ---
use std::fmt;
use std::str::FromStr;

use carecal_config::ScheduleDefaults;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::time::{parse_weekday, weekday_names, MinuteSpan, TimeOfDay};

// --- Consultation modes ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationMode {
    Online,
    Offline,
}

impl ConsultationMode {
    pub const ALL: [ConsultationMode; 2] = [ConsultationMode::Online, ConsultationMode::Offline];
}

impl fmt::Display for ConsultationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationMode::Online => f.write_str("online"),
            ConsultationMode::Offline => f.write_str("offline"),
        }
    }
}

impl FromStr for ConsultationMode {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(ConsultationMode::Online),
            "offline" => Ok(ConsultationMode::Offline),
            other => Err(ScheduleError::InvalidFormat(format!(
                "unknown consultation mode {other:?}"
            ))),
        }
    }
}

/// Which channels the provider offers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsultationModes {
    pub online: bool,
    pub offline: bool,
}

impl ConsultationModes {
    pub fn supports(&self, mode: ConsultationMode) -> bool {
        match mode {
            ConsultationMode::Online => self.online,
            ConsultationMode::Offline => self.offline,
        }
    }

    /// Enabled modes in a stable order (online first).
    pub fn enabled(&self) -> Vec<ConsultationMode> {
        ConsultationMode::ALL
            .into_iter()
            .filter(|mode| self.supports(*mode))
            .collect()
    }
}

// --- Schedule configuration ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkingHours {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakWindow {
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl BreakWindow {
    pub fn disabled() -> Self {
        BreakWindow {
            enabled: false,
            start: TimeOfDay::MIDNIGHT,
            end: TimeOfDay::MIDNIGHT,
        }
    }

    /// The break as an interval, only when enabled.
    pub fn span(&self) -> Option<MinuteSpan> {
        if self.enabled {
            MinuteSpan::between(self.start, self.end)
        } else {
            None
        }
    }
}

/// A provider's standing availability settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleConfig {
    #[serde(with = "weekday_names")]
    pub working_days: Vec<Weekday>,
    pub working_hours: WorkingHours,
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub buffer_minutes: u32,
    pub break_window: BreakWindow,
    pub consultation_modes: ConsultationModes,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let hm = |h, m| TimeOfDay::from_hm(h, m).unwrap_or(TimeOfDay::MIDNIGHT);
        ScheduleConfig {
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            working_hours: WorkingHours {
                start: hm(9, 0),
                end: hm(18, 0),
            },
            slot_duration_minutes: 30,
            buffer_minutes: 0,
            break_window: BreakWindow {
                enabled: true,
                start: hm(13, 0),
                end: hm(14, 0),
            },
            consultation_modes: ConsultationModes {
                online: true,
                offline: true,
            },
        }
    }
}

impl ScheduleConfig {
    /// Checks the working-hours, break and slot invariants.
    pub fn validate(&self) -> Result<()> {
        let hours = &self.working_hours;
        if hours.start >= hours.end {
            return Err(ScheduleError::InvalidConfig(format!(
                "working hours start {} must be before end {}",
                hours.start, hours.end
            )));
        }
        if self.slot_duration_minutes == 0 {
            return Err(ScheduleError::InvalidConfig(
                "slot duration must be positive".to_string(),
            ));
        }
        let brk = &self.break_window;
        if brk.enabled
            && !(hours.start <= brk.start && brk.start < brk.end && brk.end <= hours.end)
        {
            return Err(ScheduleError::InvalidConfig(format!(
                "break {}-{} must lie inside working hours {}-{}",
                brk.start, brk.end, hours.start, hours.end
            )));
        }
        if !self.consultation_modes.online && !self.consultation_modes.offline {
            return Err(ScheduleError::InvalidConfig(
                "at least one consultation mode must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates and collapses duplicate working days (Monday first).
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        self.working_days
            .sort_by_key(|day| day.num_days_from_monday());
        self.working_days.dedup();
        Ok(self)
    }

    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.working_days.contains(&weekday)
    }

    /// Builds a provider config from the clinic-wide defaults in `AppConfig`.
    pub fn from_defaults(defaults: &ScheduleDefaults) -> Result<Self> {
        let working_days = defaults
            .working_days
            .iter()
            .map(|day| parse_weekday(day))
            .collect::<Result<Vec<_>>>()?;
        let break_window = if defaults.break_enabled {
            let start = defaults.break_start_time.as_deref().ok_or_else(|| {
                ScheduleError::InvalidConfig("break enabled without start time".to_string())
            })?;
            let end = defaults.break_end_time.as_deref().ok_or_else(|| {
                ScheduleError::InvalidConfig("break enabled without end time".to_string())
            })?;
            BreakWindow {
                enabled: true,
                start: TimeOfDay::parse(start)?,
                end: TimeOfDay::parse(end)?,
            }
        } else {
            BreakWindow::disabled()
        };

        ScheduleConfig {
            working_days,
            working_hours: WorkingHours {
                start: TimeOfDay::parse(&defaults.work_start_time)?,
                end: TimeOfDay::parse(&defaults.work_end_time)?,
            },
            slot_duration_minutes: defaults.slot_duration_minutes,
            buffer_minutes: defaults.buffer_minutes,
            break_window,
            consultation_modes: ConsultationModes {
                online: defaults.online,
                offline: defaults.offline,
            },
        }
        .normalized()
    }
}

// --- Unavailability rules ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrencePattern {
    Weekly {
        #[serde(with = "weekday_names")]
        days_of_week: Vec<Weekday>,
    },
    /// `day_of_month` may be omitted on creation; it is then anchored to the
    /// creation date.
    Monthly {
        #[serde(default)]
        day_of_month: Option<u32>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Blocks whole days, both dates inclusive.
    FullDayRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// Blocks the same clock window on every day of the range.
    TimeRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    },
    Recurring {
        pattern: RecurrencePattern,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
        until_date: NaiveDate,
    },
}

/// Rule as submitted by a provider, before an id is assigned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewUnavailabilityRule {
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default = "default_true")]
    pub affects_online: bool,
    #[serde(default = "default_true")]
    pub affects_offline: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_true() -> bool {
    true
}

impl NewUnavailabilityRule {
    pub fn into_rule(self, id: String) -> UnavailabilityRule {
        UnavailabilityRule {
            id,
            kind: self.kind,
            affects_online: self.affects_online,
            affects_offline: self.affects_offline,
            reason: self.reason,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnavailabilityRule {
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub affects_online: bool,
    pub affects_offline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnavailabilityRule {
    pub fn affects(&self, mode: ConsultationMode) -> bool {
        match mode {
            ConsultationMode::Online => self.affects_online,
            ConsultationMode::Offline => self.affects_offline,
        }
    }

    /// Rejects inverted or empty spans and rules that can never apply.
    pub fn validate(&self) -> Result<()> {
        if !self.affects_online && !self.affects_offline {
            return Err(ScheduleError::InvalidRange(format!(
                "rule {} affects no consultation mode",
                self.id
            )));
        }
        match &self.kind {
            RuleKind::FullDayRange {
                start_date,
                end_date,
            } => check_dates(*start_date, *end_date),
            RuleKind::TimeRange {
                start_date,
                end_date,
                start_time,
                end_time,
            } => {
                check_dates(*start_date, *end_date)?;
                check_times(*start_time, *end_time)
            }
            RuleKind::Recurring {
                pattern,
                start_time,
                end_time,
                ..
            } => {
                check_times(*start_time, *end_time)?;
                match pattern {
                    RecurrencePattern::Weekly { days_of_week } if days_of_week.is_empty() => Err(
                        ScheduleError::InvalidRange("weekly rule has no weekdays".to_string()),
                    ),
                    RecurrencePattern::Weekly { .. } => Ok(()),
                    RecurrencePattern::Monthly {
                        day_of_month: Some(day),
                    } if (1..=31).contains(day) => Ok(()),
                    RecurrencePattern::Monthly {
                        day_of_month: Some(day),
                    } => Err(ScheduleError::InvalidRange(format!(
                        "day of month {day} is outside 1-31"
                    ))),
                    RecurrencePattern::Monthly { day_of_month: None } => Err(
                        ScheduleError::InvalidRange("monthly rule has no anchor day".to_string()),
                    ),
                }
            }
        }
    }
}

fn check_dates(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(ScheduleError::InvalidRange(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

fn check_times(start: TimeOfDay, end: TimeOfDay) -> Result<()> {
    if start >= end {
        return Err(ScheduleError::InvalidRange(format!(
            "start time {start} must be before end time {end}"
        )));
    }
    Ok(())
}

// --- Appointments ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Pending,
    Cancelled,
}

impl AppointmentStatus {
    /// Cancelled appointments free their slot.
    pub fn occupies_slot(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl FromStr for AppointmentStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "pending" => Ok(AppointmentStatus::Pending),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(ScheduleError::InvalidFormat(format!(
                "unknown appointment status {other:?}"
            ))),
        }
    }
}

/// A booking owned by the booking subsystem; read-only here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Appointment {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
    pub mode: ConsultationMode,
    pub status: AppointmentStatus,
}

/// Appointment exactly as the store hands it over; fields are unchecked text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppointmentRecord {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: i64,
    pub mode: String,
    pub status: String,
}

impl TryFrom<&AppointmentRecord> for Appointment {
    type Error = ScheduleError;

    fn try_from(record: &AppointmentRecord) -> Result<Self> {
        let duration_minutes = u32::try_from(record.duration_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or_else(|| {
                ScheduleError::InvalidFormat(format!(
                    "duration {} is not a positive minute count",
                    record.duration_minutes
                ))
            })?;
        Ok(Appointment {
            id: record.id.clone(),
            date: crate::time::parse_date(&record.date)?,
            start_time: TimeOfDay::parse(&record.start_time)?,
            duration_minutes,
            mode: record.mode.parse()?,
            status: record.status.parse()?,
        })
    }
}

impl From<&Appointment> for AppointmentRecord {
    fn from(appointment: &Appointment) -> Self {
        AppointmentRecord {
            id: appointment.id.clone(),
            date: appointment.date.format("%Y-%m-%d").to_string(),
            start_time: appointment.start_time.to_string(),
            duration_minutes: i64::from(appointment.duration_minutes),
            mode: appointment.mode.to_string(),
            status: match appointment.status {
                AppointmentStatus::Confirmed => "confirmed",
                AppointmentStatus::Pending => "pending",
                AppointmentStatus::Cancelled => "cancelled",
            }
            .to_string(),
        }
    }
}

// --- Slots ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    /// An unavailability rule covers every supported mode.
    Unavailable,
    /// Falls inside the gap enforced after a booked slot.
    Buffer,
}

/// One candidate appointment window on a date. Recomputed on every query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub status: SlotStatus,
    pub available_modes: Vec<ConsultationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupying_appointment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
}

impl Slot {
    pub fn span(&self) -> MinuteSpan {
        MinuteSpan {
            start: self.start.minutes_since_midnight(),
            end: self.end.minutes_since_midnight(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Appointment,
    Rule,
}

/// An input record left out of composition, with the reason.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub record_id: String,
    pub message: String,
}

/// Composed schedule for a single date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(text: &str) -> TimeOfDay {
        TimeOfDay::parse(text).unwrap()
    }

    fn d(text: &str) -> NaiveDate {
        crate::time::parse_date(text).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScheduleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_inverted_hours() {
        let mut config = ScheduleConfig::default();
        config.working_hours = WorkingHours {
            start: t("18:00"),
            end: t("09:00"),
        };
        assert!(matches!(config.validate(), Err(ScheduleError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_break_outside_hours() {
        let mut config = ScheduleConfig::default();
        config.break_window = BreakWindow {
            enabled: true,
            start: t("17:30"),
            end: t("18:30"),
        };
        assert!(matches!(config.validate(), Err(ScheduleError::InvalidConfig(_))));

        // A disabled break is not checked.
        config.break_window.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_duration_and_no_modes() {
        let mut config = ScheduleConfig::default();
        config.slot_duration_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = ScheduleConfig::default();
        config.consultation_modes = ConsultationModes {
            online: false,
            offline: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_dedupes_days() {
        let mut config = ScheduleConfig::default();
        config.working_days = vec![Weekday::Fri, Weekday::Mon, Weekday::Fri];
        let config = config.normalized().unwrap();
        assert_eq!(config.working_days, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn test_from_defaults_matches_default() {
        let config = ScheduleConfig::from_defaults(&ScheduleDefaults::default()).unwrap();
        assert_eq!(config, ScheduleConfig::default());
    }

    #[test]
    fn test_from_defaults_rejects_bad_time() {
        let defaults = ScheduleDefaults {
            work_start_time: "9am".to_string(),
            ..ScheduleDefaults::default()
        };
        assert!(matches!(
            ScheduleConfig::from_defaults(&defaults),
            Err(ScheduleError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rule_validation() {
        let inverted = NewUnavailabilityRule {
            kind: RuleKind::FullDayRange {
                start_date: d("2025-02-10"),
                end_date: d("2025-02-05"),
            },
            affects_online: true,
            affects_offline: true,
            reason: None,
        }
        .into_rule("r1".to_string());
        assert!(matches!(inverted.validate(), Err(ScheduleError::InvalidRange(_))));

        let zero_length = UnavailabilityRule {
            id: "r2".to_string(),
            kind: RuleKind::TimeRange {
                start_date: d("2025-02-10"),
                end_date: d("2025-02-10"),
                start_time: t("10:00"),
                end_time: t("10:00"),
            },
            affects_online: true,
            affects_offline: false,
            reason: None,
        };
        assert!(zero_length.validate().is_err());

        let unanchored = UnavailabilityRule {
            id: "r3".to_string(),
            kind: RuleKind::Recurring {
                pattern: RecurrencePattern::Monthly { day_of_month: None },
                start_time: t("08:00"),
                end_time: t("09:00"),
                until_date: d("2025-12-31"),
            },
            affects_online: true,
            affects_offline: true,
            reason: None,
        };
        assert!(unanchored.validate().is_err());
    }

    #[test]
    fn test_rule_json_shape() {
        let json = r#"{
            "id": "abc",
            "kind": "recurring",
            "pattern": { "type": "weekly", "days_of_week": ["Monday", "Wed"] },
            "start_time": "09:00",
            "end_time": "12:00",
            "until_date": "2025-03-01",
            "affects_online": true,
            "affects_offline": false,
            "reason": "supervision"
        }"#;
        let rule: UnavailabilityRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule.kind,
            RuleKind::Recurring {
                pattern: RecurrencePattern::Weekly {
                    days_of_week: vec![Weekday::Mon, Weekday::Wed]
                },
                start_time: t("09:00"),
                end_time: t("12:00"),
                until_date: d("2025-03-01"),
            }
        );
        assert!(rule.affects(ConsultationMode::Online));
        assert!(!rule.affects(ConsultationMode::Offline));
    }

    #[test]
    fn test_weekdays_serialize_as_full_names() {
        let config = serde_json::to_value(ScheduleConfig::default()).unwrap();
        assert_eq!(
            config["working_days"],
            serde_json::json!(["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"])
        );

        let pattern = RecurrencePattern::Weekly {
            days_of_week: vec![Weekday::Sat],
        };
        assert_eq!(
            serde_json::to_value(&pattern).unwrap(),
            serde_json::json!({ "type": "weekly", "days_of_week": ["Saturday"] })
        );
    }

    #[test]
    fn test_appointment_record_parsing() {
        let record = AppointmentRecord {
            id: "a1".to_string(),
            date: "2025-01-06".to_string(),
            start_time: "10:00".to_string(),
            duration_minutes: 30,
            mode: "Online".to_string(),
            status: "confirmed".to_string(),
        };
        let appointment = Appointment::try_from(&record).unwrap();
        assert_eq!(appointment.start_time, t("10:00"));
        assert_eq!(appointment.mode, ConsultationMode::Online);
        assert_eq!(AppointmentRecord::from(&appointment).mode, "online");

        let broken = AppointmentRecord {
            start_time: "10".to_string(),
            ..record.clone()
        };
        assert!(Appointment::try_from(&broken).is_err());

        let negative = AppointmentRecord {
            duration_minutes: -5,
            ..record
        };
        assert!(Appointment::try_from(&negative).is_err());
    }

    #[test]
    fn test_status_occupancy() {
        assert!(AppointmentStatus::Confirmed.occupies_slot());
        assert!(AppointmentStatus::Pending.occupies_slot());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
    }
}
