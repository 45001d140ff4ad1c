// --- File: crates/carecal_schedule/src/lib.rs ---
// Declare modules within this crate
pub mod error;
pub mod generator;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod time;
pub mod unavailability;

pub use error::{Result, ScheduleError};
pub use logic::{compose_day, compose_from_records, compose_range, MAX_RANGE_DAYS};
pub use models::{
    Appointment, AppointmentRecord, AppointmentStatus, BlockReason, BreakWindow,
    ConsultationMode, ConsultationModes, DaySchedule, Diagnostic, DiagnosticKind,
    NewUnavailabilityRule, RecurrencePattern, RuleKind, ScheduleConfig, Slot, SlotStatus,
    UnavailabilityRule, WorkingHours,
};
pub use service::{DateQuery, ScheduleService};
pub use store::{InMemoryScheduleStore, ProviderSchedule, ScheduleStore};
pub use time::TimeOfDay;
