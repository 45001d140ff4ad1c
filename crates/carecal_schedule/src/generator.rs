// --- File: crates/carecal_schedule/src/generator.rs ---
use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::models::{ScheduleConfig, Slot, SlotStatus};
use crate::time::overlaps;

/// Candidate slots for `date` derived from the working-hours profile.
///
/// Slots sit on a grid starting at `working_hours.start` and stepping by
/// `slot_duration_minutes`. A slot is dropped when it overlaps the enabled
/// break window, and generation stops at the first slot that would end after
/// `working_hours.end` (trailing remainders are never shortened). Non-working
/// days yield nothing. Buffers are not applied here.
pub fn generate_slots(config: &ScheduleConfig, date: NaiveDate) -> Vec<Slot> {
    if !config.works_on(date.weekday()) || config.slot_duration_minutes == 0 {
        return Vec::new();
    }

    let hours = config.working_hours;
    let break_window = config.break_window;
    let modes = config.consultation_modes.enabled();
    let mut slots = Vec::new();
    let mut start = hours.start;

    while let Some(end) = start.add_minutes(config.slot_duration_minutes) {
        if end > hours.end {
            break;
        }
        let in_break =
            break_window.enabled && overlaps(start, end, break_window.start, break_window.end);
        if in_break {
            trace!("Skipping {}-{} on {}: overlaps break", start, end, date);
        } else {
            slots.push(Slot {
                date,
                start,
                end,
                status: SlotStatus::Available,
                available_modes: modes.clone(),
                occupying_appointment_id: None,
                block_reason: None,
            });
        }
        start = end;
    }

    slots
}
