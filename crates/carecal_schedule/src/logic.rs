// --- File: crates/carecal_schedule/src/logic.rs ---
//! Availability composition: generated slots + appointments + unavailability
//! rules → one resolved schedule per day.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Result, ScheduleError};
use crate::generator::generate_slots;
use crate::models::{
    Appointment, AppointmentRecord, BlockReason, ConsultationMode, DaySchedule, Diagnostic,
    DiagnosticKind, ScheduleConfig, Slot, SlotStatus, UnavailabilityRule,
};
use crate::time::{MinuteSpan, TimeOfDay, MINUTES_PER_DAY};
use crate::unavailability::{blocked_intervals, is_blocked};

/// Longest date range a single range query may cover.
pub const MAX_RANGE_DAYS: i64 = 92;

/// Parses raw appointment records one by one. Malformed records are left out
/// and reported instead of failing the whole batch.
pub fn parse_appointments(records: &[AppointmentRecord]) -> (Vec<Appointment>, Vec<Diagnostic>) {
    let mut appointments = Vec::with_capacity(records.len());
    let mut diagnostics = Vec::new();
    for record in records {
        match Appointment::try_from(record) {
            Ok(appointment) => appointments.push(appointment),
            Err(err) => {
                warn!("Skipping appointment record {}: {}", record.id, err);
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Appointment,
                    record_id: record.id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    (appointments, diagnostics)
}

/// Splits rules into those safe to evaluate and diagnostics for the rest.
pub fn usable_rules(rules: &[UnavailabilityRule]) -> (Vec<&UnavailabilityRule>, Vec<Diagnostic>) {
    let mut usable = Vec::with_capacity(rules.len());
    let mut diagnostics = Vec::new();
    for rule in rules {
        match rule.validate() {
            Ok(()) => usable.push(rule),
            Err(err) => {
                warn!("Skipping unavailability rule {}: {}", rule.id, err);
                diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Rule,
                    record_id: rule.id.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    (usable, diagnostics)
}

/// Composes the final slot list for one date.
///
/// Per slot, first match wins:
/// 1. blocked for every supported mode → `blocked` (unavailable); blocked for
///    only some modes narrows `available_modes` instead
/// 2. overlapped by a confirmed or pending appointment's
///    `[start, start + duration)` → `booked`
/// 3. otherwise `available`
///
/// Available slots overlapping the `buffer_minutes` after an appointment's
/// end, or after a booked slot's end, are then blocked with reason `buffer`.
/// Pure: identical inputs give identical output.
pub fn compose_day(
    date: NaiveDate,
    config: &ScheduleConfig,
    appointments: &[Appointment],
    rules: &[UnavailabilityRule],
) -> DaySchedule {
    let (rules, mut diagnostics) = usable_rules(rules);
    let mut slots = generate_slots(config, date);
    if slots.is_empty() {
        return DaySchedule {
            date,
            slots,
            diagnostics,
        };
    }

    let blocked: Vec<(ConsultationMode, Vec<MinuteSpan>)> = config
        .consultation_modes
        .enabled()
        .into_iter()
        .map(|mode| (mode, blocked_intervals(rules.iter().copied(), date, mode)))
        .collect();

    let bookings = active_bookings(date, appointments, &mut diagnostics);
    report_off_grid(&slots, &bookings, &mut diagnostics);

    for slot in slots.iter_mut() {
        let span = slot.span();
        let open_modes: Vec<ConsultationMode> = blocked
            .iter()
            .filter(|(_, spans)| !is_blocked(spans, &span))
            .map(|(mode, _)| *mode)
            .collect();

        if open_modes.is_empty() {
            slot.status = SlotStatus::Blocked;
            slot.block_reason = Some(BlockReason::Unavailable);
            slot.available_modes.clear();
        } else if let Some(booking) = bookings.iter().find(|b| b.span.overlaps(&span)) {
            slot.status = SlotStatus::Booked;
            slot.occupying_appointment_id = Some(booking.appointment.id.clone());
            slot.available_modes.clear();
        } else {
            slot.available_modes = open_modes;
        }
    }

    if config.buffer_minutes > 0 {
        // The gap follows both the appointment itself and every slot it booked.
        let buffers: Vec<MinuteSpan> = bookings
            .iter()
            .map(|booking| booking.span.end)
            .chain(
                slots
                    .iter()
                    .filter(|slot| slot.status == SlotStatus::Booked)
                    .map(|slot| slot.end.minutes_since_midnight()),
            )
            .filter_map(|start| buffer_after(start, config.buffer_minutes))
            .collect();

        for slot in slots.iter_mut().filter(|slot| slot.is_available()) {
            if buffers.iter().any(|buffer| buffer.overlaps(&slot.span())) {
                slot.status = SlotStatus::Blocked;
                slot.block_reason = Some(BlockReason::Buffer);
                slot.available_modes.clear();
            }
        }
    }

    debug!(
        "Composed {} slots for {} ({} booked, {} blocked, {} diagnostics)",
        slots.len(),
        date,
        slots.iter().filter(|s| s.status == SlotStatus::Booked).count(),
        slots.iter().filter(|s| s.status == SlotStatus::Blocked).count(),
        diagnostics.len()
    );

    DaySchedule {
        date,
        slots,
        diagnostics,
    }
}

/// An active appointment and the minutes it occupies on the composed date.
struct Booking<'a> {
    appointment: &'a Appointment,
    span: MinuteSpan,
}

fn buffer_after(start: u16, buffer_minutes: u32) -> Option<MinuteSpan> {
    let end = (u32::from(start) + buffer_minutes).min(u32::from(MINUTES_PER_DAY)) as u16;
    MinuteSpan::new(start, end)
}

/// Confirmed and pending appointments on `date`, ordered by start then id.
///
/// Every appointment occupies `[start, start + duration)`, cut at midnight.
/// An appointment overlapping an earlier one is reported as a double booking;
/// it still occupies its time, but overlapped slots name the earlier one.
fn active_bookings<'a>(
    date: NaiveDate,
    appointments: &'a [Appointment],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Booking<'a>> {
    let mut active: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.date == date && a.status.occupies_slot())
        .collect();
    active.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

    let mut bookings: Vec<Booking<'a>> = Vec::with_capacity(active.len());
    for appointment in active {
        let start = appointment.start_time.minutes_since_midnight();
        let end = (u32::from(start) + appointment.duration_minutes)
            .min(u32::from(MINUTES_PER_DAY)) as u16;
        let Some(span) = MinuteSpan::new(start, end) else {
            continue;
        };
        if let Some(existing) = bookings.iter().find(|b| b.span.overlaps(&span)) {
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::Appointment,
                record_id: appointment.id.clone(),
                message: format!(
                    "double booking at {} {}, overlaps {}",
                    date, appointment.start_time, existing.appointment.id
                ),
            });
        }
        bookings.push(Booking { appointment, span });
    }
    bookings
}

/// Appointments that do not start on a slot boundary still occupy every slot
/// they overlap, but are reported so the booking side can be corrected.
fn report_off_grid(slots: &[Slot], bookings: &[Booking<'_>], diagnostics: &mut Vec<Diagnostic>) {
    let starts: HashSet<TimeOfDay> = slots.iter().map(|slot| slot.start).collect();
    for booking in bookings {
        let appointment = booking.appointment;
        if !starts.contains(&appointment.start_time) {
            warn!(
                "Appointment {} at {} {} is off the slot grid",
                appointment.id, appointment.date, appointment.start_time
            );
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::Appointment,
                record_id: appointment.id.clone(),
                message: format!(
                    "start {} is not on the slot grid; overlapping slots are booked",
                    appointment.start_time
                ),
            });
        }
    }
}

/// Number of days in `start..=end`, rejecting inverted or oversized ranges.
pub fn range_len(start: NaiveDate, end: NaiveDate) -> Result<usize> {
    if start > end {
        return Err(ScheduleError::InvalidRange(format!(
            "start date {start} is after end date {end}"
        )));
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(ScheduleError::InvalidRange(format!(
            "range of {days} days exceeds the {MAX_RANGE_DAYS} day limit"
        )));
    }
    Ok(days as usize)
}

/// Composes every day from `start` to `end` inclusive, each independently.
pub fn compose_range(
    start: NaiveDate,
    end: NaiveDate,
    config: &ScheduleConfig,
    appointments: &[Appointment],
    rules: &[UnavailabilityRule],
) -> Result<Vec<DaySchedule>> {
    let days = range_len(start, end)?;
    Ok(start
        .iter_days()
        .take(days)
        .map(|date| compose_day(date, config, appointments, rules))
        .collect())
}

/// [`compose_day`] over raw appointment records; parse failures are added to
/// the day's diagnostics.
pub fn compose_from_records(
    date: NaiveDate,
    config: &ScheduleConfig,
    records: &[AppointmentRecord],
    rules: &[UnavailabilityRule],
) -> DaySchedule {
    let (appointments, parse_diagnostics) = parse_appointments(records);
    let mut day = compose_day(date, config, &appointments, rules);
    let mut diagnostics = parse_diagnostics;
    diagnostics.append(&mut day.diagnostics);
    day.diagnostics = diagnostics;
    day
}
