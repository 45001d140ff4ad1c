// --- File: crates/carecal_schedule/src/unavailability.rs ---
//! Evaluates unavailability rules against a date.

use chrono::{Datelike, NaiveDate};

use crate::models::{ConsultationMode, RecurrencePattern, RuleKind, UnavailabilityRule};
use crate::time::MinuteSpan;

/// The interval `rule` blocks on `date`, ignoring consultation modes.
/// `None` when the rule does not apply to that date.
pub fn rule_interval(rule: &UnavailabilityRule, date: NaiveDate) -> Option<MinuteSpan> {
    match &rule.kind {
        RuleKind::FullDayRange {
            start_date,
            end_date,
        } => (*start_date <= date && date <= *end_date).then(MinuteSpan::whole_day),
        RuleKind::TimeRange {
            start_date,
            end_date,
            start_time,
            end_time,
        } => {
            if *start_date <= date && date <= *end_date {
                MinuteSpan::between(*start_time, *end_time)
            } else {
                None
            }
        }
        RuleKind::Recurring {
            pattern,
            start_time,
            end_time,
            until_date,
        } => {
            if date > *until_date {
                return None;
            }
            let matches_day = match pattern {
                RecurrencePattern::Weekly { days_of_week } => {
                    days_of_week.contains(&date.weekday())
                }
                RecurrencePattern::Monthly { day_of_month } => {
                    *day_of_month == Some(date.day())
                }
            };
            if matches_day {
                MinuteSpan::between(*start_time, *end_time)
            } else {
                None
            }
        }
    }
}

/// Sorted, disjoint intervals on `date` during which `mode` is blocked.
///
/// Any applicable rule blocks; rule order does not matter. Overlapping or
/// touching intervals are merged.
pub fn blocked_intervals<'a, I>(rules: I, date: NaiveDate, mode: ConsultationMode) -> Vec<MinuteSpan>
where
    I: IntoIterator<Item = &'a UnavailabilityRule>,
{
    let spans = rules
        .into_iter()
        .filter(|rule| rule.affects(mode))
        .filter_map(|rule| rule_interval(rule, date))
        .collect();
    merge_spans(spans)
}

/// Unions spans into sorted, disjoint ones.
pub fn merge_spans(mut spans: Vec<MinuteSpan>) -> Vec<MinuteSpan> {
    spans.sort();
    let mut merged: Vec<MinuteSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Whether `span` intersects any of the (sorted, disjoint) `blocked` spans.
pub fn is_blocked(blocked: &[MinuteSpan], span: &MinuteSpan) -> bool {
    blocked
        .iter()
        .take_while(|b| b.start < span.end)
        .any(|b| b.overlaps(span))
}
