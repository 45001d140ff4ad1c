#[cfg(test)]
mod tests {
    use crate::generator::generate_slots;
    use crate::logic::compose_day;
    use crate::models::{
        Appointment, AppointmentStatus, BreakWindow, ConsultationMode, ConsultationModes,
        RuleKind, ScheduleConfig, SlotStatus, UnavailabilityRule, WorkingHours,
    };
    use crate::time::{overlaps, parse_date, TimeOfDay};
    use chrono::{NaiveDate, Weekday};
    use proptest::prelude::*;

    fn monday() -> NaiveDate {
        parse_date("2025-01-06").unwrap()
    }

    fn minutes_to_time(minutes: u32) -> Option<TimeOfDay> {
        TimeOfDay::from_hm(minutes / 60, minutes % 60)
    }

    // Working day [start_hour, end_hour) with an optional break starting at 12:00.
    fn build_config(
        start_hour: u32,
        end_hour: u32,
        slot_minutes: u32,
        break_minutes: Option<u32>,
        buffer_minutes: u32,
    ) -> ScheduleConfig {
        let noon = TimeOfDay::from_hm(12, 0).unwrap();
        let break_window = match break_minutes {
            Some(len) => BreakWindow {
                enabled: true,
                start: noon,
                end: noon.add_minutes(len).unwrap(),
            },
            None => BreakWindow::disabled(),
        };
        ScheduleConfig {
            working_days: vec![Weekday::Mon],
            working_hours: WorkingHours {
                start: TimeOfDay::from_hm(start_hour, 0).unwrap(),
                end: TimeOfDay::from_hm(end_hour, 0).unwrap(),
            },
            slot_duration_minutes: slot_minutes,
            buffer_minutes,
            break_window,
            consultation_modes: ConsultationModes {
                online: true,
                offline: true,
            },
        }
    }

    fn appointments_on_grid(config: &ScheduleConfig, indices: &[u32]) -> Vec<Appointment> {
        let origin = u32::from(config.working_hours.start.minutes_since_midnight());
        indices
            .iter()
            .filter_map(|index| {
                let start = minutes_to_time(origin + index * config.slot_duration_minutes)?;
                Some(Appointment {
                    id: format!("apt-{index}"),
                    date: monday(),
                    start_time: start,
                    duration_minutes: config.slot_duration_minutes,
                    mode: ConsultationMode::Online,
                    status: AppointmentStatus::Confirmed,
                })
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_slots_are_disjoint_and_exact(
            start_hour in 0..12u32,
            end_hour in 13..24u32,
            slot_minutes in 5..120u32,
            break_minutes in proptest::option::of(15..60u32),
        ) {
            let config = build_config(start_hour, end_hour.min(23), slot_minutes, break_minutes, 0);
            let slots = generate_slots(&config, monday());

            for slot in &slots {
                let len = slot.end.minutes_since_midnight() - slot.start.minutes_since_midnight();
                prop_assert_eq!(u32::from(len), slot_minutes);
                prop_assert!(slot.start >= config.working_hours.start);
                prop_assert!(slot.end <= config.working_hours.end);
            }
            for pair in slots.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        #[test]
        fn test_no_slot_touches_break(
            start_hour in 0..12u32,
            end_hour in 13..24u32,
            slot_minutes in 5..120u32,
            break_minutes in 15..60u32,
        ) {
            let config = build_config(start_hour, end_hour.min(23), slot_minutes, Some(break_minutes), 0);
            let brk = config.break_window;
            for slot in generate_slots(&config, monday()) {
                prop_assert!(!overlaps(slot.start, slot.end, brk.start, brk.end));
            }
        }

        #[test]
        fn test_buffer_after_booking_is_never_available(
            slot_minutes in 10..90u32,
            buffer_minutes in 1..90u32,
            indices in proptest::collection::vec(0..20u32, 0..6),
        ) {
            let config = build_config(8, 20, slot_minutes, Some(30), buffer_minutes);
            let appointments = appointments_on_grid(&config, &indices);
            let day = compose_day(monday(), &config, &appointments, &[]);

            for booked in day.slots.iter().filter(|s| s.status == SlotStatus::Booked) {
                let gap_start = booked.end.minutes_since_midnight();
                let gap_end = u32::from(gap_start) + buffer_minutes;
                for slot in day.slots.iter().filter(|s| s.is_available()) {
                    let span = slot.span();
                    prop_assert!(!overlaps(u32::from(span.start), u32::from(span.end), u32::from(gap_start), gap_end));
                }
            }
        }

        #[test]
        fn test_compose_is_deterministic(
            slot_minutes in 10..90u32,
            buffer_minutes in 0..30u32,
            indices in proptest::collection::vec(0..20u32, 0..6),
            block_start in 8..17u32,
            online_only in any::<bool>(),
        ) {
            let config = build_config(8, 18, slot_minutes, None, buffer_minutes);
            let appointments = appointments_on_grid(&config, &indices);
            let rules = vec![UnavailabilityRule {
                id: "block".to_string(),
                kind: RuleKind::TimeRange {
                    start_date: monday(),
                    end_date: monday(),
                    start_time: TimeOfDay::from_hm(block_start, 0).unwrap(),
                    end_time: TimeOfDay::from_hm(block_start + 1, 0).unwrap(),
                },
                affects_online: true,
                affects_offline: !online_only,
                reason: None,
            }];

            let first = compose_day(monday(), &config, &appointments, &rules);
            let second = compose_day(monday(), &config, &appointments, &rules);
            prop_assert_eq!(&first, &second);

            // Composition never invents or drops slots.
            prop_assert_eq!(first.slots.len(), generate_slots(&config, monday()).len());
        }

        #[test]
        fn test_non_working_day_always_empty(
            start_hour in 0..12u32,
            slot_minutes in 5..120u32,
        ) {
            let config = build_config(start_hour, 18, slot_minutes, None, 0);
            // 2025-01-07 is a Tuesday; only Monday is a working day here.
            let tuesday = parse_date("2025-01-07").unwrap();
            prop_assert!(compose_day(tuesday, &config, &[], &[]).slots.is_empty());
        }
    }
}
