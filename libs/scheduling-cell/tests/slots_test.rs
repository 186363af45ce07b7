use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use scheduling_cell::models::AvailabilityRule;
use scheduling_cell::services::generate_free_slots;

fn hhmm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn rule(start: (u32, u32), end: (u32, u32), slot_minutes: u32) -> AvailabilityRule {
    AvailabilityRule {
        doctor_id: Uuid::new_v4(),
        day: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        start_time: hhmm(start.0, start.1),
        end_time: hhmm(end.0, end.1),
        slot_minutes,
    }
}

#[test]
fn full_working_day_produces_sixteen_half_hour_slots() {
    let rule = rule((9, 0), (17, 0), 30);
    let slots = generate_free_slots(Some(&rule), &HashSet::new(), 30);

    assert_eq!(slots.len(), 16);
    assert_eq!(slots.first(), Some(&hhmm(9, 0)));
    assert_eq!(slots.last(), Some(&hhmm(16, 30)));
}

#[test]
fn slots_follow_the_grid_arithmetic() {
    let rule = rule((9, 0), (17, 0), 30);
    let slots = generate_free_slots(Some(&rule), &HashSet::new(), 30);

    for (k, slot) in slots.iter().enumerate() {
        let expected_minutes = 9 * 60 + (k as u32) * 30;
        assert_eq!(*slot, hhmm(expected_minutes / 60, expected_minutes % 60));
        assert!(*slot < rule.end_time);
    }
    assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn busy_times_are_skipped() {
    let rule = rule((9, 0), (11, 0), 30);
    let busy: HashSet<NaiveTime> = [hhmm(9, 30), hhmm(10, 30)].into_iter().collect();
    let slots = generate_free_slots(Some(&rule), &busy, 30);

    assert_eq!(slots, vec![hhmm(9, 0), hhmm(10, 0)]);
}

#[test]
fn missing_rule_yields_nothing() {
    assert!(generate_free_slots(None, &HashSet::new(), 30).is_empty());
}

#[test]
fn empty_or_inverted_window_yields_nothing() {
    let inverted = rule((17, 0), (9, 0), 30);
    assert!(generate_free_slots(Some(&inverted), &HashSet::new(), 30).is_empty());

    let empty = rule((9, 0), (9, 0), 30);
    assert!(generate_free_slots(Some(&empty), &HashSet::new(), 30).is_empty());
}

#[test]
fn zero_granularity_falls_back_to_default_and_terminates() {
    let rule = rule((9, 0), (17, 0), 0);
    let slots = generate_free_slots(Some(&rule), &HashSet::new(), 30);
    assert_eq!(slots.len(), 16);
}

#[test]
fn zero_granularity_with_zero_default_still_terminates() {
    let rule = rule((9, 0), (9, 5), 0);
    // Degenerate configuration: the step clamps to one minute.
    let slots = generate_free_slots(Some(&rule), &HashSet::new(), 0);
    assert_eq!(slots.len(), 5);
}

#[test]
fn odd_granularity_stays_inside_the_window() {
    let rule = rule((9, 0), (9, 30), 7);
    let slots = generate_free_slots(Some(&rule), &HashSet::new(), 30);
    assert_eq!(
        slots,
        vec![hhmm(9, 0), hhmm(9, 7), hhmm(9, 14), hhmm(9, 21), hhmm(9, 28)]
    );
}

#[test]
fn output_is_deterministic() {
    let rule = rule((8, 15), (12, 45), 20);
    let busy: HashSet<NaiveTime> = [hhmm(8, 55)].into_iter().collect();
    assert_eq!(
        generate_free_slots(Some(&rule), &busy, 30),
        generate_free_slots(Some(&rule), &busy, 30)
    );
}
