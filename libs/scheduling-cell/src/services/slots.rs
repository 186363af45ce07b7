// libs/scheduling-cell/src/services/slots.rs
use std::collections::HashSet;

use chrono::{NaiveTime, Timelike};

use crate::models::AvailabilityRule;

/// Expand an availability rule into the ordered free slot start-times for one
/// day.
///
/// Pure and deterministic: no clock access, identical inputs give identical
/// output. A missing rule yields an empty list, which callers must keep
/// distinct from "rule present, zero free slots".
pub fn generate_free_slots(
    rule: Option<&AvailabilityRule>,
    busy: &HashSet<NaiveTime>,
    default_slot_minutes: u32,
) -> Vec<NaiveTime> {
    let Some(rule) = rule else {
        return Vec::new();
    };

    let start = minutes_since_midnight(rule.start_time);
    let end = minutes_since_midnight(rule.end_time);
    if end <= start {
        return Vec::new();
    }

    let step = rule.effective_slot_minutes(default_slot_minutes).max(1);

    // Iteration cap independent of the step size, so the walk terminates even
    // if a caller bypassed the granularity coercion.
    let max_iters = (end - start) + 2;
    let mut iters = 0;

    let mut slots = Vec::new();
    let mut cursor = start;
    while cursor < end && iters < max_iters {
        if let Some(slot) = time_from_minutes(cursor) {
            if !busy.contains(&slot) {
                slots.push(slot);
            }
        }
        cursor += step;
        iters += 1;
    }
    slots
}

// Minute arithmetic stays in integers: NaiveTime addition wraps at midnight,
// which would break both the ordering and the termination condition.
fn minutes_since_midnight(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}
