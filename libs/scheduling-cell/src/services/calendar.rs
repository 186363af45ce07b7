// libs/scheduling-cell/src/services/calendar.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use shared_config::SchedulingConfig;

use crate::models::{DayAvailability, SchedulingError};
use crate::store::SchedulingStore;

use super::{clamp_day_window, generate_free_slots};

/// Aggregates per-day availability over a bounded date range, for calendar
/// pickers.
pub struct CalendarService {
    store: Arc<dyn SchedulingStore>,
    config: SchedulingConfig,
}

impl CalendarService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    /// One entry per day in the (normalized, capped) window.
    ///
    /// Days without a rule report `available: false`; days whose rule is fully
    /// booked report `available: true, free: 0`. The whole window costs one
    /// availability query and one appointment query.
    pub async fn availability_calendar(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayAvailability>, SchedulingError> {
        let (d0, d1) = clamp_day_window(start, end, self.config.max_calendar_days);
        debug!("Building availability calendar for doctor {} over {}..{}", doctor_id, d0, d1);

        let rules = self.store.availability_in_range(doctor_id, d0, d1).await?;
        let rule_by_day: HashMap<NaiveDate, _> =
            rules.into_iter().map(|rule| (rule.day, rule)).collect();

        let from = d0.and_time(NaiveTime::MIN);
        let to = (d1 + Duration::days(1)).and_time(NaiveTime::MIN);
        let appointments = self.store.doctor_appointments_between(doctor_id, from, to).await?;

        let mut busy_by_day: HashMap<NaiveDate, HashSet<NaiveTime>> = HashMap::new();
        for appointment in appointments.iter().filter(|a| a.status.occupies_slot()) {
            busy_by_day
                .entry(appointment.scheduled_for.date())
                .or_default()
                .insert(appointment.scheduled_for.time());
        }

        let no_busy = HashSet::new();
        let mut calendar = Vec::new();
        let mut day = d0;
        while day <= d1 {
            match rule_by_day.get(&day) {
                None => calendar.push(DayAvailability {
                    date: day,
                    available: false,
                    free: 0,
                }),
                Some(rule) => {
                    let busy = busy_by_day.get(&day).unwrap_or(&no_busy);
                    let free =
                        generate_free_slots(Some(rule), busy, self.config.default_slot_minutes).len();
                    calendar.push(DayAvailability {
                        date: day,
                        available: true,
                        free,
                    });
                }
            }
            day = day + Duration::days(1);
        }
        Ok(calendar)
    }

    /// Days that are bookable: a rule exists and at least one slot is free.
    pub async fn available_dates(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SchedulingError> {
        let calendar = self.availability_calendar(doctor_id, start, end).await?;
        Ok(calendar
            .into_iter()
            .filter(|day| day.available && day.free > 0)
            .map(|day| day.date)
            .collect())
    }

    pub async fn dates_with_counts(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, usize)>, SchedulingError> {
        let calendar = self.availability_calendar(doctor_id, start, end).await?;
        Ok(calendar
            .into_iter()
            .filter(|day| day.available && day.free > 0)
            .map(|day| (day.date, day.free))
            .collect())
    }
}
