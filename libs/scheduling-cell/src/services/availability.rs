// libs/scheduling-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::SchedulingConfig;

use crate::models::{parse_hhmm, AvailabilityRule, SchedulingError};
use crate::store::SchedulingStore;

use super::clamp_day_window;

/// Manages the per-doctor, per-day working-hours rules.
pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    config: SchedulingConfig,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    /// Upsert the rule for (doctor, day); last write wins.
    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
        start_hhmm: &str,
        end_hhmm: &str,
        slot_minutes: i32,
    ) -> Result<AvailabilityRule, SchedulingError> {
        let start_time = parse_hhmm(start_hhmm)?;
        let end_time = parse_hhmm(end_hhmm)?;
        if start_time >= end_time {
            return Err(SchedulingError::InvalidAvailabilityRange(format!(
                "working window {}-{} is empty",
                start_hhmm, end_hhmm
            )));
        }

        // A zero or negative granularity would stall slot generation; clamp
        // it instead of persisting it.
        let slot_minutes = if slot_minutes <= 0 {
            self.config.default_slot_minutes
        } else {
            slot_minutes as u32
        };

        let rule = AvailabilityRule {
            doctor_id,
            day,
            start_time,
            end_time,
            slot_minutes,
        };
        let saved = self.store.upsert_availability(rule).await?;
        info!("Availability rule saved for doctor {} on {}", doctor_id, day);
        Ok(saved)
    }

    pub async fn clear_availability(&self, doctor_id: Uuid, day: NaiveDate) -> Result<(), SchedulingError> {
        self.store.delete_availability(doctor_id, day).await?;
        debug!("Availability rule cleared for doctor {} on {}", doctor_id, day);
        Ok(())
    }

    pub async fn availability_for(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<AvailabilityRule>, SchedulingError> {
        Ok(self.store.availability_for_day(doctor_id, day).await?)
    }

    /// Rules within the window, capped at the configured maximum span.
    pub async fn availability_range(
        &self,
        doctor_id: Uuid,
        start_day: NaiveDate,
        end_day: NaiveDate,
    ) -> Result<Vec<AvailabilityRule>, SchedulingError> {
        let (d0, d1) = clamp_day_window(start_day, end_day, self.config.max_calendar_days);
        Ok(self.store.availability_in_range(doctor_id, d0, d1).await?)
    }
}
