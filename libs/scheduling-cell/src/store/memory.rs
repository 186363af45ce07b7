// libs/scheduling-cell/src/store/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{truncate_to_minute, Appointment, AvailabilityRule};

use super::{ConstraintKind, SchedulingStore, StoreError};

#[derive(Default)]
struct State {
    appointments: HashMap<Uuid, Appointment>,
    availability: HashMap<(Uuid, NaiveDate), AvailabilityRule>,
}

/// Reference backend used by the test suite and by embedders that do not
/// bring their own database.
///
/// A single write lock spans the constraint check and the row write, so the
/// (doctor_id, scheduled_for) uniqueness is decided atomically per commit —
/// the same guarantee a relational unique index gives concurrent writers.
/// Unassigned rows (`doctor_id: None`) are exempt, the way NULLs are in a
/// relational unique index.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_taken(state: &State, doctor_id: Uuid, when: NaiveDateTime, exclude: Option<Uuid>) -> bool {
        state.appointments.values().any(|existing| {
            existing.doctor_id == Some(doctor_id)
                && existing.scheduled_for == when
                && existing.status.occupies_slot()
                && exclude != Some(existing.id)
        })
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn upsert_availability(&self, rule: AvailabilityRule) -> Result<AvailabilityRule, StoreError> {
        let mut state = self.inner.write().await;
        state.availability.insert((rule.doctor_id, rule.day), rule.clone());
        Ok(rule)
    }

    async fn delete_availability(&self, doctor_id: Uuid, day: NaiveDate) -> Result<(), StoreError> {
        let mut state = self.inner.write().await;
        state.availability.remove(&(doctor_id, day));
        Ok(())
    }

    async fn availability_for_day(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<AvailabilityRule>, StoreError> {
        let state = self.inner.read().await;
        Ok(state.availability.get(&(doctor_id, day)).cloned())
    }

    async fn availability_in_range(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let state = self.inner.read().await;
        let mut rules: Vec<AvailabilityRule> = state
            .availability
            .values()
            .filter(|rule| rule.doctor_id == doctor_id && rule.day >= from && rule.day <= to)
            .cloned()
            .collect();
        rules.sort_by_key(|rule| rule.day);
        Ok(rules)
    }

    async fn insert_appointment(&self, mut appointment: Appointment) -> Result<Appointment, StoreError> {
        appointment.scheduled_for = truncate_to_minute(appointment.scheduled_for);
        let mut state = self.inner.write().await;
        if let Some(doctor_id) = appointment.doctor_id {
            if appointment.status.occupies_slot()
                && Self::slot_taken(&state, doctor_id, appointment.scheduled_for, None)
            {
                return Err(StoreError::UniqueViolation(ConstraintKind::DoctorSlot));
            }
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, mut appointment: Appointment) -> Result<Appointment, StoreError> {
        appointment.scheduled_for = truncate_to_minute(appointment.scheduled_for);
        let mut state = self.inner.write().await;
        if !state.appointments.contains_key(&appointment.id) {
            return Err(StoreError::NotFound);
        }
        if let Some(doctor_id) = appointment.doctor_id {
            if appointment.status.occupies_slot()
                && Self::slot_taken(&state, doctor_id, appointment.scheduled_for, Some(appointment.id))
            {
                return Err(StoreError::UniqueViolation(ConstraintKind::DoctorSlot));
            }
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn appointment_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let state = self.inner.read().await;
        Ok(state.appointments.get(&id).cloned())
    }

    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError> {
        let state = self.inner.read().await;
        let mut rows: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.doctor_id == Some(doctor_id) && a.scheduled_for >= from && a.scheduled_for < to)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.scheduled_for);
        Ok(rows)
    }

    async fn patient_appointments_between(
        &self,
        patient_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError> {
        let state = self.inner.read().await;
        let mut rows: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id && a.scheduled_for >= from && a.scheduled_for < to)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.scheduled_for);
        Ok(rows)
    }
}
