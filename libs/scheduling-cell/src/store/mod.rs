// libs/scheduling-cell/src/store/mod.rs
//
// Persistence boundary for the scheduling engine. The store is the final
// arbiter of the exact-time rule: `insert_appointment` and
// `update_appointment` must enforce, atomically at commit, that no two
// non-cancelled appointments share the same (doctor_id, scheduled_for), and
// report a violation as a typed `UniqueViolation` rather than free text.
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, AvailabilityRule};

pub mod memory;

pub use memory::InMemoryStore;

/// Identifies which storage constraint rejected a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Unique (doctor_id, scheduled_for) over non-cancelled appointments.
    DoctorSlot,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::DoctorSlot => write!(f, "uq_appointment_doctor_slot"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(ConstraintKind),

    #[error("row not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Relational store operations the engine requires.
///
/// Range queries treat `from` as inclusive and `to` as exclusive and return
/// rows ordered ascending. Timestamps are truncated to minute precision on
/// the way in.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn upsert_availability(&self, rule: AvailabilityRule) -> Result<AvailabilityRule, StoreError>;

    async fn delete_availability(&self, doctor_id: Uuid, day: NaiveDate) -> Result<(), StoreError>;

    async fn availability_for_day(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
    ) -> Result<Option<AvailabilityRule>, StoreError>;

    /// Rules for `from..=to`, ordered by day.
    async fn availability_in_range(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;

    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    /// Full-row update keyed by `appointment.id`; `NotFound` if the row is
    /// missing, `UniqueViolation` if the new state would claim a taken slot.
    async fn update_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn appointment_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn patient_appointments_between(
        &self,
        patient_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError>;
}
