// libs/scheduling-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::store::StoreError;

// ==============================================================================
// CORE SCHEDULING MODELS
// ==============================================================================

/// Per-doctor, per-calendar-day working-hours window.
///
/// At most one rule exists per (doctor, day); a second upsert for the same key
/// overwrites the first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityRule {
    pub doctor_id: Uuid,
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: u32,
}

impl AvailabilityRule {
    /// Slot granularity with the zero case coerced to a safe default, so a
    /// misconfigured rule can never stall slot generation.
    pub fn effective_slot_minutes(&self, default_slot_minutes: u32) -> u32 {
        if self.slot_minutes == 0 {
            default_slot_minutes.max(1)
        } else {
            self.slot_minutes
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// `None` while a request has not been assigned to a doctor yet.
    pub doctor_id: Option<Uuid>,
    /// Minute precision; seconds are truncated at the persistence boundary.
    pub scheduled_for: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Booked,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Terminal statuses permit no further mutation of time or status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }

    /// Whether this row claims its (doctor, scheduled_for) slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Whether this row counts against the one-per-patient-per-doctor-per-day rule.
    pub fn blocks_same_day(&self) -> bool {
        matches!(self, AppointmentStatus::Booked | AppointmentStatus::Completed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (*self, next),
            (AppointmentStatus::Requested, AppointmentStatus::Booked)
                | (AppointmentStatus::Requested, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Booked, AppointmentStatus::Completed)
                | (AppointmentStatus::Booked, AppointmentStatus::Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "requested"),
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for AppointmentStatus {
    type Err = ParseStatusError;

    /// Raw status values are parsed exactly once, at the persistence boundary;
    /// everything past that point matches on the variant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(AppointmentStatus::Requested),
            "booked" => Ok(AppointmentStatus::Booked),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// One row of the availability calendar.
///
/// `available: false` means no rule exists for the day, which is distinct from
/// a rule whose slots are all taken (`available: true, free: 0`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available: bool,
    pub free: usize,
}

// ==============================================================================
// TIME HELPERS
// ==============================================================================

/// Parse a 24-hour `HH:MM` slot label.
pub fn parse_hhmm(hhmm: &str) -> Result<NaiveTime, SchedulingError> {
    let invalid = || SchedulingError::InvalidTimeFormat(hhmm.to_string());
    let (hours, minutes) = hhmm.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Appointments are stored at minute precision.
pub fn truncate_to_minute(when: NaiveDateTime) -> NaiveDateTime {
    when.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(when)
}

// ==============================================================================
// DOMAIN ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("requested time is not available for this doctor")]
    SlotNotAvailable,

    #[error("patient already has an appointment with this doctor on this day")]
    DuplicateSameDayBooking,

    #[error("that slot is already booked for the selected doctor")]
    ExactTimeConflict,

    #[error("appointment not found")]
    AppointmentNotFound,

    #[error("invalid time format, expected 24h HH:MM: {0}")]
    InvalidTimeFormat(String),

    #[error("invalid availability range: {0}")]
    InvalidAvailabilityRange(String),

    #[error("appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
