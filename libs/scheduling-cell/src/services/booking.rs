// libs/scheduling-cell/src/services/booking.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;

use crate::models::{
    parse_hhmm, truncate_to_minute, Appointment, AppointmentStatus, SchedulingError,
};
use crate::store::{ConstraintKind, SchedulingStore, StoreError};

use super::generate_free_slots;
use super::notifications::ReceptionNotifier;

/// The orchestrator: every appointment mutation goes through here.
///
/// Validation is optimistic — the pre-checks read the current ledger without
/// holding any lock, and the store's uniqueness constraint settles the race
/// when two writers pass the pre-checks for the same slot. The loser's commit
/// failure is translated back into the matching domain error.
pub struct AppointmentBookingService {
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<dyn ReceptionNotifier>,
    config: SchedulingConfig,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<dyn ReceptionNotifier>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    // ==========================================================================
    // READ SIDE
    // ==========================================================================

    /// Free slot start-times for the doctor on a calendar day. Empty when no
    /// rule exists for that day.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let rule = self.store.availability_for_day(doctor_id, day).await?;
        let busy = self.busy_times_for(doctor_id, day, None).await?;
        Ok(generate_free_slots(rule.as_ref(), &busy, self.config.default_slot_minutes))
    }

    /// `available_slots` restricted to slots strictly after `cutoff`. The
    /// cutoff is explicit so the result stays deterministic; callers pass
    /// their notion of "now" when hiding already-elapsed slots.
    pub async fn available_slots_after(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let slots = self.available_slots(doctor_id, day).await?;
        Ok(slots
            .into_iter()
            .filter(|slot| day.and_time(*slot) > cutoff)
            .collect())
    }

    /// All of a patient's appointments, most recent first.
    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut rows = self
            .store
            .patient_appointments_between(patient_id, NaiveDateTime::MIN, NaiveDateTime::MAX)
            .await?;
        rows.reverse();
        Ok(rows)
    }

    /// A doctor's appointments on one calendar day, ascending.
    pub async fn appointments_for_doctor_on(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (from, to) = day_bounds(day);
        Ok(self.store.doctor_appointments_between(doctor_id, from, to).await?)
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    /// Book a concrete doctor/time. Fail-fast validation order: slot grid
    /// membership, duplicate-same-day, exact-time conflict, then the commit
    /// itself (whose constraint is the final arbiter of the exact-time rule).
    pub async fn book(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        when: NaiveDateTime,
        reason: &str,
    ) -> Result<Appointment, SchedulingError> {
        let when = truncate_to_minute(when);
        let day = when.date();
        debug!("Booking patient {} with doctor {} at {}", patient_id, doctor_id, when);

        self.ensure_on_slot_grid(doctor_id, day, when.time()).await?;
        self.ensure_no_same_day_duplicate(patient_id, doctor_id, day, None).await?;
        self.ensure_slot_unclaimed(doctor_id, when, None).await?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: Some(doctor_id),
            scheduled_for: when,
            reason: reason.to_string(),
            status: AppointmentStatus::Booked,
        };
        let saved = self
            .store
            .insert_appointment(appointment)
            .await
            .map_err(translate_commit_error)?;

        info!("Appointment {} booked with doctor {} at {}", saved.id, doctor_id, when);
        Ok(saved)
    }

    /// Book using an `HH:MM` slot label on a calendar day.
    pub async fn book_at_slot(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        day: NaiveDate,
        slot_hhmm: &str,
        reason: &str,
    ) -> Result<Appointment, SchedulingError> {
        let slot = parse_hhmm(slot_hhmm)?;
        self.book(patient_id, doctor_id, day.and_time(slot), reason).await
    }

    /// Move an existing appointment to a new slot, re-running the booking
    /// checks with the appointment's own row excluded so an adjacent slot on
    /// the same day is not self-blocked.
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_when: NaiveDateTime,
    ) -> Result<(), SchedulingError> {
        let new_when = truncate_to_minute(new_when);
        let Some(appointment) = self.store.appointment_by_id(appointment_id).await? else {
            return Err(SchedulingError::AppointmentNotFound);
        };
        if appointment.status.is_terminal() {
            return Err(SchedulingError::AppointmentNotFound);
        }
        // A request that was never assigned has no availability window to
        // validate against.
        let Some(doctor_id) = appointment.doctor_id else {
            return Err(SchedulingError::SlotNotAvailable);
        };

        let day = new_when.date();
        self.ensure_on_slot_grid(doctor_id, day, new_when.time()).await?;
        self.ensure_no_same_day_duplicate(appointment.patient_id, doctor_id, day, Some(appointment_id))
            .await?;
        self.ensure_slot_unclaimed(doctor_id, new_when, Some(appointment_id)).await?;

        let mut updated = appointment;
        updated.scheduled_for = new_when;
        updated.status = AppointmentStatus::Booked;
        self.store
            .update_appointment(updated)
            .await
            .map_err(translate_commit_error)?;

        info!("Appointment {} rescheduled to {}", appointment_id, new_when);
        Ok(())
    }

    /// Cancel an appointment. Uniform policy: missing rows and rows already
    /// in a terminal status are a silent no-op, so repeated cancels are safe.
    pub async fn cancel(&self, appointment_id: Uuid) -> Result<(), SchedulingError> {
        match self.store.appointment_by_id(appointment_id).await? {
            None => {
                debug!("Cancel for unknown appointment {} ignored", appointment_id);
                Ok(())
            }
            Some(appointment) if appointment.status.is_terminal() => {
                debug!(
                    "Cancel for {} appointment {} ignored",
                    appointment.status, appointment_id
                );
                Ok(())
            }
            Some(mut appointment) => {
                appointment.status = AppointmentStatus::Cancelled;
                self.store.update_appointment(appointment).await?;
                info!("Appointment {} cancelled", appointment_id);
                Ok(())
            }
        }
    }

    /// Record a provisional request, optionally pinned to a doctor. Only the
    /// exact-time check applies: a request is not yet bound to an
    /// availability window, and the same-day rule only counts firm bookings.
    pub async fn create_request(
        &self,
        patient_id: Uuid,
        when: NaiveDateTime,
        reason: &str,
        doctor_id: Option<Uuid>,
    ) -> Result<Appointment, SchedulingError> {
        let when = truncate_to_minute(when);
        if let Some(doctor_id) = doctor_id {
            self.ensure_slot_unclaimed(doctor_id, when, None).await?;
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            scheduled_for: when,
            reason: reason.to_string(),
            status: AppointmentStatus::Requested,
        };
        let saved = self
            .store
            .insert_appointment(appointment)
            .await
            .map_err(translate_commit_error)?;
        info!("Appointment request {} created for patient {}", saved.id, patient_id);

        // Best-effort: the request is already committed, a broken sink must
        // not unwind it.
        if let Err(err) = self.notifier.notify_receptionists_about_request(&saved).await {
            warn!("Reception notification for appointment {} failed: {:#}", saved.id, err);
        }
        Ok(saved)
    }

    /// Triage a request into a firm booking: assign the doctor and time and
    /// move `requested -> booked` under the full booking checks.
    pub async fn assign(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        when: NaiveDateTime,
    ) -> Result<Appointment, SchedulingError> {
        let when = truncate_to_minute(when);
        let Some(appointment) = self.store.appointment_by_id(appointment_id).await? else {
            return Err(SchedulingError::AppointmentNotFound);
        };
        if !appointment.status.can_transition_to(AppointmentStatus::Booked) {
            return Err(SchedulingError::InvalidStatusTransition {
                from: appointment.status,
                to: AppointmentStatus::Booked,
            });
        }

        let day = when.date();
        self.ensure_on_slot_grid(doctor_id, day, when.time()).await?;
        self.ensure_no_same_day_duplicate(appointment.patient_id, doctor_id, day, Some(appointment_id))
            .await?;
        self.ensure_slot_unclaimed(doctor_id, when, Some(appointment_id)).await?;

        let mut updated = appointment;
        updated.doctor_id = Some(doctor_id);
        updated.scheduled_for = when;
        updated.status = AppointmentStatus::Booked;
        let saved = self
            .store
            .update_appointment(updated)
            .await
            .map_err(translate_commit_error)?;

        info!(
            "Appointment {} assigned to doctor {} at {}",
            appointment_id, doctor_id, when
        );
        Ok(saved)
    }

    /// Mark a booked appointment as completed (`booked -> completed`).
    pub async fn complete(&self, appointment_id: Uuid) -> Result<(), SchedulingError> {
        let Some(appointment) = self.store.appointment_by_id(appointment_id).await? else {
            return Err(SchedulingError::AppointmentNotFound);
        };
        if !appointment.status.can_transition_to(AppointmentStatus::Completed) {
            return Err(SchedulingError::InvalidStatusTransition {
                from: appointment.status,
                to: AppointmentStatus::Completed,
            });
        }

        let mut updated = appointment;
        updated.status = AppointmentStatus::Completed;
        self.store.update_appointment(updated).await?;
        info!("Appointment {} completed", appointment_id);
        Ok(())
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    /// Occupied slot times for a doctor/day, optionally ignoring one row.
    async fn busy_times_for(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<HashSet<NaiveTime>, SchedulingError> {
        let (from, to) = day_bounds(day);
        let appointments = self.store.doctor_appointments_between(doctor_id, from, to).await?;
        Ok(appointments
            .into_iter()
            .filter(|a| a.status.occupies_slot() && exclude != Some(a.id))
            .map(|a| a.scheduled_for.time())
            .collect())
    }

    /// The requested time must land on the rule's slot grid. Whether the slot
    /// is currently taken is not decided here — that is the exact-time check,
    /// which reports the more specific conflict error.
    async fn ensure_on_slot_grid(
        &self,
        doctor_id: Uuid,
        day: NaiveDate,
        slot: NaiveTime,
    ) -> Result<(), SchedulingError> {
        let rule = self.store.availability_for_day(doctor_id, day).await?;
        let grid = generate_free_slots(rule.as_ref(), &HashSet::new(), self.config.default_slot_minutes);
        if grid.contains(&slot) {
            Ok(())
        } else {
            Err(SchedulingError::SlotNotAvailable)
        }
    }

    async fn ensure_no_same_day_duplicate(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        day: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let (from, to) = day_bounds(day);
        let appointments = self.store.patient_appointments_between(patient_id, from, to).await?;
        let duplicate = appointments.iter().any(|a| {
            a.doctor_id == Some(doctor_id) && a.status.blocks_same_day() && exclude != Some(a.id)
        });
        if duplicate {
            Err(SchedulingError::DuplicateSameDayBooking)
        } else {
            Ok(())
        }
    }

    async fn ensure_slot_unclaimed(
        &self,
        doctor_id: Uuid,
        when: NaiveDateTime,
        exclude: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let appointments = self
            .store
            .doctor_appointments_between(doctor_id, when, when + Duration::minutes(1))
            .await?;
        let claimed = appointments
            .iter()
            .any(|a| a.scheduled_for == when && a.status.occupies_slot() && exclude != Some(a.id));
        if claimed {
            Err(SchedulingError::ExactTimeConflict)
        } else {
            Ok(())
        }
    }
}

fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        day.and_time(NaiveTime::MIN),
        (day + Duration::days(1)).and_time(NaiveTime::MIN),
    )
}

/// The pre-checks are a fast path; the storage constraint decides the race.
/// A violated (doctor, scheduled_for) constraint means another writer claimed
/// the slot between our read and this commit.
fn translate_commit_error(err: StoreError) -> SchedulingError {
    match err {
        StoreError::UniqueViolation(ConstraintKind::DoctorSlot) => {
            warn!("Commit rejected by storage: doctor slot already claimed by a concurrent writer");
            SchedulingError::ExactTimeConflict
        }
        other => SchedulingError::Store(other),
    }
}
