// libs/scheduling-cell/src/services/notifications.rs
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::models::Appointment;

/// Outbound notification collaborator, called after a request has been
/// committed. Best-effort: the booking service logs failures and keeps the
/// committed appointment.
#[async_trait]
pub trait ReceptionNotifier: Send + Sync {
    async fn notify_receptionists_about_request(&self, appointment: &Appointment) -> Result<()>;
}

/// Sink for embedders with no notification fan-out wired in.
pub struct NullNotifier;

#[async_trait]
impl ReceptionNotifier for NullNotifier {
    async fn notify_receptionists_about_request(&self, appointment: &Appointment) -> Result<()> {
        debug!(
            "appointment request {} recorded, no reception sink configured",
            appointment.id
        );
        Ok(())
    }
}
