pub mod availability;
pub mod booking;
pub mod calendar;
pub mod notifications;
pub mod slots;

pub use availability::AvailabilityService;
pub use booking::AppointmentBookingService;
pub use calendar::CalendarService;
pub use notifications::{NullNotifier, ReceptionNotifier};
pub use slots::generate_free_slots;

use chrono::{Duration, NaiveDate};
use tracing::warn;

/// Normalize a day window: reversed bounds are swapped and oversized windows
/// are truncated to `max_days`, so a malformed range from a calendar widget
/// can never turn into an unbounded scan.
pub(crate) fn clamp_day_window(start: NaiveDate, end: NaiveDate, max_days: i64) -> (NaiveDate, NaiveDate) {
    let (d0, mut d1) = if end < start { (end, start) } else { (start, end) };
    if (d1 - d0).num_days() > max_days {
        warn!(
            "calendar window {}..{} exceeds {} days, truncating",
            d0, d1, max_days
        );
        d1 = d0 + Duration::days(max_days);
    }
    (d0, d1)
}
