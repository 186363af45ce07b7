use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use scheduling_cell::models::DayAvailability;
use scheduling_cell::services::{
    AppointmentBookingService, AvailabilityService, CalendarService, NullNotifier,
};
use scheduling_cell::store::InMemoryStore;
use shared_config::SchedulingConfig;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    d.and_hms_opt(h, m, 0).unwrap()
}

struct Harness {
    availability: AvailabilityService,
    booking: AppointmentBookingService,
    calendar: CalendarService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let config = SchedulingConfig::default();
    Harness {
        availability: AvailabilityService::new(store.clone(), config.clone()),
        booking: AppointmentBookingService::new(
            store.clone(),
            Arc::new(NullNotifier),
            config.clone(),
        ),
        calendar: CalendarService::new(store, config),
    }
}

#[tokio::test]
async fn distinguishes_missing_rule_from_fully_booked() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let day2 = day() + Duration::days(1);

    // A two-slot day, then booked solid by two different patients.
    h.availability
        .set_availability(doctor, day(), "09:00", "10:00", 30)
        .await
        .unwrap();
    h.booking
        .book(Uuid::new_v4(), doctor, at(day(), 9, 0), "checkup")
        .await
        .unwrap();
    h.booking
        .book(Uuid::new_v4(), doctor, at(day(), 9, 30), "checkup")
        .await
        .unwrap();

    let calendar = h.calendar.availability_calendar(doctor, day(), day2).await.unwrap();
    assert_eq!(
        calendar,
        vec![
            DayAvailability {
                date: day(),
                available: true,
                free: 0,
            },
            DayAvailability {
                date: day2,
                available: false,
                free: 0,
            },
        ]
    );
}

#[tokio::test]
async fn counts_remaining_free_slots() {
    let h = harness();
    let doctor = Uuid::new_v4();

    h.availability
        .set_availability(doctor, day(), "09:00", "17:00", 30)
        .await
        .unwrap();
    h.booking
        .book(Uuid::new_v4(), doctor, at(day(), 10, 0), "checkup")
        .await
        .unwrap();

    let calendar = h.calendar.availability_calendar(doctor, day(), day()).await.unwrap();
    assert_eq!(calendar.len(), 1);
    assert!(calendar[0].available);
    assert_eq!(calendar[0].free, 15);
}

#[tokio::test]
async fn cancelled_appointments_free_their_slot() {
    let h = harness();
    let doctor = Uuid::new_v4();

    h.availability
        .set_availability(doctor, day(), "09:00", "17:00", 30)
        .await
        .unwrap();
    let saved = h
        .booking
        .book(Uuid::new_v4(), doctor, at(day(), 10, 0), "checkup")
        .await
        .unwrap();
    h.booking.cancel(saved.id).await.unwrap();

    let calendar = h.calendar.availability_calendar(doctor, day(), day()).await.unwrap();
    assert_eq!(calendar[0].free, 16);
}

#[tokio::test]
async fn available_dates_skip_full_and_ruleless_days() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let day2 = day() + Duration::days(1);
    let day3 = day() + Duration::days(2);

    // day(): open with room. day2: open but fully booked. day3: no rule.
    h.availability
        .set_availability(doctor, day(), "09:00", "17:00", 30)
        .await
        .unwrap();
    h.availability
        .set_availability(doctor, day2, "09:00", "09:30", 30)
        .await
        .unwrap();
    h.booking
        .book(Uuid::new_v4(), doctor, at(day2, 9, 0), "checkup")
        .await
        .unwrap();

    let dates = h.calendar.available_dates(doctor, day(), day3).await.unwrap();
    assert_eq!(dates, vec![day()]);

    let counts = h.calendar.dates_with_counts(doctor, day(), day3).await.unwrap();
    assert_eq!(counts, vec![(day(), 16)]);
}

#[tokio::test]
async fn reversed_bounds_are_normalized() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let day2 = day() + Duration::days(1);

    h.availability
        .set_availability(doctor, day(), "09:00", "17:00", 30)
        .await
        .unwrap();

    let forward = h.calendar.availability_calendar(doctor, day(), day2).await.unwrap();
    let reversed = h.calendar.availability_calendar(doctor, day2, day()).await.unwrap();
    assert_eq!(forward, reversed);
}

#[tokio::test]
async fn window_is_capped_at_the_configured_horizon() {
    let h = harness();
    let doctor = Uuid::new_v4();
    let far = day() + Duration::days(500);

    let calendar = h.calendar.availability_calendar(doctor, day(), far).await.unwrap();
    // 365 days past the start, inclusive of both ends.
    assert_eq!(calendar.len(), 366);
    assert_eq!(calendar.first().map(|d| d.date), Some(day()));
    assert_eq!(calendar.last().map(|d| d.date), Some(day() + Duration::days(365)));
}
