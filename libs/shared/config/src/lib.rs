use std::env;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

/// Engine tunables shared by the scheduling services.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingConfig {
    /// Granularity applied when a rule carries a non-positive slot size.
    pub default_slot_minutes: u32,
    /// Hard cap on calendar/range queries, in days.
    pub max_calendar_days: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_slot_minutes: 30,
            max_calendar_days: 365,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self {
            default_slot_minutes: read_env("CARE_DEFAULT_SLOT_MINUTES", defaults.default_slot_minutes),
            max_calendar_days: read_env("CARE_MAX_CALENDAR_DAYS", defaults.max_calendar_days),
        };

        if config.default_slot_minutes == 0 {
            warn!(
                "CARE_DEFAULT_SLOT_MINUTES must be positive, using {}",
                defaults.default_slot_minutes
            );
            config.default_slot_minutes = defaults.default_slot_minutes;
        }
        if config.max_calendar_days <= 0 {
            warn!(
                "CARE_MAX_CALENDAR_DAYS must be positive, using {}",
                defaults.max_calendar_days
            );
            config.max_calendar_days = defaults.max_calendar_days;
        }

        config
    }
}

fn read_env<T: FromStr + fmt::Display + Copy>(key: &str, default: T) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("{} has invalid value {:?}, using {}", key, raw, default);
            default
        }
    }
}
