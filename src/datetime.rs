//! Date/time utilities for newsdesk.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{NewsError, Result};

/// Parse an `HH:MM` daily post time.
pub fn parse_post_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| NewsError::Config(format!("invalid post time '{}': {}", s, e)))
}

/// Parse a time zone name (e.g., "UTC", "Europe/Lisbon").
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|e| NewsError::Config(format!("invalid timezone '{}': {}", s, e)))
}

/// Next instant strictly after `now` at which the wall clock in `tz` reads `at`.
///
/// Days on which `at` does not exist in `tz` (DST gaps) are skipped; when it
/// occurs twice the earlier instant is used.
pub fn next_daily_trigger(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    loop {
        if let Some(local) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            let candidate = local.with_timezone(&Utc);
            if candidate > now {
                return candidate;
            }
        }
        date += Duration::days(1);
    }
}

/// Human-readable schedule, e.g. "Daily at 09:00 UTC".
pub fn describe_schedule(at: NaiveTime, tz: Tz) -> String {
    format!("Daily at {} {}", at.format("%H:%M"), tz.name())
}

/// Format an article's publication time for display.
pub fn format_published(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M UTC").to_string()
}
