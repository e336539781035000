//! Time utilities for the reputation engine.
//!
//! All timestamps are Unix epoch milliseconds (u64). Calendar-day questions
//! ("has this pioneer checked in today?") are answered in a fixed UTC offset
//! taken from configuration.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};

pub const MILLIS_PER_SECOND: u64 = 1_000;
pub const MILLIS_PER_HOUR: u64 = 3_600 * MILLIS_PER_SECOND;
pub const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Return the current time as milliseconds since Unix epoch.
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Convert milliseconds to an RFC 3339 string.
pub fn millis_to_rfc3339(millis: u64) -> String {
    to_utc(millis).to_rfc3339()
}

fn to_utc(millis: u64) -> DateTime<Utc> {
    let secs = (millis / MILLIS_PER_SECOND) as i64;
    let nsecs = ((millis % MILLIS_PER_SECOND) * 1_000_000) as u32;
    DateTime::from_timestamp(secs, nsecs).unwrap_or(DateTime::UNIX_EPOCH)
}

fn offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes * 60)
        .unwrap_or_else(|| Utc.fix())
}

/// Calendar date of `millis` as seen from `utc_offset_minutes`.
pub fn local_date(millis: u64, utc_offset_minutes: i32) -> NaiveDate {
    to_utc(millis)
        .with_timezone(&offset(utc_offset_minutes))
        .date_naive()
}

/// Milliseconds from `millis` until the next local midnight.
pub fn millis_until_next_day(millis: u64, utc_offset_minutes: i32) -> u64 {
    let tz = offset(utc_offset_minutes);
    let local = to_utc(millis).with_timezone(&tz);
    let next_day = local.date_naive() + Duration::days(1);
    let Some(midnight) = next_day
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(tz).single())
    else {
        return 0;
    };
    let midnight_ms = midnight.timestamp_millis().max(0) as u64;
    midnight_ms.saturating_sub(millis)
}

/// Format a millisecond duration as `HH:MM:SS`.
pub fn format_countdown(millis: u64) -> String {
    let total_secs = millis.div_ceil(MILLIS_PER_SECOND);
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for the score service.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        now_millis()
    }
}

/// A clock that only moves when told to. Used for replaying check-in
/// sequences deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
