//! Publish-timestamp distribution for content runs.
//!
//! Splits a run into an immediate head (items published seconds apart, right
//! away) and a day-scheduled tail (items spread over consecutive days inside
//! a randomized daytime window). Randomness comes from a caller-supplied
//! [`Rng`] so tests can seed it.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use rand::Rng;

use contentforge_shared::config::ScheduleDefaults;
use contentforge_shared::{ContentForgeError, Result, ScheduleEntry};

/// Spacing between consecutive immediate publications.
const IMMEDIATE_SPACING_SECS: i64 = 2;

/// Inputs to [`distribute`].
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOptions {
    /// How many items at the head of the run publish immediately.
    pub immediate_count: usize,
    /// Maximum day-scheduled items per calendar day. Must be nonzero.
    pub per_day_capacity: usize,
    /// First calendar day eligible for day scheduling.
    pub start_date: DateTime<Utc>,
    /// Reference instant for the immediate head.
    pub now: DateTime<Utc>,
}

impl ScheduleOptions {
    /// Derive options from the `[schedule]` config section.
    pub fn from_defaults(
        defaults: &ScheduleDefaults,
        start_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            immediate_count: defaults.immediate_count,
            per_day_capacity: defaults.per_day_capacity,
            start_date,
            now,
        }
    }
}

/// Assign a publish timestamp to each of `count` items.
///
/// The first `immediate_count` items publish `IMMEDIATE_SPACING_SECS` apart
/// starting at `now`. The remainder fills consecutive days starting at
/// `start_date`, at most `per_day_capacity` per day. Each day gets a window
/// opening between 08:00 and 17:59 and lasting 120 to 179 minutes; items are
/// placed at evenly spaced base positions inside the window with up to five
/// minutes of jitter either way, clamped so no item lands before the window
/// opens.
pub fn distribute<R: Rng + ?Sized>(
    count: usize,
    opts: &ScheduleOptions,
    rng: &mut R,
) -> Result<Vec<ScheduleEntry>> {
    if opts.per_day_capacity == 0 {
        return Err(ContentForgeError::validation(
            "per_day_capacity must be at least 1",
        ));
    }

    let mut entries = Vec::with_capacity(count);

    let immediate = count.min(opts.immediate_count);
    for i in 0..immediate {
        entries.push(ScheduleEntry {
            item_index: i,
            publish_at: opts.now + chrono::Duration::seconds(IMMEDIATE_SPACING_SECS * i as i64),
            immediate: true,
        });
    }

    let remaining = count - immediate;
    let mut scheduled = 0usize;
    let mut day_offset = 0u64;

    while scheduled < remaining {
        let batch = (remaining - scheduled).min(opts.per_day_capacity);
        let day = opts
            .start_date
            .date_naive()
            .checked_add_days(Days::new(day_offset))
            .ok_or_else(|| ContentForgeError::validation("schedule date out of range"))?;
        let midnight = day.and_time(NaiveTime::MIN).and_utc();

        let start_hour: u32 = rng.random_range(8..18);
        let start_minute: u32 = rng.random_range(0..60);
        let window_minutes: f64 = rng.random_range(120..180) as f64;
        let window_open = midnight
            + chrono::Duration::hours(start_hour as i64)
            + chrono::Duration::minutes(start_minute as i64);

        for i in 0..batch {
            let base = if batch == 1 {
                0.0
            } else {
                (i as f64 / (batch - 1) as f64) * window_minutes
            };
            let jitter = (rng.random::<f64>() - 0.5) * 10.0;
            let offset_minutes = (base + jitter).floor().max(0.0) as i64;
            let seconds: i64 = rng.random_range(0..60);

            entries.push(ScheduleEntry {
                item_index: immediate + scheduled + i,
                publish_at: window_open
                    + chrono::Duration::minutes(offset_minutes)
                    + chrono::Duration::seconds(seconds),
                immediate: false,
            });
        }

        scheduled += batch;
        day_offset += 1;
    }

    tracing::debug!(
        count,
        immediate,
        days = day_offset,
        "distributed publish schedule"
    );

    Ok(entries)
}

/// Assign one publish timestamp per allowed weekday, skipping other days.
///
/// Walks forward from `start_date` one calendar day at a time; each day whose
/// weekday appears in `allowed` receives the next item at a random time
/// between 12:00 and 14:59. Returns an empty schedule when `allowed` is empty.
pub fn distribute_weekdays<R: Rng + ?Sized>(
    count: usize,
    allowed: &[Weekday],
    start_date: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<ScheduleEntry>> {
    if allowed.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::with_capacity(count);
    let mut day_offset = 0u64;

    while entries.len() < count {
        let day = start_date
            .date_naive()
            .checked_add_days(Days::new(day_offset))
            .ok_or_else(|| ContentForgeError::validation("schedule date out of range"))?;
        day_offset += 1;

        if !allowed.contains(&day.weekday()) {
            continue;
        }

        let hour: u32 = rng.random_range(12..15);
        let minute: u32 = rng.random_range(0..60);
        let second: u32 = rng.random_range(0..60);
        let publish_at = day.and_time(NaiveTime::MIN).and_utc()
            + chrono::Duration::hours(hour as i64)
            + chrono::Duration::minutes(minute as i64)
            + chrono::Duration::seconds(second as i64);

        entries.push(ScheduleEntry {
            item_index: entries.len(),
            publish_at,
            immediate: false,
        });
    }

    Ok(entries)
}
