// src/schedule.rs
//! Fixed-grid scheduling: "every N minutes" fires at minutes 0, N, 2N, ...
//! of each hour (the `*/N` minute field of a crontab), not N minutes after start.

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Timelike, Utc};

/// First grid instant strictly after `now`.
pub fn next_tick_after(now: DateTime<Utc>, interval_minutes: u32) -> DateTime<Utc> {
    let step = interval_minutes.max(1);
    let mut t = now
        .duration_trunc(ChronoDuration::minutes(1))
        .unwrap_or(now);
    // at most 60 steps: minute 0 of the next hour is always on the grid
    for _ in 0..=60 {
        t += ChronoDuration::minutes(1);
        if t.minute() % step == 0 {
            return t;
        }
    }
    t
}

/// Time to sleep until the next grid instant.
pub fn until_next_tick(now: DateTime<Utc>, interval_minutes: u32) -> std::time::Duration {
    (next_tick_after(now, interval_minutes) - now)
        .to_std()
        .unwrap_or_default()
}
