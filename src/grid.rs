use chrono::{DateTime, Duration, Utc};

use crate::error::CalendarError;

/// Snapping granularity for drag and resize gestures.
pub const GRID_MINUTES: i64 = 15;
/// Shortest bookable appointment.
pub const MIN_DURATION_MINUTES: i64 = 15;
/// Longest bookable appointment (12 hours).
pub const MAX_DURATION_MINUTES: i64 = 720;

/// Round a timestamp to the nearest multiple of `granularity_minutes`,
/// half-up on the millisecond epoch value.
pub fn snap_to_grid(t: DateTime<Utc>, granularity_minutes: i64) -> DateTime<Utc> {
    let step = granularity_minutes * 60_000;
    let ms = t.timestamp_millis();
    let snapped = (ms + step / 2).div_euclid(step) * step;
    DateTime::from_timestamp_millis(snapped).unwrap_or(t)
}

fn ceil_to_grid(t: DateTime<Utc>, granularity_minutes: i64) -> DateTime<Utc> {
    let step = granularity_minutes * 60_000;
    let ms = t.timestamp_millis();
    let snapped = (ms + step - 1).div_euclid(step) * step;
    DateTime::from_timestamp_millis(snapped).unwrap_or(t)
}

/// Reject durations outside `[min_minutes, max_minutes]`. Out-of-range
/// proposals are a user-visible error, never silently clamped.
pub fn clamp_duration(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_minutes: i64,
    max_minutes: i64,
) -> Result<(), CalendarError> {
    let minutes = (end - start).num_minutes();
    if minutes < min_minutes {
        return Err(CalendarError::DurationTooShort {
            minutes,
            min_minutes,
        });
    }
    if minutes > max_minutes {
        return Err(CalendarError::DurationTooLong {
            minutes,
            max_minutes,
        });
    }
    Ok(())
}

/// Snap a move gesture. The start lands on the nearest grid line; the end
/// is derived by re-adding the raw duration, so a move never changes an
/// appointment's length.
pub fn snap_drag_result(
    raw_start: DateTime<Utc>,
    raw_end: DateTime<Utc>,
    granularity_minutes: i64,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let duration = raw_end - raw_start;
    let start = snap_to_grid(raw_start, granularity_minutes);
    (start, start + duration)
}

/// Snap a resize gesture. The dragged end rounds up to the grid line so the
/// appointment still covers the release point, floored at one grid step past
/// the start. The start is never altered.
pub fn snap_resize_result(
    start: DateTime<Utc>,
    raw_end: DateTime<Utc>,
    granularity_minutes: i64,
) -> DateTime<Utc> {
    let floor = start + Duration::minutes(granularity_minutes);
    let snapped = ceil_to_grid(raw_end, granularity_minutes);
    if snapped < floor { floor } else { snapped }
}
