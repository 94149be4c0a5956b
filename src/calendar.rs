use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::conflict;
use crate::error::CalendarError;
use crate::grid;
use crate::layout;
use crate::models::{ConflictSet, OverlapGroup, TimeInterval};

/// The in-memory appointment collection for the currently loaded date
/// window. The window owns its intervals; the detector, grouper and snapper
/// only ever see read-only views of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarWindow {
    intervals: Vec<TimeInterval>,
}

impl CalendarWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window seeded from appointments loaded off the backend, in backend
    /// order.
    pub fn from_intervals(intervals: Vec<TimeInterval>) -> Self {
        Self { intervals }
    }

    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&TimeInterval> {
        self.intervals.iter().find(|iv| iv.id == id)
    }

    pub fn insert(&mut self, interval: TimeInterval) {
        self.intervals.push(interval);
    }

    pub fn replace(&mut self, interval: TimeInterval) -> Result<(), CalendarError> {
        match self.intervals.iter_mut().find(|iv| iv.id == interval.id) {
            Some(slot) => {
                *slot = interval;
                Ok(())
            }
            None => Err(CalendarError::UnknownInterval(interval.id)),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Result<TimeInterval, CalendarError> {
        match self.intervals.iter().position(|iv| iv.id == id) {
            Some(pos) => Ok(self.intervals.remove(pos)),
            None => Err(CalendarError::UnknownInterval(id)),
        }
    }

    /* snapshot / restore, the rollback half of an optimistic commit */

    pub fn snapshot(&self) -> Vec<TimeInterval> {
        self.intervals.clone()
    }

    pub fn restore(&mut self, snapshot: Vec<TimeInterval>) {
        self.intervals = snapshot;
    }

    /* queries over the collection */

    pub fn conflicts_for(&self, candidate: &TimeInterval, exclude: Option<Uuid>) -> ConflictSet {
        conflict::conflict_set(candidate, &self.intervals, exclude)
    }

    pub fn layout(&self) -> Vec<OverlapGroup> {
        layout::group_overlaps(&self.intervals)
    }

    /* gesture planning: snapping and duration bounds, no mutation yet */

    /// Proposed interval for a create gesture. Times come from a form, so
    /// they are bounds-checked but not snapped.
    pub fn plan_create(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cfg: &Config,
    ) -> Result<TimeInterval, CalendarError> {
        grid::clamp_duration(start, end, cfg.min_duration_minutes, cfg.max_duration_minutes)?;
        TimeInterval::with_new_id(start, end)
    }

    /// Proposed interval for dragging an appointment to a new start. The
    /// length is preserved exactly.
    pub fn plan_move(
        &self,
        id: Uuid,
        raw_start: DateTime<Utc>,
        cfg: &Config,
    ) -> Result<TimeInterval, CalendarError> {
        let current = self.get(id).ok_or(CalendarError::UnknownInterval(id))?;
        let raw_end = raw_start + current.duration();
        let (start, end) = grid::snap_drag_result(raw_start, raw_end, cfg.grid_minutes);
        grid::clamp_duration(start, end, cfg.min_duration_minutes, cfg.max_duration_minutes)?;
        TimeInterval::new(id, start, end)
    }

    /// Proposed interval for resizing an appointment's end. The start is
    /// never altered.
    pub fn plan_resize(
        &self,
        id: Uuid,
        raw_end: DateTime<Utc>,
        cfg: &Config,
    ) -> Result<TimeInterval, CalendarError> {
        let current = self.get(id).ok_or(CalendarError::UnknownInterval(id))?;
        let end = grid::snap_resize_result(current.start, raw_end, cfg.grid_minutes);
        grid::clamp_duration(
            current.start,
            end,
            cfg.min_duration_minutes,
            cfg.max_duration_minutes,
        )?;
        TimeInterval::new(id, current.start, end)
    }

    /// First conflict-free grid-aligned start for `duration`, scanning
    /// forward from `from` up to `horizon`. Offered as an alternative when
    /// the user declines to double-book.
    pub fn next_free_slot(
        &self,
        duration: Duration,
        from: DateTime<Utc>,
        horizon: DateTime<Utc>,
        cfg: &Config,
    ) -> Option<DateTime<Utc>> {
        let step = Duration::minutes(cfg.grid_minutes);
        let mut cursor = grid::snap_to_grid(from, cfg.grid_minutes);
        if cursor < from {
            cursor += step;
        }

        let probe_id = Uuid::new_v4();
        while cursor + duration <= horizon {
            let probe = TimeInterval {
                id: probe_id,
                start: cursor,
                end: cursor + duration,
            };
            if conflict::find_conflicts(&probe, &self.intervals, None).is_empty() {
                return Some(cursor);
            }
            cursor += step;
        }
        None
    }
}
