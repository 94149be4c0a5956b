use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CalendarError;

/* -------------------------
   Appointment intervals
--------------------------*/

/// A scheduled appointment as a half-open interval `[start, end)`.
///
/// Adjacent appointments touching at a boundary do not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, CalendarError> {
        if end <= start {
            return Err(CalendarError::InvalidInterval);
        }
        Ok(Self { id, start, end })
    }

    /// Interval with a fresh id, for create gestures.
    pub fn with_new_id(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CalendarError> {
        Self::new(Uuid::new_v4(), start, end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Strict half-open overlap test: `self.start < other.end && self.end > other.start`.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Same length at a new start.
    pub fn shifted_to(&self, start: DateTime<Utc>) -> TimeInterval {
        TimeInterval {
            id: self.id,
            start,
            end: start + self.duration(),
        }
    }
}

/* -------------------------
   Conflict query result
--------------------------*/

/// The appointments a candidate interval overlaps with, in the order they
/// appear in the loaded collection. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSet {
    pub candidate: TimeInterval,
    pub conflicts: Vec<TimeInterval>,
}

impl ConflictSet {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.conflicts.iter().map(|iv| iv.id).collect()
    }
}

/* -------------------------
   Side-by-side layout
--------------------------*/

/// Column assignment for one appointment inside an overlap group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlacement {
    pub interval: TimeInterval,
    pub slot_index: usize,
    pub slot_count: usize,
}

impl SlotPlacement {
    /// Rendered width as a percentage of the day column.
    pub fn width_pct(&self) -> f64 {
        100.0 / self.slot_count as f64
    }

    /// Left offset as a percentage of the day column.
    pub fn offset_pct(&self) -> f64 {
        self.slot_index as f64 * self.width_pct()
    }
}

/// A cluster of appointments that share time, with one column per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapGroup {
    pub members: Vec<SlotPlacement>,
}

impl OverlapGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.members.iter().any(|m| m.interval.id == id)
    }

    pub fn placement(&self, id: Uuid) -> Option<&SlotPlacement> {
        self.members.iter().find(|m| m.interval.id == id)
    }
}
