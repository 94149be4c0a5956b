use tracing::debug;
use uuid::Uuid;

use crate::error::CalendarError;
use crate::models::{ConflictSet, TimeInterval};

/// Every loaded appointment the candidate overlaps with, in the order they
/// appear in `existing`.
///
/// The overlap test is strict half-open, so touching endpoints never
/// conflict. The candidate's own id is always skipped; `exclude` skips one
/// more id (the appointment being moved or resized, whose old position must
/// not count against its new one).
pub fn find_conflicts(
    candidate: &TimeInterval,
    existing: &[TimeInterval],
    exclude: Option<Uuid>,
) -> Vec<TimeInterval> {
    let conflicts: Vec<TimeInterval> = existing
        .iter()
        .filter(|other| other.id != candidate.id && Some(other.id) != exclude)
        .filter(|other| candidate.overlaps(other))
        .cloned()
        .collect();

    if !conflicts.is_empty() {
        debug!(
            "candidate {} overlaps {} loaded appointment(s)",
            candidate.id,
            conflicts.len()
        );
    }

    conflicts
}

pub fn conflict_set(
    candidate: &TimeInterval,
    existing: &[TimeInterval],
    exclude: Option<Uuid>,
) -> ConflictSet {
    ConflictSet {
        candidate: candidate.clone(),
        conflicts: find_conflicts(candidate, existing, exclude),
    }
}

/// Gate for callers without an override flow: fails with the conflicting
/// appointments attached so they can still be shown to the user.
pub fn ensure_clear(
    candidate: &TimeInterval,
    existing: &[TimeInterval],
    exclude: Option<Uuid>,
) -> Result<(), CalendarError> {
    let set = conflict_set(candidate, existing, exclude);
    if set.is_empty() {
        Ok(())
    } else {
        Err(CalendarError::ConflictDetected(set))
    }
}
