//! Scheduling core for the clinic calendar.
//!
//! Owns the in-memory appointment intervals for a loaded date window and
//! the logic the calendar UI is built on: half-open conflict detection,
//! 15-minute grid snapping for drag/resize gestures, side-by-side layout
//! grouping, and an optimistic mutation coordinator that rolls local state
//! back when the remote commit fails. Transport, auth and rendering live in
//! the surrounding application.

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod layout;
pub mod models;

pub use calendar::CalendarWindow;
pub use config::Config;
pub use conflict::{conflict_set, ensure_clear, find_conflicts};
pub use coordinator::{CommitBackend, Mutation, MutationCoordinator};
pub use error::{CalendarError, CommitError};
pub use grid::{
    GRID_MINUTES, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, clamp_duration, snap_drag_result,
    snap_resize_result, snap_to_grid,
};
pub use layout::group_overlaps;
pub use models::{ConflictSet, OverlapGroup, SlotPlacement, TimeInterval};
