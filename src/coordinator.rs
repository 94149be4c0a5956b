// src/coordinator.rs

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calendar::CalendarWindow;
use crate::config::Config;
use crate::error::{CalendarError, CommitError};
use crate::models::{ConflictSet, OverlapGroup, TimeInterval};

/* ============================================================
   Mutations
   ============================================================ */

/// A tentative schedule change produced by a user gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(TimeInterval),
    Move(TimeInterval),
    Resize(TimeInterval),
    Remove(Uuid),
}

impl Mutation {
    /// The appointment this change targets.
    pub fn target_id(&self) -> Uuid {
        match self {
            Mutation::Create(iv) | Mutation::Move(iv) | Mutation::Resize(iv) => iv.id,
            Mutation::Remove(id) => *id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Move(_) => "move",
            Mutation::Resize(_) => "resize",
            Mutation::Remove(_) => "remove",
        }
    }
}

fn apply_mutation(window: &mut CalendarWindow, mutation: &Mutation) -> Result<(), CalendarError> {
    match mutation {
        Mutation::Create(iv) => {
            window.insert(iv.clone());
            Ok(())
        }
        Mutation::Move(iv) | Mutation::Resize(iv) => window.replace(iv.clone()),
        Mutation::Remove(id) => window.remove(*id).map(|_| ()),
    }
}

/* ============================================================
   Commit transport
   ============================================================ */

/// Remote side of a schedule change. The surrounding application implements
/// this over its REST transport; tests use in-memory fakes.
#[async_trait]
pub trait CommitBackend: Send + Sync {
    /// Push one schedule change to the backend. Resolves on success, errors
    /// on rejection or transport failure.
    async fn commit(&self, mutation: &Mutation) -> Result<(), CommitError>;
}

/* ============================================================
   Coordinator
   ============================================================ */

/// Applies schedule changes optimistically: local state first, then the
/// remote commit, rolling the local state back to the pre-change snapshot
/// if the commit fails.
///
/// Single-threaded and cooperative. The only suspension point is the commit
/// await; a second change for an appointment whose commit is still pending
/// is rejected, while conflict checks and layout keep running against the
/// last settled state so they never report against a change that might
/// still roll back.
pub struct MutationCoordinator {
    optimistic: RefCell<CalendarWindow>,
    settled: RefCell<CalendarWindow>,
    in_flight: RefCell<HashSet<Uuid>>,
    config: Config,
}

struct InFlightGuard<'a> {
    ids: &'a RefCell<HashSet<Uuid>>,
    id: Uuid,
}

impl<'a> InFlightGuard<'a> {
    fn begin(ids: &'a RefCell<HashSet<Uuid>>, id: Uuid) -> Result<Self, CalendarError> {
        if !ids.borrow_mut().insert(id) {
            return Err(CalendarError::MutationInFlight(id));
        }
        Ok(Self { ids, id })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.ids.borrow_mut().remove(&self.id);
    }
}

impl MutationCoordinator {
    pub fn new(window: CalendarWindow, config: Config) -> Self {
        Self {
            optimistic: RefCell::new(window.clone()),
            settled: RefCell::new(window),
            in_flight: RefCell::new(HashSet::new()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Appointments as the UI should render them, optimistic changes
    /// included.
    pub fn intervals(&self) -> Vec<TimeInterval> {
        self.optimistic.borrow().snapshot()
    }

    /// The last state the backend confirmed.
    pub fn settled(&self) -> CalendarWindow {
        self.settled.borrow().clone()
    }

    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.in_flight.borrow().contains(&id)
    }

    /* queries and gesture planning, always against settled state */

    pub fn conflicts_for(&self, candidate: &TimeInterval, exclude: Option<Uuid>) -> ConflictSet {
        self.settled.borrow().conflicts_for(candidate, exclude)
    }

    pub fn layout(&self) -> Vec<OverlapGroup> {
        self.settled.borrow().layout()
    }

    pub fn plan_create(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TimeInterval, CalendarError> {
        self.settled.borrow().plan_create(start, end, &self.config)
    }

    pub fn plan_move(&self, id: Uuid, raw_start: DateTime<Utc>) -> Result<TimeInterval, CalendarError> {
        self.settled.borrow().plan_move(id, raw_start, &self.config)
    }

    pub fn plan_resize(&self, id: Uuid, raw_end: DateTime<Utc>) -> Result<TimeInterval, CalendarError> {
        self.settled.borrow().plan_resize(id, raw_end, &self.config)
    }

    /* the optimistic commit path */

    /// Apply `mutation` locally, then run the caller-supplied commit.
    ///
    /// On success the change becomes settled. On rejection, transport
    /// failure or timeout the collection is restored to its pre-change
    /// snapshot and the commit error is surfaced; the attempt is never
    /// retried here, the triggering gesture can simply be redone.
    pub async fn propose<F, Fut>(&self, mutation: Mutation, commit: F) -> Result<(), CalendarError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), CommitError>>,
    {
        let id = mutation.target_id();
        let _guard = InFlightGuard::begin(&self.in_flight, id)?;

        let snapshot = self.optimistic.borrow().snapshot();
        apply_mutation(&mut self.optimistic.borrow_mut(), &mutation)?;
        debug!("{} for {} applied optimistically", mutation.kind(), id);

        let outcome = match self.config.commit_timeout {
            Some(limit) => match tokio::time::timeout(limit, commit()).await {
                Ok(result) => result,
                Err(_) => Err(CommitError::TimedOut(limit)),
            },
            None => commit().await,
        };

        match outcome {
            Ok(()) => {
                apply_mutation(&mut self.settled.borrow_mut(), &mutation)?;
                info!("{} for {} committed", mutation.kind(), id);
                Ok(())
            }
            Err(err) => {
                warn!("{} for {} failed, rolling back: {}", mutation.kind(), id, err);
                self.optimistic.borrow_mut().restore(snapshot);
                Err(CalendarError::Commit(err))
            }
        }
    }

    /// Same as [`propose`](Self::propose), with the commit routed through a
    /// long-lived transport instead of a per-call closure.
    pub async fn propose_via<B>(&self, mutation: Mutation, backend: &B) -> Result<(), CalendarError>
    where
        B: CommitBackend + ?Sized,
    {
        let payload = mutation.clone();
        self.propose(mutation, || async move { backend.commit(&payload).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    fn t(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn iv(start: &str, end: &str) -> TimeInterval {
        TimeInterval::new(Uuid::new_v4(), t(start), t(end)).unwrap()
    }

    fn coordinator_with(intervals: Vec<TimeInterval>) -> MutationCoordinator {
        MutationCoordinator::new(CalendarWindow::from_intervals(intervals), Config::default())
    }

    struct FakeBackend {
        seen: Mutex<Vec<Mutation>>,
        fail_with: Option<CommitError>,
    }

    impl FakeBackend {
        fn accepting() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(err: CommitError) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_with: Some(err),
            }
        }
    }

    #[async_trait]
    impl CommitBackend for FakeBackend {
        async fn commit(&self, mutation: &Mutation) -> Result<(), CommitError> {
            self.seen.lock().unwrap().push(mutation.clone());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn successful_create_becomes_settled() {
        let coord = coordinator_with(vec![]);
        let appt = iv("2026-03-02T14:00:00Z", "2026-03-02T14:30:00Z");

        coord
            .propose(Mutation::Create(appt.clone()), || async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(coord.intervals(), vec![appt.clone()]);
        assert_eq!(coord.settled().intervals(), &[appt.clone()]);
        assert!(!coord.is_in_flight(appt.id));
    }

    #[tokio::test]
    async fn failed_move_restores_the_snapshot_exactly() {
        let a = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let b = iv("2026-03-02T10:00:00Z", "2026-03-02T10:30:00Z");
        let coord = coordinator_with(vec![a.clone(), b.clone()]);
        let before = coord.intervals();

        let moved = a.shifted_to(t("2026-03-02T11:00:00Z"));
        let result = coord
            .propose(Mutation::Move(moved), || async {
                Err(CommitError::Transport("connection reset".into()))
            })
            .await;

        assert!(matches!(
            result,
            Err(CalendarError::Commit(CommitError::Transport(_)))
        ));
        assert_eq!(coord.intervals(), before);
        assert_eq!(coord.settled().intervals(), &[a.clone(), b]);
        assert!(!coord.is_in_flight(a.id));
    }

    #[tokio::test]
    async fn second_change_for_a_committing_appointment_is_rejected() {
        let appt = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let coord = coordinator_with(vec![appt.clone()]);

        let first = appt.shifted_to(t("2026-03-02T10:00:00Z"));
        let second = appt.shifted_to(t("2026-03-02T11:00:00Z"));

        // the second gesture arrives while the first commit is still
        // awaiting the backend
        coord
            .propose(Mutation::Move(first.clone()), || async {
                let retry = coord.propose(Mutation::Move(second), || async { Ok(()) }).await;
                assert!(matches!(
                    retry,
                    Err(CalendarError::MutationInFlight(id)) if id == appt.id
                ));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(coord.intervals(), vec![first]);
        assert!(!coord.is_in_flight(appt.id));
    }

    #[tokio::test]
    async fn changes_to_different_appointments_may_overlap() {
        let a = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let b = iv("2026-03-02T10:00:00Z", "2026-03-02T10:30:00Z");
        let coord = coordinator_with(vec![a.clone(), b.clone()]);

        let b_moved = b.shifted_to(t("2026-03-02T12:00:00Z"));
        let b_moved_inner = b_moved.clone();
        coord
            .propose(Mutation::Move(a.shifted_to(t("2026-03-02T11:00:00Z"))), || async {
                coord
                    .propose(Mutation::Move(b_moved_inner), || async { Ok(()) })
                    .await
                    .unwrap();
                Ok(())
            })
            .await
            .unwrap();

        assert!(coord.settled().get(b.id).is_some_and(|iv| iv.start == b_moved.start));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_commit_times_out_and_rolls_back() {
        let appt = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let window = CalendarWindow::from_intervals(vec![appt.clone()]);
        let config = Config {
            commit_timeout: Some(StdDuration::from_secs(5)),
            ..Config::default()
        };
        let coord = MutationCoordinator::new(window, config);

        let result = coord
            .propose(
                Mutation::Move(appt.shifted_to(t("2026-03-02T10:00:00Z"))),
                || std::future::pending(),
            )
            .await;

        assert!(matches!(
            result,
            Err(CalendarError::Commit(CommitError::TimedOut(_)))
        ));
        assert_eq!(coord.intervals(), vec![appt]);
    }

    #[tokio::test]
    async fn backend_sees_the_mutation_it_commits() {
        let appt = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let coord = coordinator_with(vec![appt.clone()]);
        let backend = FakeBackend::accepting();

        coord
            .propose_via(Mutation::Remove(appt.id), &backend)
            .await
            .unwrap();

        assert_eq!(
            backend.seen.lock().unwrap().as_slice(),
            &[Mutation::Remove(appt.id)]
        );
        assert!(coord.intervals().is_empty());
        assert!(coord.settled().is_empty());
    }

    #[tokio::test]
    async fn rejected_remove_comes_back() {
        let appt = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let coord = coordinator_with(vec![appt.clone()]);
        let backend = FakeBackend::failing(CommitError::Rejected("appointment already started".into()));

        let result = coord.propose_via(Mutation::Remove(appt.id), &backend).await;

        assert!(matches!(
            result,
            Err(CalendarError::Commit(CommitError::Rejected(_)))
        ));
        assert_eq!(coord.intervals(), vec![appt]);
    }

    #[tokio::test]
    async fn moving_an_unloaded_appointment_never_reaches_the_backend() {
        let coord = coordinator_with(vec![]);
        let ghost = iv("2026-03-02T09:00:00Z", "2026-03-02T09:30:00Z");
        let backend = FakeBackend::accepting();

        let result = coord.propose_via(Mutation::Move(ghost.clone()), &backend).await;

        assert!(matches!(result, Err(CalendarError::UnknownInterval(_))));
        assert!(backend.seen.lock().unwrap().is_empty());
        assert!(!coord.is_in_flight(ghost.id));
    }

    #[tokio::test]
    async fn conflict_checks_ignore_in_flight_changes() {
        let a = iv("2026-03-02T09:00:00Z", "2026-03-02T10:00:00Z");
        let coord = coordinator_with(vec![a.clone()]);

        // while a's move to 11:00 is committing, a new 11:00 booking is
        // checked against the settled 09:00 position, not the tentative one
        let probe = iv("2026-03-02T11:00:00Z", "2026-03-02T11:30:00Z");
        let probe_inner = probe.clone();
        coord
            .propose(Mutation::Move(a.shifted_to(t("2026-03-02T11:00:00Z"))), || async {
                assert!(coord.conflicts_for(&probe_inner, None).is_empty());
                Ok(())
            })
            .await
            .unwrap();

        // once settled, the same probe does conflict
        assert_eq!(coord.conflicts_for(&probe, None).len(), 1);
    }
}
