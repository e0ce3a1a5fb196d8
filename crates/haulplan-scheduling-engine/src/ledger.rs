//! Authoritative, versioned record of every assignment.
//!
//! Lock order is always truck section(s) first, then the short-held entry and
//! job-claim locks. Nothing acquires a truck section while holding either of
//! the latter, and no section is held while talking to the sink. commit and
//! reassign read the job only after claiming it, while the section is held.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::TimeDelta;
use chrono::Utc;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentRevision;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::Truck;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use crate::conflict_index::ConflictIndex;
use crate::conflict_index::TruckTimeline;
use crate::error::EntityRef;
use crate::error::ReplayError;
use crate::error::SchedulingError;
use crate::feasibility::evaluate;
use crate::feasibility::evaluate_window;
use crate::feasibility::within_tolerance;
use crate::lock;
use crate::read;
use crate::reference::ReferenceSource;
use crate::sink::AssignmentRecord;
use crate::sink::AssignmentSink;
use crate::write;

#[derive(Debug)]
struct LedgerEntry {
    current: Assignment,
    history: Vec<AssignmentRevision>,
}

impl LedgerEntry {
    fn new(assignment: Assignment) -> Self {
        Self {
            history: vec![AssignmentRevision::from(&assignment)],
            current: assignment,
        }
    }

    fn advance(&mut self, assignment: Assignment) {
        self.history.push(AssignmentRevision::from(&assignment));
        self.current = assignment;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub truck_id: Option<TruckId>,
    pub job_id: Option<JobId>,
    pub status: Option<AssignmentStatus>,
    pub overlapping: Option<TimeWindow>,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.truck_id
            .as_ref()
            .is_none_or(|truck_id| *truck_id == assignment.truck_id)
            && self
                .job_id
                .as_ref()
                .is_none_or(|job_id| *job_id == assignment.job_id)
            && self.status.is_none_or(|status| status == assignment.status)
            && self
                .overlapping
                .is_none_or(|window| window.overlaps(&assignment.window))
    }
}

/// New truck and/or window for a reassignment. Fields left at `None` keep
/// the value of the assignment being replaced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReassignTarget {
    pub truck_id: Option<TruckId>,
    pub window: Option<TimeWindow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reassignment {
    pub cancelled: Assignment,
    pub replacement: Assignment,
}

pub struct AssignmentLedger {
    reference: Arc<dyn ReferenceSource>,
    sink: Arc<dyn AssignmentSink>,
    window_tolerance: TimeDelta,
    entries: RwLock<HashMap<AssignmentId, LedgerEntry>>,
    job_claims: Mutex<HashMap<JobId, AssignmentId>>,
    index: ConflictIndex,
    next_id: AtomicU64,
}

impl AssignmentLedger {
    pub fn new(
        reference: Arc<dyn ReferenceSource>,
        sink: Arc<dyn AssignmentSink>,
        window_tolerance: TimeDelta,
    ) -> Self {
        Self {
            reference,
            sink,
            window_tolerance,
            entries: RwLock::new(HashMap::new()),
            job_claims: Mutex::new(HashMap::new()),
            index: ConflictIndex::default(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn reference(&self) -> &dyn ReferenceSource {
        self.reference.as_ref()
    }

    pub fn window_tolerance(&self) -> TimeDelta {
        self.window_tolerance
    }

    /// Records a proposal. It takes no truck section and stays invisible to
    /// conflict queries until it is committed.
    #[instrument(level = "info", skip(self), fields(job = %job_id, truck = %truck_id, window = %window))]
    pub fn propose(
        &self,
        job_id: &JobId,
        truck_id: &TruckId,
        window: TimeWindow,
    ) -> Result<Assignment, SchedulingError> {
        let job = self.job(job_id)?;
        self.truck(truck_id)?;
        within_tolerance(&window, &job, self.window_tolerance)?;

        let proposed = Assignment::proposed(
            self.allocate_id(),
            job_id.clone(),
            truck_id.clone(),
            window,
            Utc::now(),
        );
        write(&self.entries).insert(proposed.id, LedgerEntry::new(proposed.clone()));

        event!(Level::INFO, assignment = %proposed.id, "assignment proposed");
        self.persist(&proposed);
        Ok(proposed)
    }

    #[instrument(level = "info", skip(self), fields(assignment = %assignment_id, expected = %expected_version))]
    pub fn commit(
        &self,
        assignment_id: AssignmentId,
        expected_version: Version,
    ) -> Result<Assignment, SchedulingError> {
        let snapshot = self.get(assignment_id)?;
        check_version(&snapshot, expected_version)?;
        check_transition(&snapshot, AssignmentStatus::Committed)?;

        let truck = self.truck(&snapshot.truck_id)?;

        let section = self.index.section(&snapshot.truck_id);
        let committed = {
            let mut timeline = lock(&section);

            let current = self.get(assignment_id)?;
            check_version(&current, expected_version)?;
            check_transition(&current, AssignmentStatus::Committed)?;

            // The job is read only after it is claimed. From here on job
            // edits are refused, so the checks below see its final state.
            self.claim_job(&current.job_id, current.id, None)?;
            let committed = self
                .commit_claimed(&mut timeline, &current, &truck)
                .inspect_err(|_| self.release_job(&current.job_id, current.id))?;

            self.index.place(committed.id, &committed.truck_id);
            self.advance(committed.clone());
            committed
        };

        event!(Level::INFO, assignment = %committed, "assignment committed");
        self.persist(&committed);
        Ok(committed)
    }

    /// Cancelling frees the truck's slot and the job. The record itself is
    /// kept with its full history.
    #[instrument(level = "info", skip(self), fields(assignment = %assignment_id, expected = %expected_version))]
    pub fn cancel(
        &self,
        assignment_id: AssignmentId,
        expected_version: Version,
    ) -> Result<Assignment, SchedulingError> {
        let snapshot = self.get(assignment_id)?;
        check_version(&snapshot, expected_version)?;
        check_transition(&snapshot, AssignmentStatus::Cancelled)?;

        let section = self.index.section(&snapshot.truck_id);
        let cancelled = {
            let mut timeline = lock(&section);

            let current = self.get(assignment_id)?;
            check_version(&current, expected_version)?;
            let cancelled = transition(&current, AssignmentStatus::Cancelled)?;

            if current.is_committed() {
                timeline.remove(current.id);
                self.index.displace(current.id);
                self.release_job(&current.job_id, current.id);
            }
            self.advance(cancelled.clone());
            cancelled
        };

        event!(Level::INFO, assignment = %cancelled, "assignment cancelled");
        self.persist(&cancelled);
        Ok(cancelled)
    }

    /// Cancels `assignment_id` and commits a replacement for the same job in
    /// one step. Every check runs before anything is changed, so a rejected
    /// reassignment leaves the original exactly as it was.
    #[instrument(level = "info", skip(self), fields(assignment = %assignment_id, expected = %expected_version))]
    pub fn reassign(
        &self,
        assignment_id: AssignmentId,
        target: ReassignTarget,
        expected_version: Version,
    ) -> Result<Reassignment, SchedulingError> {
        let snapshot = self.get(assignment_id)?;
        check_version(&snapshot, expected_version)?;
        check_transition(&snapshot, AssignmentStatus::Cancelled)?;

        let truck_id = target.truck_id.unwrap_or_else(|| snapshot.truck_id.clone());
        let window = target.window.unwrap_or(snapshot.window);
        let truck = self.truck(&truck_id)?;

        let old_section = self.index.section(&snapshot.truck_id);
        let new_section = self.index.section(&truck_id);
        let (mut old_timeline, mut new_timeline) =
            lock_sections(&snapshot.truck_id, &old_section, &truck_id, &new_section);

        let current = self.get(assignment_id)?;
        check_version(&current, expected_version)?;
        let cancelled = transition(&current, AssignmentStatus::Cancelled)?;

        // A committed original already holds the job. A proposal claims it
        // here, so the job cannot change while the target is checked.
        let previous_claim = current.is_committed().then_some(current.id);
        self.claim_job(&current.job_id, current.id, previous_claim)?;
        let checked = self
            .job(&current.job_id)
            .and_then(|job| {
                within_tolerance(&window, &job, self.window_tolerance)?;
                evaluate_window(&window, &truck, &job)?;
                Ok(())
            })
            .and_then(|()| {
                let conflicting: Vec<AssignmentId> = match &new_timeline {
                    Some(timeline) => timeline.query(&window),
                    None => old_timeline.query(&window),
                }
                .into_iter()
                .filter(|id| *id != current.id)
                .collect();
                if !conflicting.is_empty() {
                    return Err(overlap(&truck_id, &window, conflicting));
                }
                Ok(())
            });
        if let Err(scheduling_error) = checked {
            self.set_job_claim(&current.job_id, previous_claim);
            return Err(scheduling_error);
        }

        let proposed = Assignment::proposed(
            self.allocate_id(),
            current.job_id.clone(),
            truck_id.clone(),
            window,
            Utc::now(),
        );
        let replacement = transition(&proposed, AssignmentStatus::Committed)
            .inspect_err(|_| self.set_job_claim(&current.job_id, previous_claim))?;
        self.set_job_claim(&replacement.job_id, Some(replacement.id));

        if current.is_committed() {
            old_timeline.remove(current.id);
        }
        let inserted = match new_timeline.as_mut() {
            Some(timeline) => timeline.insert(replacement.id, replacement.window),
            None => old_timeline.insert(replacement.id, replacement.window),
        };
        debug_assert!(
            inserted.is_ok(),
            "the target slot was checked under the same section locks"
        );

        if current.is_committed() {
            self.index.displace(current.id);
        }
        self.index.place(replacement.id, &replacement.truck_id);
        {
            let mut entries = write(&self.entries);
            if let Some(entry) = entries.get_mut(&current.id) {
                entry.advance(cancelled.clone());
            }
            let mut entry = LedgerEntry::new(proposed.clone());
            entry.advance(replacement.clone());
            entries.insert(replacement.id, entry);
        }
        drop(new_timeline);
        drop(old_timeline);

        event!(
            Level::INFO,
            cancelled = %cancelled,
            replacement = %replacement,
            "assignment reassigned"
        );
        self.persist(&cancelled);
        self.persist(&proposed);
        self.persist(&replacement);

        Ok(Reassignment {
            cancelled,
            replacement,
        })
    }

    /// Loads previously persisted records into an empty ledger. Records may
    /// arrive in any order: per assignment the highest version is current and
    /// every version becomes part of its history. Committed assignments take
    /// their truck slot and job claim back, and new ids continue after the
    /// largest one seen. Nothing is written to the sink.
    ///
    /// On error the ledger is partially loaded and must be discarded.
    #[instrument(level = "info", skip_all)]
    pub fn replay(
        &self,
        records: impl IntoIterator<Item = AssignmentRecord>,
    ) -> Result<usize, ReplayError> {
        let mut revisions: BTreeMap<AssignmentId, BTreeMap<Version, Assignment>> = BTreeMap::new();
        for record in records {
            let assignment = record
                .to_assignment()
                .map_err(|source| ReplayError::InvalidWindow {
                    assignment: record.id,
                    version: record.version,
                    source,
                })?;
            revisions
                .entry(assignment.id)
                .or_default()
                .insert(assignment.version, assignment);
        }

        let mut restored = Vec::with_capacity(revisions.len());
        for versions in revisions.into_values() {
            let mut versions = versions.into_values();
            let Some(first) = versions.next() else {
                continue;
            };
            let mut entry = LedgerEntry::new(first);
            versions.for_each(|assignment| entry.advance(assignment));

            let current = &entry.current;
            if current.is_committed() {
                self.index
                    .insert(current)
                    .map_err(|conflicting| overlap(&current.truck_id, &current.window, conflicting))?;
                self.claim_job(&current.job_id, current.id, None)?;
            }
            restored.push(entry);
        }

        let replayed = restored.len();
        if let Some(highest) = restored.iter().map(|entry| entry.current.id.0).max() {
            self.next_id.fetch_max(highest + 1, Ordering::Relaxed);
        }
        write(&self.entries).extend(restored.into_iter().map(|entry| (entry.current.id, entry)));

        event!(Level::INFO, replayed, "assignment ledger replayed");
        Ok(replayed)
    }

    pub fn get(&self, assignment_id: AssignmentId) -> Result<Assignment, SchedulingError> {
        read(&self.entries)
            .get(&assignment_id)
            .map(|entry| entry.current.clone())
            .ok_or(SchedulingError::NotFound(EntityRef::Assignment(assignment_id)))
    }

    pub fn history(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<AssignmentRevision>, SchedulingError> {
        read(&self.entries)
            .get(&assignment_id)
            .map(|entry| entry.history.clone())
            .ok_or(SchedulingError::NotFound(EntityRef::Assignment(assignment_id)))
    }

    /// Matching assignments ordered by window start, then id.
    pub fn list(&self, filter: &AssignmentFilter) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = read(&self.entries)
            .values()
            .map(|entry| &entry.current)
            .filter(|assignment| filter.matches(assignment))
            .cloned()
            .collect();
        assignments.sort_by_key(|assignment| (assignment.window.start(), assignment.id));
        assignments
    }

    pub fn committed_windows(&self, truck_id: &TruckId) -> Vec<(AssignmentId, TimeWindow)> {
        self.index.committed_windows(truck_id)
    }

    pub fn overlapping(&self, truck_id: &TruckId, window: &TimeWindow) -> Vec<AssignmentId> {
        self.index.query(truck_id, window)
    }

    pub fn committed_assignment_for(&self, job_id: &JobId) -> Option<AssignmentId> {
        lock(&self.job_claims).get(job_id).copied()
    }

    /// Validates `current` against the claimed job and places it on the
    /// locked timeline.
    fn commit_claimed(
        &self,
        timeline: &mut TruckTimeline,
        current: &Assignment,
        truck: &Truck,
    ) -> Result<Assignment, SchedulingError> {
        let job = self.job(&current.job_id)?;
        within_tolerance(&current.window, &job, self.window_tolerance)?;
        evaluate(current, truck, &job)?;

        let committed = transition(current, AssignmentStatus::Committed)?;
        timeline
            .insert(committed.id, committed.window)
            .map_err(|conflicting| overlap(&committed.truck_id, &committed.window, conflicting))?;
        Ok(committed)
    }

    fn allocate_id(&self) -> AssignmentId {
        AssignmentId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn truck(&self, truck_id: &TruckId) -> Result<Truck, SchedulingError> {
        self.reference
            .truck(truck_id)
            .ok_or_else(|| SchedulingError::NotFound(EntityRef::Truck(truck_id.clone())))
    }

    fn job(&self, job_id: &JobId) -> Result<Job, SchedulingError> {
        self.reference
            .job(job_id)
            .ok_or_else(|| SchedulingError::NotFound(EntityRef::Job(job_id.clone())))
    }

    fn advance(&self, assignment: Assignment) {
        if let Some(entry) = write(&self.entries).get_mut(&assignment.id) {
            entry.advance(assignment);
        }
    }

    /// Claims `job_id` for `claimant`. The claim may only be taken over from
    /// `replacing`, any other holder means the job is committed elsewhere.
    fn claim_job(
        &self,
        job_id: &JobId,
        claimant: AssignmentId,
        replacing: Option<AssignmentId>,
    ) -> Result<(), SchedulingError> {
        let mut claims = lock(&self.job_claims);
        if let Some(holder) = claims.get(job_id) {
            if Some(*holder) != replacing && *holder != claimant {
                return Err(SchedulingError::JobAlreadyCommitted {
                    job: job_id.clone(),
                    assignment: *holder,
                });
            }
        }
        claims.insert(job_id.clone(), claimant);
        Ok(())
    }

    fn release_job(&self, job_id: &JobId, holder: AssignmentId) {
        let mut claims = lock(&self.job_claims);
        if claims.get(job_id) == Some(&holder) {
            claims.remove(job_id);
        }
    }

    fn set_job_claim(&self, job_id: &JobId, holder: Option<AssignmentId>) {
        let mut claims = lock(&self.job_claims);
        match holder {
            Some(holder) => {
                claims.insert(job_id.clone(), holder);
            }
            None => {
                claims.remove(job_id);
            }
        }
    }

    fn persist(&self, assignment: &Assignment) {
        if let Err(error) = self.sink.persist(&AssignmentRecord::from(assignment)) {
            event!(
                Level::WARN,
                assignment = %assignment.id,
                version = %assignment.version,
                error = %error,
                "assignment revision was not persisted"
            );
        }
    }
}

fn check_version(current: &Assignment, expected: Version) -> Result<(), SchedulingError> {
    if current.version != expected {
        return Err(SchedulingError::VersionConflict {
            assignment: current.id,
            expected,
            current: current.version,
        });
    }
    Ok(())
}

fn check_transition(current: &Assignment, to: AssignmentStatus) -> Result<(), SchedulingError> {
    if !current.status.can_transition_to(to) {
        return Err(SchedulingError::InvalidTransition {
            assignment: current.id,
            from: current.status,
            to,
        });
    }
    Ok(())
}

fn transition(current: &Assignment, to: AssignmentStatus) -> Result<Assignment, SchedulingError> {
    current
        .transitioned(to, Utc::now())
        .ok_or(SchedulingError::InvalidTransition {
            assignment: current.id,
            from: current.status,
            to,
        })
}

fn overlap(truck_id: &TruckId, window: &TimeWindow, conflicting: Vec<AssignmentId>) -> SchedulingError {
    SchedulingError::OverlapDetected {
        truck: truck_id.clone(),
        window: *window,
        conflicting,
    }
}

type SectionGuard<'a> = MutexGuard<'a, TruckTimeline>;

/// Locks the sections of both trucks in ascending truck id order. When both
/// ids name the same truck only one guard is returned.
fn lock_sections<'a>(
    old_truck: &TruckId,
    old_section: &'a Mutex<TruckTimeline>,
    new_truck: &TruckId,
    new_section: &'a Mutex<TruckTimeline>,
) -> (SectionGuard<'a>, Option<SectionGuard<'a>>) {
    if old_truck == new_truck {
        (lock(old_section), None)
    } else if old_truck < new_truck {
        let old_guard = lock(old_section);
        let new_guard = lock(new_section);
        (old_guard, Some(new_guard))
    } else {
        let new_guard = lock(new_section);
        let old_guard = lock(old_section);
        (old_guard, Some(new_guard))
    }
}
