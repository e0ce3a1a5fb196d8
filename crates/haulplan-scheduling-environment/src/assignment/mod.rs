use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

use crate::fleet_environment::TruckId;
use crate::job_environment::JobId;
use crate::time_environment::TimeWindow;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub u64);

impl fmt::Display for AssignmentId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "A-{}", self.0)
    }
}

/// Revision counter used for optimistic concurrency. Every status transition
/// produces the next version.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version
{
    pub const INITIAL: Version = Version(1);

    pub fn next(&self) -> Version
    {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "v{}", self.0)
    }
}

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus
{
    Proposed,
    Committed,
    Cancelled,
}

impl AssignmentStatus
{
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool
    {
        matches!(
            (self, next),
            (AssignmentStatus::Proposed, AssignmentStatus::Committed)
                | (AssignmentStatus::Proposed, AssignmentStatus::Cancelled)
                | (AssignmentStatus::Committed, AssignmentStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool
    {
        matches!(self, AssignmentStatus::Cancelled)
    }
}

/// Binding of one job to one truck for one window. Values are never mutated
/// in place, transitions produce a new value with the next version.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Assignment
{
    pub id: AssignmentId,
    pub job_id: JobId,
    pub truck_id: TruckId,
    pub window: TimeWindow,
    pub version: Version,
    pub status: AssignmentStatus,
    pub updated_at: DateTime<Utc>,
}

impl Assignment
{
    pub fn proposed(
        id: AssignmentId,
        job_id: JobId,
        truck_id: TruckId,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Self
    {
        Self {
            id,
            job_id,
            truck_id,
            window,
            version: Version::INITIAL,
            status: AssignmentStatus::Proposed,
            updated_at: now,
        }
    }

    /// Returns `None` when the state machine does not allow the transition.
    pub fn transitioned(&self, status: AssignmentStatus, now: DateTime<Utc>) -> Option<Assignment>
    {
        if !self.status.can_transition_to(status) {
            return None;
        }
        Some(Assignment {
            version: self.version.next(),
            status,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn is_committed(&self) -> bool
    {
        self.status == AssignmentStatus::Committed
    }
}

impl fmt::Display for Assignment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{} ({}) job {} on truck {} {} [{}]",
            self.id, self.version, self.job_id, self.truck_id, self.window, self.status
        )
    }
}

/// Snapshot of an assignment at one version, kept in the ledger history.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AssignmentRevision
{
    pub version: Version,
    pub status: AssignmentStatus,
    pub truck_id: TruckId,
    pub window: TimeWindow,
    pub recorded_at: DateTime<Utc>,
}

impl From<&Assignment> for AssignmentRevision
{
    fn from(assignment: &Assignment) -> Self
    {
        Self {
            version: assignment.version,
            status: assignment.status,
            truck_id: assignment.truck_id.clone(),
            window: assignment.window,
            recorded_at: assignment.updated_at,
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::str::FromStr;

    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    use super::*;

    fn proposal() -> Assignment
    {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
        Assignment::proposed(
            AssignmentId(7),
            JobId::new("J1"),
            TruckId::new("T"),
            TimeWindow::new(start, end).unwrap(),
            start,
        )
    }

    #[test]
    fn test_cancelled_is_terminal()
    {
        for next in AssignmentStatus::iter() {
            assert!(!AssignmentStatus::Cancelled.can_transition_to(next));
        }
        assert!(!AssignmentStatus::Committed.can_transition_to(AssignmentStatus::Proposed));
        assert!(!AssignmentStatus::Committed.can_transition_to(AssignmentStatus::Committed));
    }

    #[test]
    fn test_transition_bumps_version()
    {
        let proposed = proposal();
        let committed = proposed
            .transitioned(AssignmentStatus::Committed, proposed.updated_at)
            .unwrap();

        assert_eq!(proposed.version, Version::INITIAL);
        assert_eq!(committed.version, Version(2));
        assert!(committed.is_committed());
        assert_eq!(committed.window, proposed.window);

        let cancelled = committed
            .transitioned(AssignmentStatus::Cancelled, committed.updated_at)
            .unwrap();
        assert_eq!(cancelled.version, Version(3));
        assert!(
            cancelled
                .transitioned(AssignmentStatus::Committed, cancelled.updated_at)
                .is_none()
        );
    }

    #[test]
    fn test_status_round_trips_through_strings()
    {
        assert_eq!(AssignmentStatus::Committed.to_string(), "committed");
        assert_eq!(
            AssignmentStatus::from_str("cancelled").unwrap(),
            AssignmentStatus::Cancelled
        );
    }
}
