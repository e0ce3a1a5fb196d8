use std::collections::BTreeSet;
use std::fmt;

use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::fleet_environment::capacity::Capacity;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::material::MaterialProfileId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use haulplan_scheduling_environment::time_environment::TimeWindowError;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

/// Reasons a candidate can never be committed, regardless of what else is
/// on the truck's timeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Infeasibility {
    #[error("truck capacity {available} cannot carry the required {required}")]
    CapacityExceeded {
        required: Capacity,
        available: Capacity,
    },
    #[error("job requires material profile {required}, the truck supports {supported:?}")]
    ProfileMismatch {
        required: MaterialProfileId,
        supported: BTreeSet<MaterialProfileId>,
    },
    #[error("window {window} is outside the availability of truck {truck}")]
    OutsideAvailability { truck: TruckId, window: TimeWindow },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Assignment(AssignmentId),
    Job(JobId),
    Truck(TruckId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Assignment(id) => write!(f, "assignment {}", id),
            EntityRef::Job(id) => write!(f, "job {}", id),
            EntityRef::Truck(id) => write!(f, "truck {}", id),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error(transparent)]
    Infeasible(#[from] Infeasibility),
    #[error("window {window} on truck {truck} overlaps committed assignments {conflicting:?}")]
    OverlapDetected {
        truck: TruckId,
        window: TimeWindow,
        conflicting: Vec<AssignmentId>,
    },
    #[error("assignment {assignment} is at {current}, the request expected {expected}")]
    VersionConflict {
        assignment: AssignmentId,
        expected: Version,
        current: Version,
    },
    #[error("{0} was not found")]
    NotFound(EntityRef),
    #[error(
        "window {window} deviates from the requested window {requested} by more than {tolerance_minutes} minutes"
    )]
    InvalidWindow {
        window: TimeWindow,
        requested: TimeWindow,
        tolerance_minutes: i64,
    },
    #[error("job {job} is already committed through assignment {assignment}")]
    JobAlreadyCommitted {
        job: JobId,
        assignment: AssignmentId,
    },
    #[error("assignment {assignment} cannot move from {from} to {to}")]
    InvalidTransition {
        assignment: AssignmentId,
        from: AssignmentStatus,
        to: AssignmentStatus,
    },
    #[error("job {job} cannot be edited while assignment {assignment} is committed")]
    JobLocked {
        job: JobId,
        assignment: AssignmentId,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    CapacityExceeded,
    ProfileMismatch,
    OutsideAvailability,
    OverlapDetected,
    VersionConflict,
    NotFound,
    InvalidWindow,
    JobAlreadyCommitted,
    InvalidTransition,
    JobLocked,
}

/// Persisted records that cannot be loaded back into a ledger.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("revision {version} of assignment {assignment} has an invalid window")]
    InvalidWindow {
        assignment: AssignmentId,
        version: Version,
        #[source]
        source: TimeWindowError,
    },
    #[error("replayed assignments are inconsistent")]
    Inconsistent(#[from] SchedulingError),
}

/// What a caller is expected to do after a rejection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RetryHint {
    Permanent,
    ChooseDifferentSlot,
    RefetchAndRetry,
}

impl SchedulingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulingError::Infeasible(Infeasibility::CapacityExceeded { .. }) => {
                ErrorKind::CapacityExceeded
            }
            SchedulingError::Infeasible(Infeasibility::ProfileMismatch { .. }) => {
                ErrorKind::ProfileMismatch
            }
            SchedulingError::Infeasible(Infeasibility::OutsideAvailability { .. }) => {
                ErrorKind::OutsideAvailability
            }
            SchedulingError::OverlapDetected { .. } => ErrorKind::OverlapDetected,
            SchedulingError::VersionConflict { .. } => ErrorKind::VersionConflict,
            SchedulingError::NotFound(_) => ErrorKind::NotFound,
            SchedulingError::InvalidWindow { .. } => ErrorKind::InvalidWindow,
            SchedulingError::JobAlreadyCommitted { .. } => ErrorKind::JobAlreadyCommitted,
            SchedulingError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            SchedulingError::JobLocked { .. } => ErrorKind::JobLocked,
        }
    }

    pub fn retry_hint(&self) -> RetryHint {
        self.kind().retry_hint()
    }
}

impl ErrorKind {
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            ErrorKind::CapacityExceeded
            | ErrorKind::ProfileMismatch
            | ErrorKind::OutsideAvailability
            | ErrorKind::InvalidWindow
            | ErrorKind::NotFound
            | ErrorKind::JobLocked
            | ErrorKind::InvalidTransition => RetryHint::Permanent,
            ErrorKind::OverlapDetected => RetryHint::ChooseDifferentSlot,
            ErrorKind::VersionConflict | ErrorKind::JobAlreadyCommitted => {
                RetryHint::RefetchAndRetry
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use haulplan_scheduling_environment::assignment::AssignmentId;
    use haulplan_scheduling_environment::assignment::Version;

    use super::*;

    #[test]
    fn test_version_conflict_asks_for_refetch() {
        let error = SchedulingError::VersionConflict {
            assignment: AssignmentId(4),
            expected: Version(1),
            current: Version(2),
        };

        assert_eq!(error.kind(), ErrorKind::VersionConflict);
        assert_eq!(error.retry_hint(), RetryHint::RefetchAndRetry);
        assert_eq!(
            error.to_string(),
            "assignment A-4 is at v2, the request expected v1"
        );
    }

    #[test]
    fn test_leaving_cancelled_is_permanent() {
        let error = SchedulingError::InvalidTransition {
            assignment: AssignmentId(4),
            from: AssignmentStatus::Cancelled,
            to: AssignmentStatus::Committed,
        };

        assert_eq!(error.kind(), ErrorKind::InvalidTransition);
        assert_eq!(error.retry_hint(), RetryHint::Permanent);
    }

    #[test]
    fn test_not_found_names_the_entity() {
        let error = SchedulingError::NotFound(EntityRef::Truck(TruckId::new("T-9")));

        assert_eq!(error.to_string(), "truck T-9 was not found");
        assert_eq!(error.retry_hint(), RetryHint::Permanent);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        assert_eq!(ErrorKind::OverlapDetected.to_string(), "overlap_detected");
    }
}
