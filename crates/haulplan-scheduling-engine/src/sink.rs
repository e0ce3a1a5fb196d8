use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use haulplan_scheduling_environment::time_environment::TimeWindowError;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::lock;

/// Row written to the durable store for every assignment revision. The
/// store itself belongs to the surrounding application, this is the schema
/// it has to accept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: AssignmentId,
    pub job_id: JobId,
    pub truck_id: TruckId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub version: Version,
    pub status: AssignmentStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&Assignment> for AssignmentRecord {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id,
            job_id: assignment.job_id.clone(),
            truck_id: assignment.truck_id.clone(),
            window_start: assignment.window.start(),
            window_end: assignment.window.end(),
            version: assignment.version,
            status: assignment.status,
            updated_at: assignment.updated_at,
        }
    }
}

impl AssignmentRecord {
    pub fn to_assignment(&self) -> Result<Assignment, TimeWindowError> {
        Ok(Assignment {
            id: self.id,
            job_id: self.job_id.clone(),
            truck_id: self.truck_id.clone(),
            window: TimeWindow::new(self.window_start, self.window_end)?,
            version: self.version,
            status: self.status,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Error)]
#[error("could not persist revision {version} of assignment {assignment}")]
pub struct SinkError {
    pub assignment: AssignmentId,
    pub version: Version,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Durable store for assignment revisions.
///
/// Records are handed over after the truck's section is released, so two
/// revisions of the same assignment can arrive out of order. A store must
/// treat the record with the highest `version` as current, never the last
/// one received.
#[cfg_attr(test, mockall::automock)]
pub trait AssignmentSink: Send + Sync {
    fn persist(&self, record: &AssignmentRecord) -> Result<(), SinkError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AssignmentSink for NullSink {
    fn persist(&self, _record: &AssignmentRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every persisted record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Vec<AssignmentRecord>>,
}

impl InMemorySink {
    pub fn records(&self) -> Vec<AssignmentRecord> {
        lock(&self.records).clone()
    }
}

impl AssignmentSink for InMemorySink {
    fn persist(&self, record: &AssignmentRecord) -> Result<(), SinkError> {
        lock(&self.records).push(record.clone());
        Ok(())
    }
}
