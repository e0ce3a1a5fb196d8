use chrono::DateTime;
use chrono::Utc;
use haulplan_scheduling_engine::AssignmentFilter;
use haulplan_scheduling_engine::ReassignTarget;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use haulplan_scheduling_environment::time_environment::TimeWindowError;
use serde::Deserialize;
use serde::Serialize;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProposeAssignmentRequest
{
    pub job_id: JobId,
    pub truck_id: TruckId,
    pub window: TimeWindow,
}

/// Commit and cancel only need the version the caller last observed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedRequest
{
    pub version: Version,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReassignRequest
{
    pub version: Version,
    #[serde(default)]
    pub truck_id: Option<TruckId>,
    #[serde(default)]
    pub window: Option<TimeWindow>,
}

impl ReassignRequest
{
    pub fn target(&self) -> ReassignTarget
    {
        ReassignTarget {
            truck_id: self.truck_id.clone(),
            window: self.window,
        }
    }
}

/// Query string of the assignment listing.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentQuery
{
    pub truck_id: Option<TruckId>,
    pub job_id: Option<JobId>,
    pub status: Option<AssignmentStatus>,
}

impl From<AssignmentQuery> for AssignmentFilter
{
    fn from(query: AssignmentQuery) -> Self
    {
        AssignmentFilter {
            truck_id: query.truck_id,
            job_id: query.job_id,
            status: query.status,
            overlapping: None,
        }
    }
}

/// Optional window for the feasible truck search. Without both bounds the
/// job's requested window is used.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowQuery
{
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl WindowQuery
{
    pub fn window(&self) -> Result<Option<TimeWindow>, TimeWindowError>
    {
        match (self.start, self.end) {
            (Some(start), Some(end)) => TimeWindow::new(start, end).map(Some),
            _ => Ok(None),
        }
    }
}
