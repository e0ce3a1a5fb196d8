use chrono::DateTime;
use chrono::Utc;
use haulplan_scheduling_engine::Reassignment;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::fleet_environment::capacity::Capacity;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResponse
{
    pub id: AssignmentId,
    pub job_id: JobId,
    pub truck_id: TruckId,
    pub window: TimeWindow,
    pub version: Version,
    pub status: AssignmentStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentResponse
{
    fn from(assignment: Assignment) -> Self
    {
        Self {
            id: assignment.id,
            job_id: assignment.job_id,
            truck_id: assignment.truck_id,
            window: assignment.window,
            version: assignment.version,
            status: assignment.status,
            updated_at: assignment.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReassignmentResponse
{
    pub cancelled: AssignmentResponse,
    pub replacement: AssignmentResponse,
}

impl From<Reassignment> for ReassignmentResponse
{
    fn from(reassignment: Reassignment) -> Self
    {
        Self {
            cancelled: reassignment.cancelled.into(),
            replacement: reassignment.replacement.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommittedWindow
{
    pub assignment_id: AssignmentId,
    pub window: TimeWindow,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommittedWindowsResponse
{
    pub truck_id: TruckId,
    pub windows: Vec<CommittedWindow>,
}

impl CommittedWindowsResponse
{
    pub fn new(truck_id: TruckId, windows: Vec<(AssignmentId, TimeWindow)>) -> Self
    {
        Self {
            truck_id,
            windows: windows
                .into_iter()
                .map(|(assignment_id, window)| CommittedWindow {
                    assignment_id,
                    window,
                })
                .collect(),
        }
    }
}

/// A truck that could take the job right now, together with the capacity it
/// would leave unused.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeasibleTruck
{
    pub truck_id: TruckId,
    pub capacity: Capacity,
    pub spare_capacity: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FeasibleTrucksResponse
{
    pub job_id: JobId,
    pub window: TimeWindow,
    pub trucks: Vec<FeasibleTruck>,
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_committed_windows_response_shape()
    {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
        )
        .unwrap();

        let response =
            CommittedWindowsResponse::new(TruckId::new("T"), vec![(AssignmentId(3), window)]);

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "truck_id": "T",
                "windows": [{
                    "assignment_id": 3,
                    "window": { "start": "2026-03-02T09:00:00Z", "end": "2026-03-02T11:00:00Z" },
                }],
            })
        );
    }
}
