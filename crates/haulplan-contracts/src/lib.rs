//! Wire types shared by the HTTP surface and its clients.

pub mod truck_assignment;

use haulplan_scheduling_engine::ErrorKind;
use haulplan_scheduling_engine::RetryHint;
use haulplan_scheduling_engine::SchedulingError;
use serde::Deserialize;
use serde::Serialize;

pub use haulplan_scheduling_engine::AssignmentRecord;

/// Body of every rejected request. `kind` is absent for failures that are
/// not scheduling rejections, such as an unreadable request body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse
{
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryHint>,
    pub error: String,
}

impl ErrorResponse
{
    pub fn message(error: impl ToString) -> Self
    {
        Self {
            kind: None,
            retry: None,
            error: error.to_string(),
        }
    }
}

impl From<&SchedulingError> for ErrorResponse
{
    fn from(scheduling_error: &SchedulingError) -> Self
    {
        Self {
            kind: Some(scheduling_error.kind()),
            retry: Some(scheduling_error.retry_hint()),
            error: scheduling_error.to_string(),
        }
    }
}
