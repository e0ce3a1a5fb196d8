pub mod v1;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use haulplan_contracts::ErrorResponse;
use haulplan_scheduling_engine::ErrorKind;
use haulplan_scheduling_engine::SchedulingError;
use thiserror::Error;
use tracing::Level;
use tracing::event;

#[derive(Debug, Error)]
pub enum AppError
{
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub fn status_code(kind: ErrorKind) -> StatusCode
{
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::VersionConflict
        | ErrorKind::OverlapDetected
        | ErrorKind::JobAlreadyCommitted
        | ErrorKind::JobLocked
        | ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::CapacityExceeded
        | ErrorKind::ProfileMismatch
        | ErrorKind::OutsideAvailability
        | ErrorKind::InvalidWindow => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for AppError
{
    fn into_response(self) -> axum::response::Response
    {
        match self {
            AppError::Scheduling(scheduling_error) => {
                event!(
                    Level::INFO,
                    kind = %scheduling_error.kind(),
                    error = %scheduling_error,
                    "request rejected"
                );
                (
                    status_code(scheduling_error.kind()),
                    Json(ErrorResponse::from(&scheduling_error)),
                )
                    .into_response()
            }
            AppError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::message(error))).into_response()
            }
            AppError::Anyhow(error) => {
                event!(Level::ERROR, error = ?error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::message(format!("{error:#}"))),
                )
                    .into_response()
            }
        }
    }
}
