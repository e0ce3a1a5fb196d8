use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use haulplan_orchestrator::Scheduler;
use serde::Deserialize;

use crate::routes::api::AppError;

#[derive(Debug, Deserialize)]
pub struct LogFilterRequest
{
    directives: String,
}

pub async fn set_log_filter(
    State(scheduler): State<Arc<Scheduler>>,
    Json(request): Json<LogFilterRequest>,
) -> Result<StatusCode, AppError>
{
    scheduler.set_log_filter(&request.directives)?;
    Ok(StatusCode::NO_CONTENT)
}
