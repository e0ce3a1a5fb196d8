use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use haulplan_contracts::truck_assignment::requests::AssignmentQuery;
use haulplan_contracts::truck_assignment::requests::ProposeAssignmentRequest;
use haulplan_contracts::truck_assignment::requests::ReassignRequest;
use haulplan_contracts::truck_assignment::requests::VersionedRequest;
use haulplan_contracts::truck_assignment::requests::WindowQuery;
use haulplan_contracts::truck_assignment::responses::AssignmentResponse;
use haulplan_contracts::truck_assignment::responses::CommittedWindowsResponse;
use haulplan_contracts::truck_assignment::responses::FeasibleTrucksResponse;
use haulplan_contracts::truck_assignment::responses::ReassignmentResponse;
use haulplan_orchestrator::Scheduler;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentRevision;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::job_environment::JobId;

use crate::routes::api::AppError;

pub async fn list_truck_assignments(
    State(scheduler): State<Arc<Scheduler>>,
    Query(query): Query<AssignmentQuery>,
) -> Json<Vec<AssignmentResponse>>
{
    let assignments = scheduler
        .list_assignments(&query.into())
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Json(assignments)
}

pub async fn get_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<AssignmentResponse>, AppError>
{
    let assignment = scheduler.get_assignment(assignment_id)?;
    Ok(Json(assignment.into()))
}

pub async fn truck_assignment_history(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<Vec<AssignmentRevision>>, AppError>
{
    Ok(Json(scheduler.assignment_history(assignment_id)?))
}

pub async fn propose_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Json(request): Json<ProposeAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), AppError>
{
    let assignment =
        scheduler.propose_assignment(&request.job_id, &request.truck_id, request.window)?;

    Ok((StatusCode::CREATED, Json(assignment.into())))
}

pub async fn commit_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
    Json(request): Json<VersionedRequest>,
) -> Result<Json<AssignmentResponse>, AppError>
{
    let assignment = scheduler.commit_assignment(assignment_id, request.version)?;
    Ok(Json(assignment.into()))
}

pub async fn cancel_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
    Json(request): Json<VersionedRequest>,
) -> Result<Json<AssignmentResponse>, AppError>
{
    let assignment = scheduler.cancel_assignment(assignment_id, request.version)?;
    Ok(Json(assignment.into()))
}

pub async fn reassign_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<ReassignmentResponse>, AppError>
{
    let reassignment =
        scheduler.reassign_assignment(assignment_id, request.target(), request.version)?;

    Ok(Json(reassignment.into()))
}

pub async fn delete_truck_assignment(
    State(scheduler): State<Arc<Scheduler>>,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<AssignmentResponse>, AppError>
{
    let assignment = scheduler.delete_assignment(assignment_id)?;
    Ok(Json(assignment.into()))
}

pub async fn truck_committed_windows(
    State(scheduler): State<Arc<Scheduler>>,
    Path(truck_id): Path<TruckId>,
) -> Result<Json<CommittedWindowsResponse>, AppError>
{
    let windows = scheduler.committed_windows(&truck_id)?;
    Ok(Json(CommittedWindowsResponse::new(truck_id, windows)))
}

pub async fn job_feasible_trucks(
    State(scheduler): State<Arc<Scheduler>>,
    Path(job_id): Path<JobId>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<FeasibleTrucksResponse>, AppError>
{
    let window = query
        .window()
        .map_err(|error| AppError::BadRequest(error.to_string()))?;

    Ok(Json(scheduler.feasible_trucks(&job_id, window)?))
}

pub async fn update_job(
    State(scheduler): State<Arc<Scheduler>>,
    Path(job_id): Path<JobId>,
    Json(job): Json<Job>,
) -> Result<Json<Job>, AppError>
{
    if job.id != job_id {
        return Err(AppError::BadRequest(format!(
            "the path names job {} but the body describes job {}",
            job_id, job.id
        )));
    }

    scheduler.update_job(job.clone())?;
    Ok(Json(job))
}
