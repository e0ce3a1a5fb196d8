use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use haulplan_orchestrator::Scheduler;

use crate::handlers::truck_assignment_handlers::cancel_truck_assignment;
use crate::handlers::truck_assignment_handlers::commit_truck_assignment;
use crate::handlers::truck_assignment_handlers::delete_truck_assignment;
use crate::handlers::truck_assignment_handlers::get_truck_assignment;
use crate::handlers::truck_assignment_handlers::job_feasible_trucks;
use crate::handlers::truck_assignment_handlers::list_truck_assignments;
use crate::handlers::truck_assignment_handlers::propose_truck_assignment;
use crate::handlers::truck_assignment_handlers::reassign_truck_assignment;
use crate::handlers::truck_assignment_handlers::truck_assignment_history;
use crate::handlers::truck_assignment_handlers::truck_committed_windows;
use crate::handlers::truck_assignment_handlers::update_job;

pub fn planning_api_scope(state: Arc<Scheduler>) -> Router<Arc<Scheduler>>
{
    Router::new()
        .route(
            "/truck-assignments",
            get(list_truck_assignments).post(propose_truck_assignment),
        )
        .route(
            "/truck-assignments/{id}",
            get(get_truck_assignment).delete(delete_truck_assignment),
        )
        .route("/truck-assignments/{id}/history", get(truck_assignment_history))
        .route("/truck-assignments/{id}/commit", post(commit_truck_assignment))
        .route("/truck-assignments/{id}/cancel", post(cancel_truck_assignment))
        .route("/truck-assignments/{id}/reassign", post(reassign_truck_assignment))
        .route("/trucks/{id}/committed-windows", get(truck_committed_windows))
        .route("/jobs/{id}", put(update_job))
        .route("/jobs/{id}/feasible-trucks", get(job_feasible_trucks))
        .with_state(state)
}
