pub mod planning;

use std::sync::Arc;

use axum::Router;
use axum::routing::put;
use haulplan_orchestrator::Scheduler;

use crate::handlers::system_handlers::set_log_filter;

pub fn api_scope(scheduler: Arc<Scheduler>) -> Router
{
    Router::new()
        .nest("/planning", planning::planning_api_scope(scheduler.clone()))
        .route("/logging/filter", put(set_log_filter))
        .with_state(scheduler)
}
