//! Constraint evaluation for candidate assignments.
//!
//! Everything in here is a pure function of its arguments, so it is safe to
//! call from any number of threads and as often as needed.

use chrono::TimeDelta;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::fleet_environment::Truck;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::time_environment::TimeWindow;

use crate::error::Infeasibility;
use crate::error::SchedulingError;

pub type FeasibilityResult = Result<(), Infeasibility>;

/// Checks capacity, then material compatibility, then availability, and
/// stops at the first failure.
pub fn evaluate(candidate: &Assignment, truck: &Truck, job: &Job) -> FeasibilityResult {
    debug_assert_eq!(candidate.truck_id, truck.id);
    debug_assert_eq!(candidate.job_id, job.id);

    evaluate_window(&candidate.window, truck, job)
}

pub fn evaluate_window(window: &TimeWindow, truck: &Truck, job: &Job) -> FeasibilityResult {
    if !truck.capacity.accommodates(&job.required_capacity) {
        return Err(Infeasibility::CapacityExceeded {
            required: job.required_capacity,
            available: truck.capacity,
        });
    }

    if !truck.supports(&job.required_profile) {
        return Err(Infeasibility::ProfileMismatch {
            required: job.required_profile.clone(),
            supported: truck.supported_profiles.clone(),
        });
    }

    if !truck.availability.covers(window) {
        return Err(Infeasibility::OutsideAvailability {
            truck: truck.id.clone(),
            window: *window,
        });
    }

    Ok(())
}

/// The committed window may only drift from the requested one by the
/// configured tolerance, on each boundary separately.
pub fn within_tolerance(
    window: &TimeWindow,
    job: &Job,
    tolerance: TimeDelta,
) -> Result<(), SchedulingError> {
    if window.max_deviation_from(&job.requested_window) > tolerance {
        return Err(SchedulingError::InvalidWindow {
            window: *window,
            requested: job.requested_window,
            tolerance_minutes: tolerance.num_minutes(),
        });
    }
    Ok(())
}
