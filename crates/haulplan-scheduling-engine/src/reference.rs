use std::sync::Mutex;

use haulplan_scheduling_environment::SchedulingEnvironment;
use haulplan_scheduling_environment::fleet_environment::Truck;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::job_environment::JobId;

use crate::lock;

/// Read access to the reference data owned by the surrounding application.
/// The ledger asks again on every operation instead of caching, so edits to
/// trucks and jobs are picked up by the next call.
pub trait ReferenceSource: Send + Sync {
    fn truck(&self, id: &TruckId) -> Option<Truck>;

    fn job(&self, id: &JobId) -> Option<Job>;

    fn trucks(&self) -> Vec<Truck>;
}

impl ReferenceSource for Mutex<SchedulingEnvironment> {
    fn truck(&self, id: &TruckId) -> Option<Truck> {
        lock(self).truck(id).cloned()
    }

    fn job(&self, id: &JobId) -> Option<Job> {
        lock(self).job(id).cloned()
    }

    fn trucks(&self) -> Vec<Truck> {
        lock(self).fleet.iter().cloned().collect()
    }
}
