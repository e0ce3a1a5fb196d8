pub mod database;
pub mod logging;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use arc_swap::ArcSwap;
use haulplan_configuration::SystemConfigurations;
use haulplan_configuration::scheduling::SchedulingConfiguration;
use haulplan_contracts::truck_assignment::responses::FeasibleTruck;
use haulplan_contracts::truck_assignment::responses::FeasibleTrucksResponse;
use haulplan_scheduling_engine::AssignmentFilter;
use haulplan_scheduling_engine::AssignmentLedger;
use haulplan_scheduling_engine::AssignmentSink;
use haulplan_scheduling_engine::ReassignTarget;
use haulplan_scheduling_engine::Reassignment;
use haulplan_scheduling_engine::RetryHint;
use haulplan_scheduling_engine::SchedulingError;
use haulplan_scheduling_engine::error::EntityRef;
use haulplan_scheduling_engine::feasibility::evaluate_window;
use haulplan_scheduling_engine::feasibility::within_tolerance;
use haulplan_scheduling_environment::SchedulingEnvironment;
use haulplan_scheduling_environment::assignment::Assignment;
use haulplan_scheduling_environment::assignment::AssignmentId;
use haulplan_scheduling_environment::assignment::AssignmentRevision;
use haulplan_scheduling_environment::assignment::AssignmentStatus;
use haulplan_scheduling_environment::assignment::Version;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use itertools::Itertools;
use tracing::Level;
use tracing::event;
use tracing::instrument;

use self::database::JsonLinesSink;
use self::logging::LogHandles;

/// Entry point for everything that plans trucks. The HTTP layer only ever
/// talks to this type.
pub struct Scheduler {
    scheduling_environment: Arc<Mutex<SchedulingEnvironment>>,
    ledger: AssignmentLedger,
    log_handles: Option<LogHandles>,
}

impl Scheduler {
    pub fn new(
        scheduling_environment: Arc<Mutex<SchedulingEnvironment>>,
        sink: Arc<dyn AssignmentSink>,
        scheduling_configuration: &SchedulingConfiguration,
    ) -> Self {
        let ledger = AssignmentLedger::new(
            scheduling_environment.clone(),
            sink,
            scheduling_configuration.window_tolerance(),
        );

        Self {
            scheduling_environment,
            ledger,
            log_handles: None,
        }
    }

    /// Loads the reference data, replays the assignment log named in the
    /// configuration and keeps appending to it.
    pub fn from_configurations(
        system_configurations: &Arc<ArcSwap<SystemConfigurations>>,
    ) -> Result<Self> {
        let system_configurations = system_configurations.load();
        let data_locations = &system_configurations.data_locations;

        let scheduling_environment =
            database::load_scheduling_environment(&data_locations.reference_data)
                .context("the scheduler needs its reference data")?;
        let records = database::read_assignment_log(&data_locations.assignment_log)?;
        let sink = JsonLinesSink::open(&data_locations.assignment_log)?;
        let assignment_log = sink.path().to_path_buf();

        let scheduler = Self::new(
            scheduling_environment,
            Arc::new(sink),
            &system_configurations.scheduling,
        );
        let replayed = scheduler.ledger.replay(records).with_context(|| {
            format!("could not replay assignment log {}", assignment_log.display())
        })?;

        event!(
            Level::INFO,
            assignment_log = %assignment_log.display(),
            replayed,
            window_tolerance_minutes = system_configurations.scheduling.window_tolerance_minutes,
            "scheduler initialized"
        );
        Ok(scheduler)
    }

    pub fn with_log_handles(mut self, log_handles: LogHandles) -> Self {
        self.log_handles = Some(log_handles);
        self
    }

    pub fn list_assignments(&self, filter: &AssignmentFilter) -> Vec<Assignment> {
        self.ledger.list(filter)
    }

    pub fn get_assignment(&self, assignment_id: AssignmentId) -> Result<Assignment, SchedulingError> {
        self.ledger.get(assignment_id)
    }

    pub fn assignment_history(
        &self,
        assignment_id: AssignmentId,
    ) -> Result<Vec<AssignmentRevision>, SchedulingError> {
        self.ledger.history(assignment_id)
    }

    pub fn propose_assignment(
        &self,
        job_id: &JobId,
        truck_id: &TruckId,
        window: TimeWindow,
    ) -> Result<Assignment, SchedulingError> {
        self.ledger.propose(job_id, truck_id, window)
    }

    pub fn commit_assignment(
        &self,
        assignment_id: AssignmentId,
        version: Version,
    ) -> Result<Assignment, SchedulingError> {
        self.ledger.commit(assignment_id, version)
    }

    pub fn cancel_assignment(
        &self,
        assignment_id: AssignmentId,
        version: Version,
    ) -> Result<Assignment, SchedulingError> {
        self.ledger.cancel(assignment_id, version)
    }

    pub fn reassign_assignment(
        &self,
        assignment_id: AssignmentId,
        target: ReassignTarget,
        version: Version,
    ) -> Result<Reassignment, SchedulingError> {
        self.ledger.reassign(assignment_id, target, version)
    }

    /// Cancels whatever version is current. Deleting an assignment that is
    /// already cancelled returns it unchanged.
    #[instrument(level = "info", skip(self), fields(assignment = %assignment_id))]
    pub fn delete_assignment(&self, assignment_id: AssignmentId) -> Result<Assignment, SchedulingError> {
        loop {
            let current = self.ledger.get(assignment_id)?;
            if current.status == AssignmentStatus::Cancelled {
                return Ok(current);
            }

            match self.ledger.cancel(assignment_id, current.version) {
                Err(scheduling_error) if scheduling_error.retry_hint() == RetryHint::RefetchAndRetry => {
                    event!(
                        Level::DEBUG,
                        error = %scheduling_error,
                        "assignment changed during delete, retrying"
                    );
                }
                result => return result,
            }
        }
    }

    pub fn committed_windows(
        &self,
        truck_id: &TruckId,
    ) -> Result<Vec<(AssignmentId, TimeWindow)>, SchedulingError> {
        if self.ledger.reference().truck(truck_id).is_none() {
            return Err(SchedulingError::NotFound(EntityRef::Truck(truck_id.clone())));
        }
        Ok(self.ledger.committed_windows(truck_id))
    }

    /// Trucks that could take the job in `window` (the requested window when
    /// `None`) without any conflict, tightest fit first.
    #[instrument(level = "info", skip(self), fields(job = %job_id))]
    pub fn feasible_trucks(
        &self,
        job_id: &JobId,
        window: Option<TimeWindow>,
    ) -> Result<FeasibleTrucksResponse, SchedulingError> {
        let job = self
            .ledger
            .reference()
            .job(job_id)
            .ok_or_else(|| SchedulingError::NotFound(EntityRef::Job(job_id.clone())))?;
        let window = window.unwrap_or(job.requested_window);
        within_tolerance(&window, &job, self.ledger.window_tolerance())?;

        let trucks = self
            .ledger
            .reference()
            .trucks()
            .into_iter()
            .filter(|truck| evaluate_window(&window, truck, &job).is_ok())
            .filter(|truck| self.ledger.overlapping(&truck.id, &window).is_empty())
            .filter_map(|truck| {
                let spare_capacity = truck.capacity.spare_for(&job.required_capacity)?;
                Some(FeasibleTruck {
                    truck_id: truck.id,
                    capacity: truck.capacity,
                    spare_capacity,
                })
            })
            .sorted_by(|left, right| {
                left.spare_capacity
                    .cmp(&right.spare_capacity)
                    .then_with(|| left.truck_id.cmp(&right.truck_id))
            })
            .collect();

        Ok(FeasibleTrucksResponse {
            job_id: job.id,
            window,
            trucks,
        })
    }

    /// Inserts or replaces a job. A job with a committed assignment is
    /// frozen until that assignment is cancelled.
    #[instrument(level = "info", skip_all, fields(job = %job.id))]
    pub fn update_job(&self, job: Job) -> Result<Option<Job>, SchedulingError> {
        let mut scheduling_environment = self
            .scheduling_environment
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(assignment) = self.ledger.committed_assignment_for(&job.id) {
            return Err(SchedulingError::JobLocked {
                job: job.id,
                assignment,
            });
        }

        Ok(scheduling_environment.jobs.insert(job))
    }

    pub fn set_log_filter(&self, directives: &str) -> Result<()> {
        match &self.log_handles {
            Some(log_handles) => log_handles.set_file_filter(directives),
            None => bail!("logging was not set up for this scheduler"),
        }
    }
}
