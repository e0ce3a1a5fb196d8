#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::TimeZone;
use chrono::Utc;
use haulplan_scheduling_engine::AssignmentLedger;
use haulplan_scheduling_engine::sink::InMemorySink;
use haulplan_scheduling_environment::SchedulingEnvironment;
use haulplan_scheduling_environment::fleet_environment::Truck;
use haulplan_scheduling_environment::fleet_environment::TruckId;
use haulplan_scheduling_environment::fleet_environment::capacity::Capacity;
use haulplan_scheduling_environment::job_environment::Job;
use haulplan_scheduling_environment::job_environment::JobId;
use haulplan_scheduling_environment::job_environment::Priority;
use haulplan_scheduling_environment::material::MaterialProfileId;
use haulplan_scheduling_environment::time_environment::AvailabilityWindows;
use haulplan_scheduling_environment::time_environment::TimeWindow;
use rust_decimal::Decimal;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn window(start: u32, end: u32) -> TimeWindow {
    TimeWindow::new(at(start, 0), at(end, 0)).unwrap()
}

pub fn truck(id: &str, tonnes: i64, profiles: &[&str]) -> Truck {
    Truck::new(
        TruckId::new(id),
        Capacity::tonnes(Decimal::from(tonnes)).unwrap(),
        profiles.iter().map(|profile| MaterialProfileId::new(*profile)),
        AvailabilityWindows::new(vec![window(6, 20)]).unwrap(),
    )
}

pub fn job(id: &str, tonnes: i64, profile: &str, requested: TimeWindow) -> Job {
    Job::new(
        JobId::new(id),
        MaterialProfileId::new(profile),
        Capacity::tonnes(Decimal::from(tonnes)).unwrap(),
        requested,
        Priority::default(),
    )
}

/// Truck T with 10 t capacity carrying profile P1 from 06:00 to 20:00, and
/// the jobs used throughout the ledger scenarios.
pub fn yard() -> Arc<Mutex<SchedulingEnvironment>> {
    SchedulingEnvironment::builder()
        .trucks([truck("T", 10, &["P1"]), truck("U", 10, &["P1"])])
        .jobs([
            job("J1", 6, "P1", window(9, 11)),
            job("J2", 6, "P1", window(10, 12)),
            job("J3", 6, "P2", window(13, 14)),
            job("J4", 4, "P1", window(11, 13)),
        ])
        .build()
}

pub fn ledger() -> (AssignmentLedger, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::default());
    let ledger = AssignmentLedger::new(yard(), sink.clone(), TimeDelta::minutes(30));
    (ledger, sink)
}
