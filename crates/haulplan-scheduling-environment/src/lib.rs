pub mod assignment;
pub mod fleet_environment;
pub mod job_environment;
pub mod material;
pub mod time_environment;

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use self::fleet_environment::Fleet;
use self::fleet_environment::Truck;
use self::fleet_environment::TruckId;
use self::job_environment::Job;
use self::job_environment::JobId;
use self::job_environment::Jobs;
use self::material::MaterialProfileId;
use self::material::MaterialProfiles;

/// Reference data the scheduling core reads from: trucks, jobs and material
/// profiles. The surrounding application owns and edits it.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct SchedulingEnvironment
{
    pub fleet: Fleet,
    pub jobs: Jobs,
    pub material_profiles: MaterialProfiles,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError
{
    #[error("truck {truck} supports unknown material profile {profile}")]
    UnknownTruckProfile
    {
        truck: TruckId,
        profile: MaterialProfileId,
    },
    #[error("job {job} requires unknown material profile {profile}")]
    UnknownJobProfile
    {
        job: JobId,
        profile: MaterialProfileId,
    },
}

#[derive(Default)]
pub struct SchedulingEnvironmentBuilder
{
    fleet: Option<Fleet>,
    jobs: Option<Jobs>,
    material_profiles: Option<MaterialProfiles>,
}

impl SchedulingEnvironment
{
    pub fn builder() -> SchedulingEnvironmentBuilder
    {
        SchedulingEnvironmentBuilder::default()
    }

    pub fn truck(&self, id: &TruckId) -> Option<&Truck>
    {
        self.fleet.get(id)
    }

    pub fn job(&self, id: &JobId) -> Option<&Job>
    {
        self.jobs.get(id)
    }

    /// Checks that every profile referenced by a truck or a job is known.
    /// An empty profile registry disables the check, which is how the
    /// environment behaves before the sample registry has been synced.
    pub fn check_references(&self) -> Result<(), ReferenceError>
    {
        if self.material_profiles.is_empty() {
            return Ok(());
        }

        for truck in self.fleet.iter() {
            if let Some(profile) = truck
                .supported_profiles
                .iter()
                .find(|p| !self.material_profiles.contains(p))
            {
                return Err(ReferenceError::UnknownTruckProfile {
                    truck: truck.id.clone(),
                    profile: profile.clone(),
                });
            }
        }

        for job in self.jobs.iter() {
            if !self.material_profiles.contains(&job.required_profile) {
                return Err(ReferenceError::UnknownJobProfile {
                    job: job.id.clone(),
                    profile: job.required_profile.clone(),
                });
            }
        }
        Ok(())
    }
}

impl SchedulingEnvironmentBuilder
{
    pub fn build(self) -> Arc<Mutex<SchedulingEnvironment>>
    {
        Arc::new(Mutex::new(SchedulingEnvironment {
            fleet: self.fleet.unwrap_or_default(),
            jobs: self.jobs.unwrap_or_default(),
            material_profiles: self.material_profiles.unwrap_or_default(),
        }))
    }

    pub fn fleet(mut self, fleet: Fleet) -> Self
    {
        self.fleet = Some(fleet);
        self
    }

    pub fn trucks<I>(mut self, trucks: I) -> Self
    where
        I: IntoIterator<Item = Truck>,
    {
        self.fleet = Some(trucks.into_iter().collect());
        self
    }

    pub fn jobs<I>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = Job>,
    {
        self.jobs = Some(jobs.into_iter().collect());
        self
    }

    pub fn material_profiles(mut self, material_profiles: MaterialProfiles) -> Self
    {
        self.material_profiles = Some(material_profiles);
        self
    }
}

impl fmt::Display for SchedulingEnvironment
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "The Scheduling Environment is currently comprised of\n  number of trucks: {}\n  number of jobs: {}\n  number of material profiles: {}",
            self.fleet.len(),
            self.jobs.len(),
            self.material_profiles.len(),
        )
    }
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::fleet_environment::capacity::Capacity;
    use crate::job_environment::Priority;
    use crate::material::MaterialQualityProfile;
    use crate::time_environment::AvailabilityWindows;
    use crate::time_environment::TimeWindow;

    fn shift() -> TimeWindow
    {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_check_references_reports_unknown_job_profile()
    {
        let truck = Truck::new(
            TruckId::new("T"),
            Capacity::tonnes(dec!(10)).unwrap(),
            [MaterialProfileId::new("P1")],
            AvailabilityWindows::new(vec![shift()]).unwrap(),
        );
        let job = Job::new(
            JobId::new("J3"),
            MaterialProfileId::new("P2"),
            Capacity::tonnes(dec!(6)).unwrap(),
            shift(),
            Priority(1),
        );
        let profiles = [MaterialQualityProfile {
            id: MaterialProfileId::new("P1"),
            name: "Crushed 0/16".to_string(),
            tolerances: vec![],
        }]
        .into_iter()
        .collect();

        let environment = SchedulingEnvironment::builder()
            .trucks([truck])
            .jobs([job])
            .material_profiles(profiles)
            .build();

        let environment = environment.lock().unwrap();
        assert_eq!(
            environment.check_references(),
            Err(ReferenceError::UnknownJobProfile {
                job: JobId::new("J3"),
                profile: MaterialProfileId::new("P2"),
            })
        );
    }
}
