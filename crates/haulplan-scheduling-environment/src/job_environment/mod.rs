use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::fleet_environment::capacity::Capacity;
use crate::material::MaterialProfileId;
use crate::time_environment::TimeWindow;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId
{
    pub fn new(id: impl Into<String>) -> Self
    {
        Self(id.into())
    }
}

impl fmt::Display for JobId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Ordinal job priority, `1` is the most urgent.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub u8);

impl Priority
{
    pub fn is_more_urgent_than(&self, other: &Priority) -> bool
    {
        self.0 < other.0
    }
}

impl Default for Priority
{
    fn default() -> Self
    {
        Priority(3)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Job
{
    pub id: JobId,
    pub required_profile: MaterialProfileId,
    pub required_capacity: Capacity,
    pub requested_window: TimeWindow,
    #[serde(default)]
    pub priority: Priority,
}

impl Job
{
    pub fn new(
        id: JobId,
        required_profile: MaterialProfileId,
        required_capacity: Capacity,
        requested_window: TimeWindow,
        priority: Priority,
    ) -> Self
    {
        Self {
            id,
            required_profile,
            required_capacity,
            requested_window,
            priority,
        }
    }
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jobs
{
    inner: BTreeMap<JobId, Job>,
}

impl Jobs
{
    pub fn insert(&mut self, job: Job) -> Option<Job>
    {
        self.inner.insert(job.id.clone(), job)
    }

    pub fn get(&self, id: &JobId) -> Option<&Job>
    {
        self.inner.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job>
    {
        self.inner.values()
    }

    pub fn len(&self) -> usize
    {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.inner.is_empty()
    }
}

impl FromIterator<Job> for Jobs
{
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self
    {
        Self {
            inner: iter.into_iter().map(|j| (j.id.clone(), j)).collect(),
        }
    }
}
