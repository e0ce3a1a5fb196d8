use chrono::TimeDelta;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SchedulingConfiguration {
    /// How far, in minutes, a committed window may move away from the
    /// window requested by the job. Applies to both boundaries.
    pub window_tolerance_minutes: u32,
}

impl SchedulingConfiguration {
    pub fn window_tolerance(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.window_tolerance_minutes))
    }
}

impl Default for SchedulingConfiguration {
    fn default() -> Self {
        Self {
            window_tolerance_minutes: 30,
        }
    }
}
