use std::fmt;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeWindowError
{
    #[error("a time window has to start before it ends, got start {start} and end {end}")]
    NotIncreasing
    {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("availability windows {first} and {second} overlap")]
    OverlappingAvailability
    {
        first: TimeWindow,
        second: TimeWindow,
    },
}

/// Half-open interval `[start, end)` of UTC instants. The constructor and
/// the `Deserialize` impl both reject windows where `start >= end`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow
{
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeWindow
{
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeWindow> for TimeWindow
{
    type Error = TimeWindowError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error>
    {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow
{
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeWindowError>
    {
        if start >= end {
            return Err(TimeWindowError::NotIncreasing { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc>
    {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc>
    {
        self.end
    }

    pub fn duration(&self) -> TimeDelta
    {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool
    {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool
    {
        self.start <= *instant && *instant < self.end
    }

    pub fn contains_window(&self, other: &TimeWindow) -> bool
    {
        self.start <= other.start && other.end <= self.end
    }

    /// Largest absolute deviation of either boundary from `reference`.
    pub fn max_deviation_from(&self, reference: &TimeWindow) -> TimeDelta
    {
        let start_deviation = (self.start - reference.start).abs();
        let end_deviation = (self.end - reference.end).abs();
        start_deviation.max(end_deviation)
    }
}

impl fmt::Display for TimeWindow
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%dT%H:%M"),
            self.end.format("%Y-%m-%dT%H:%M")
        )
    }
}

/// Availability of a single truck. Windows are kept sorted by start and are
/// pairwise disjoint, windows that touch (`a.end == b.start`) are allowed and
/// count as one contiguous stretch when checking coverage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimeWindow>", into = "Vec<TimeWindow>")]
pub struct AvailabilityWindows(Vec<TimeWindow>);

impl AvailabilityWindows
{
    pub fn new(mut windows: Vec<TimeWindow>) -> Result<Self, TimeWindowError>
    {
        windows.sort();
        if let Some(pair) = windows.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
            return Err(TimeWindowError::OverlappingAvailability {
                first: pair[0],
                second: pair[1],
            });
        }
        Ok(Self(windows))
    }

    /// Whether `window` lies inside the union of the availability windows.
    pub fn covers(&self, window: &TimeWindow) -> bool
    {
        let starting_before = self.0.partition_point(|w| w.start <= window.start);
        if starting_before == 0 {
            return false;
        }

        let mut reach = self.0[starting_before - 1].end;
        if reach <= window.start {
            return false;
        }

        for next in &self.0[starting_before..] {
            if reach >= window.end {
                break;
            }
            if next.start > reach {
                return false;
            }
            reach = next.end;
        }
        reach >= window.end
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeWindow>
    {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<TimeWindow>> for AvailabilityWindows
{
    type Error = TimeWindowError;

    fn try_from(windows: Vec<TimeWindow>) -> Result<Self, Self::Error>
    {
        AvailabilityWindows::new(windows)
    }
}

impl From<AvailabilityWindows> for Vec<TimeWindow>
{
    fn from(value: AvailabilityWindows) -> Self
    {
        value.0
    }
}
