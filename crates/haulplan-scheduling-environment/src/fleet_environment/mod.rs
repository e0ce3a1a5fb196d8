pub mod capacity;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use self::capacity::Capacity;
use crate::material::MaterialProfileId;
use crate::time_environment::AvailabilityWindows;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruckId(pub String);

impl TruckId
{
    pub fn new(id: impl Into<String>) -> Self
    {
        Self(id.into())
    }
}

impl fmt::Display for TruckId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

// Owned by fleet management. The scheduling core only reads these.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Truck
{
    pub id: TruckId,
    pub capacity: Capacity,
    pub supported_profiles: BTreeSet<MaterialProfileId>,
    pub availability: AvailabilityWindows,
}

impl Truck
{
    pub fn new(
        id: TruckId,
        capacity: Capacity,
        supported_profiles: impl IntoIterator<Item = MaterialProfileId>,
        availability: AvailabilityWindows,
    ) -> Self
    {
        Self {
            id,
            capacity,
            supported_profiles: supported_profiles.into_iter().collect(),
            availability,
        }
    }

    pub fn supports(&self, profile: &MaterialProfileId) -> bool
    {
        self.supported_profiles.contains(profile)
    }
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet
{
    trucks: BTreeMap<TruckId, Truck>,
}

impl Fleet
{
    pub fn insert(&mut self, truck: Truck) -> Option<Truck>
    {
        self.trucks.insert(truck.id.clone(), truck)
    }

    pub fn get(&self, id: &TruckId) -> Option<&Truck>
    {
        self.trucks.get(id)
    }

    pub fn remove(&mut self, id: &TruckId) -> Option<Truck>
    {
        self.trucks.remove(id)
    }

    /// Trucks in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Truck>
    {
        self.trucks.values()
    }

    pub fn len(&self) -> usize
    {
        self.trucks.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.trucks.is_empty()
    }
}

impl FromIterator<Truck> for Fleet
{
    fn from_iter<I: IntoIterator<Item = Truck>>(iter: I) -> Self
    {
        Self {
            trucks: iter.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}
