use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialProfileId(pub String);

impl MaterialProfileId
{
    pub fn new(id: impl Into<String>) -> Self
    {
        Self(id.into())
    }
}

impl fmt::Display for MaterialProfileId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ToleranceRange
{
    pub property: String,
    pub min: Decimal,
    pub max: Decimal,
}

/// Quality profile as delivered by the sample registry. Scheduling only ever
/// compares the `id`, the tolerances are carried for display.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MaterialQualityProfile
{
    pub id: MaterialProfileId,
    pub name: String,
    #[serde(default)]
    pub tolerances: Vec<ToleranceRange>,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialProfiles
{
    inner: BTreeMap<MaterialProfileId, MaterialQualityProfile>,
}

impl MaterialProfiles
{
    pub fn insert(&mut self, profile: MaterialQualityProfile) -> Option<MaterialQualityProfile>
    {
        self.inner.insert(profile.id.clone(), profile)
    }

    pub fn get(&self, id: &MaterialProfileId) -> Option<&MaterialQualityProfile>
    {
        self.inner.get(id)
    }

    pub fn contains(&self, id: &MaterialProfileId) -> bool
    {
        self.inner.contains_key(id)
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

impl FromIterator<MaterialQualityProfile> for MaterialProfiles
{
    fn from_iter<I: IntoIterator<Item = MaterialQualityProfile>>(iter: I) -> Self
    {
        Self {
            inner: iter.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}
