use std::fmt;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;
use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum CapacityUnit
{
    #[strum(serialize = "t")]
    Tonnes,
    #[strum(serialize = "m3")]
    CubicMetres,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("capacity cannot be negative, got {0}")]
pub struct NegativeCapacity(pub Decimal);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCapacity")]
pub struct Capacity
{
    amount: Decimal,
    unit: CapacityUnit,
}

#[derive(Deserialize)]
struct RawCapacity
{
    amount: Decimal,
    unit: CapacityUnit,
}

impl TryFrom<RawCapacity> for Capacity
{
    type Error = NegativeCapacity;

    fn try_from(raw: RawCapacity) -> Result<Self, Self::Error>
    {
        Capacity::new(raw.amount, raw.unit)
    }
}

impl Capacity
{
    pub fn new(amount: Decimal, unit: CapacityUnit) -> Result<Self, NegativeCapacity>
    {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(NegativeCapacity(amount));
        }
        Ok(Self { amount, unit })
    }

    pub fn tonnes(amount: impl Into<Decimal>) -> Result<Self, NegativeCapacity>
    {
        Self::new(amount.into(), CapacityUnit::Tonnes)
    }

    pub fn amount(&self) -> Decimal
    {
        self.amount
    }

    pub fn unit(&self) -> CapacityUnit
    {
        self.unit
    }

    /// Capacities in different units are never comparable, so a truck rated
    /// in tonnes cannot carry a job sized in cubic metres.
    pub fn accommodates(&self, required: &Capacity) -> bool
    {
        self.unit == required.unit && self.amount >= required.amount
    }

    pub fn spare_for(&self, required: &Capacity) -> Option<Decimal>
    {
        self.accommodates(required)
            .then(|| self.amount - required.amount)
    }
}

impl fmt::Display for Capacity
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

impl fmt::Debug for Capacity
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if f.alternate() {
            write!(f, "Capacity({} {})", self.amount, self.unit)
        } else {
            f.debug_struct("Capacity")
                .field("amount", &self.amount)
                .field("unit", &self.unit)
                .finish()
        }
    }
}

#[cfg(test)]
mod tests
{
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_capacity_accommodates_same_unit_only()
    {
        let truck = Capacity::tonnes(dec!(10)).unwrap();
        let small_job = Capacity::tonnes(dec!(6)).unwrap();
        let volume_job = Capacity::new(dec!(6), CapacityUnit::CubicMetres).unwrap();

        assert!(truck.accommodates(&small_job));
        assert!(truck.accommodates(&truck));
        assert!(!small_job.accommodates(&truck));
        assert!(!truck.accommodates(&volume_job));
        assert_eq!(truck.spare_for(&small_job), Some(dec!(4)));
        assert_eq!(truck.spare_for(&volume_job), None);
    }

    #[test]
    fn test_capacity_rejects_negative_amounts()
    {
        assert_eq!(
            Capacity::tonnes(dec!(-1.5)),
            Err(NegativeCapacity(dec!(-1.5)))
        );
        assert!(Capacity::tonnes(dec!(0)).is_ok());
    }

    #[test]
    fn test_capacity_display()
    {
        let capacity = Capacity::new(dec!(12.5), CapacityUnit::CubicMetres).unwrap();

        assert_eq!(capacity.to_string(), "12.5 m3");
    }
}
