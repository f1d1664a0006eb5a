//! Strongly-typed satoshi amounts that prevent under/overflows.
//!
//! The [`Amount`] type is parameterized by a [`Constraint`] implementation
//! that declares the range of allowed values. In contrast to regular
//! arithmetic operations, which return values, arithmetic on [`Amount`]s
//! returns [`Result`](std::result::Result)s.

use std::{
    cmp::Ordering,
    convert::{TryFrom, TryInto},
    fmt, io,
    marker::PhantomData,
    ops::RangeInclusive,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::serialization::{SatoshiDeserialize, SatoshiSerialize, SerializationError};

#[cfg(test)]
mod tests;

/// The result of an amount operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One bitcoin, in satoshis.
pub const COIN: i64 = 100_000_000;

/// The maximum representable monetary value, in satoshis.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

/// A runtime validated type for representing amounts of satoshis
#[derive(Clone, Copy, Serialize, Deserialize, Default)]
#[serde(try_from = "i64")]
#[serde(into = "i64")]
#[serde(bound = "C: Constraint + Clone")]
pub struct Amount<C = NonNegative>(
    /// The inner amount value.
    i64,
    /// Used for [`Constraint`] type inference.
    #[serde(skip)]
    PhantomData<C>,
);

impl<C> fmt::Debug for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&format!("Amount<{}>", std::any::type_name::<C>()))
            .field(&self.0)
            .finish()
    }
}

impl<C> fmt::Display for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let satoshis = self.satoshis();

        f.pad_integral(satoshis > 0, "", &satoshis.to_string())
    }
}

impl<C> Amount<C> {
    /// Returns the number of satoshis in this amount.
    pub fn satoshis(&self) -> i64 {
        self.0
    }

    /// Create a zero `Amount`
    pub fn zero() -> Amount<C>
    where
        C: Constraint,
    {
        0i64.try_into().expect("an amount of 0 is always valid")
    }
}

impl<C> std::ops::Add<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_add(rhs.0)
            .expect("adding two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> std::ops::Add<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn add(self, rhs: Amount<C>) -> Self::Output {
        self? + rhs
    }
}

impl<C> std::ops::Sub<Amount<C>> for Amount<C>
where
    C: Constraint,
{
    type Output = Result<Amount<C>>;

    fn sub(self, rhs: Amount<C>) -> Self::Output {
        let value = self
            .0
            .checked_sub(rhs.0)
            .expect("subtracting two constrained Amounts is always within an i64");
        value.try_into()
    }
}

impl<C> From<Amount<C>> for i64 {
    fn from(amount: Amount<C>) -> Self {
        amount.0
    }
}

impl From<Amount<NonNegative>> for u64 {
    fn from(amount: Amount<NonNegative>) -> Self {
        amount.0.try_into().expect("non-negative i64 fits in u64")
    }
}

impl<C> TryFrom<i64> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

impl<C> TryFrom<u64> for Amount<C>
where
    C: Constraint,
{
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        let value = value.try_into().map_err(|source| Error::Convert {
            value: value.into(),
            source,
        })?;

        C::validate(value).map(|v| Self(v, PhantomData))
    }
}

impl<C> std::hash::Hash for Amount<C> {
    /// Amounts with the same value are equal, even if they have different
    /// constraints
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<C1, C2> PartialEq<Amount<C2>> for Amount<C1> {
    fn eq(&self, other: &Amount<C2>) -> bool {
        self.0.eq(&other.0)
    }
}

impl<C> PartialEq<i64> for Amount<C> {
    fn eq(&self, other: &i64) -> bool {
        self.0.eq(other)
    }
}

impl<C> Eq for Amount<C> {}

impl<C1, C2> PartialOrd<Amount<C2>> for Amount<C1> {
    fn partial_cmp(&self, other: &Amount<C2>) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl<C> Ord for Amount<C> {
    fn cmp(&self, other: &Amount<C>) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<C> std::iter::Sum<Amount<C>> for Result<Amount<C>>
where
    C: Constraint,
{
    fn sum<I: Iterator<Item = Amount<C>>>(iter: I) -> Self {
        iter.fold(Ok(Amount::zero()), |acc, amount| acc + amount)
    }
}

impl<'amt, C> std::iter::Sum<&'amt Amount<C>> for Result<Amount<C>>
where
    C: Constraint + Copy + 'amt,
{
    fn sum<I: Iterator<Item = &'amt Amount<C>>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Errors that can be returned when validating [`Amount`]s.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input value is outside the valid range for a satoshi amount.
    #[error("input {value} is outside of valid range for satoshi Amount, valid_range={range:?}")]
    Constraint {
        /// The invalid amount
        value: i64,
        /// The valid range for the constraint
        range: RangeInclusive<i64>,
    },

    /// The input value could not be converted to an i64 amount.
    #[error("{value} could not be converted to an i64 Amount")]
    Convert {
        /// The invalid amount
        value: i128,
        /// The conversion error
        source: std::num::TryFromIntError,
    },
}

/// Marker type for `Amount` that requires nonnegative values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NonNegative;

impl Constraint for NonNegative {
    fn valid_range() -> RangeInclusive<i64> {
        0..=MAX_MONEY
    }
}

/// A trait for defining constraints on `Amount`
pub trait Constraint {
    /// Returns the range of values that are valid under this constraint
    fn valid_range() -> RangeInclusive<i64>;

    /// Check if an input value is within the valid range
    fn validate(value: i64) -> Result<i64, Error> {
        let range = Self::valid_range();

        if !range.contains(&value) {
            Err(Error::Constraint { value, range })
        } else {
            Ok(value)
        }
    }
}

impl SatoshiSerialize for Amount<NonNegative> {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        let amount = u64::from(*self);
        writer.write_u64::<LittleEndian>(amount)
    }
}

impl SatoshiDeserialize for Amount<NonNegative> {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(reader.read_u64::<LittleEndian>()?.try_into()?)
    }
}
