use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Type,
};
use thiserror::Error;

use crate::op;

pub const NAIRA_CURRENCY_CODE: &str = "NGN";

//--------------------------------------        Money         ---------------------------------------------------------
/// An exact decimal amount of money in major units (e.g. Naira, not kobo).
///
/// `Money` never goes through a binary float. It is serialized to JSON as a base-10 string ("30.00") and stored in the
/// database as TEXT, so the scale of an amount survives a round trip unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount of money: {0}")]
pub struct MoneyConversionError(String);

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| MoneyConversionError(format!("'{s}': {e}")))
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Money {
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The number of decimal places needed to write the amount, ignoring trailing zeros ("10.50" has a scale of 1).
    pub fn scale(&self) -> u32 {
        self.0.normalize().scale()
    }

    /// Returns `None` instead of panicking when the sum does not fit.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Returns `None` instead of panicking when the product does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(rhs)).map(Self)
    }

    /// Adds up `amounts`, or returns `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts.into_iter().try_fold(Money::default(), Money::checked_add)
    }

    /// Converts the amount into minor currency units (e.g. kobo) by multiplying by `factor`.
    ///
    /// Returns an error if the result still has a fractional part, since a provider cannot charge a fraction of its
    /// smallest unit.
    pub fn to_minor_units(&self, factor: u32) -> Result<Decimal, MoneyConversionError> {
        let minor = self
            .0
            .checked_mul(Decimal::from(factor))
            .ok_or_else(|| MoneyConversionError(format!("{self} overflows when converted to minor units")))?;
        if minor.fract() != Decimal::ZERO {
            return Err(MoneyConversionError(format!("{self} has more precision than the minor currency unit")));
        }
        Ok(minor.trunc().normalize())
    }
}

//--------------------------------------    Sqlite mapping    ---------------------------------------------------------
impl Type<Sqlite> for Money {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <str as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Money {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.0.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Money {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<'r, Sqlite>>::decode(value)?;
        let money = s.parse::<Money>()?;
        Ok(money)
    }
}
