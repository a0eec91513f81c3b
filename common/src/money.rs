//! [`Money`]-related definitions.

use std::{fmt, iter, ops, str::FromStr};

use derive_more::{Add, Sub};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::Percent;

/// Amount of money in Korean won.
///
/// Won has no minor unit in practice, so amounts are whole numbers.
#[derive(
    Add,
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Sub,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Currency code every [`Money`] amount is expressed in.
    pub const CURRENCY: &'static str = "KRW";

    /// Creates a new [`Money`] amount of the provided `won`.
    #[must_use]
    pub const fn new(won: i64) -> Self {
        Self(won)
    }

    /// Returns the amount of won of this [`Money`].
    #[must_use]
    pub const fn won(self) -> i64 {
        self.0
    }

    /// Indicates whether this [`Money`] is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiplies this [`Money`] by the provided number of units.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn times(self, units: impl Into<i64>) -> Option<Self> {
        self.0.checked_mul(units.into()).map(Self)
    }

    /// Adds the provided [`Money`] to this one.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Increases this [`Money`] by the provided [`Percent`], rounding the
    /// result half away from zero to a whole won.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn increased_by(self, percent: Percent) -> Option<Self> {
        (Decimal::from(self.0) * percent.multiplier())
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }
}

impl ops::Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, Self::CURRENCY)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s.strip_suffix(Self::CURRENCY).unwrap_or(s);
        if amount.is_empty() {
            return Err("too short");
        }

        amount
            .parse::<i64>()
            .map(Self)
            .map_err(|_| "invalid amount")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_i64(self.won())
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            /// Either a plain number of won or a [`Money`] string.
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Repr {
                /// Plain number of won.
                Won(i64),

                /// [`Money`] string representation.
                Str(String),
            }

            match Repr::deserialize(d)? {
                Repr::Won(won) => Ok(Money::new(won)),
                Repr::Str(s) => Money::from_str(&s).map_err(de::Error::custom),
            }
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Amount of Korean won in `{amount}KRW` format, where `amount` is an
    /// integer (possibly negative). The `KRW` suffix is optional on input.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use crate::Percent;

    use super::Money;

    fn percent(s: &str) -> Percent {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("39672KRW").unwrap(), Money::new(39_672));
        assert_eq!(Money::from_str("39672").unwrap(), Money::new(39_672));
        assert_eq!(Money::from_str("-600KRW").unwrap(), Money::new(-600));

        assert!(Money::from_str("KRW").is_err());
        assert!(Money::from_str("").is_err());
        assert!(Money::from_str("12.5KRW").is_err());
        assert!(Money::from_str("123USD").is_err());
        assert!(Money::from_str("-KRW").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::new(34_800).to_string(), "34800KRW");
        assert_eq!(Money::new(-600).to_string(), "-600KRW");
        assert_eq!(Money::ZERO.to_string(), "0KRW");
    }

    #[test]
    fn increases_by_percent() {
        assert_eq!(
            Money::new(34_800).increased_by(percent("14")),
            Some(Money::new(39_672)),
        );
        assert_eq!(
            Money::new(34_800).increased_by(percent("10")),
            Some(Money::new(38_280)),
        );
        // Half a won is rounded up.
        assert_eq!(
            Money::new(5).increased_by(percent("10")),
            Some(Money::new(6)),
        );
        assert_eq!(
            Money::new(1_000).increased_by(percent("0")),
            Some(Money::new(1_000)),
        );
    }

    #[test]
    fn arithmetic() {
        let m = Money::new(1_600) + Money::new(600) - Money::new(200);
        assert_eq!(m, Money::new(2_000));
        assert_eq!(-m, Money::new(-2_000));
        assert_eq!(m.times(3), Some(Money::new(6_000)));
        assert_eq!(Money::new(i64::MAX).times(2), None);
        assert_eq!(
            [Money::new(1), Money::new(2), Money::new(3)]
                .into_iter()
                .sum::<Money>(),
            Money::new(6),
        );
    }
}
