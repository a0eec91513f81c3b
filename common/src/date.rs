//! Calendar [`Date`] definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use time::{Month, Weekday};

/// Calendar date without a time zone.
///
/// Represented as `YYYY-MM-DD` in its textual form.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Date(time::Date);

impl Date {
    /// Creates a new [`Date`] from the provided components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn new(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the first day of the provided `month` of the `year`.
    ///
    /// [`None`] is returned if the `month` is not in `1..=12` range.
    #[must_use]
    pub fn first_of_month(year: i32, month: u8) -> Option<Self> {
        Self::new(year, month, 1)
    }

    /// Returns the last day of the month this [`Date`] belongs to.
    #[must_use]
    pub fn last_of_month(self) -> Self {
        let days =
            time::util::days_in_year_month(self.0.year(), self.0.month());
        self.0.replace_day(days).map_or(self, Self)
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Returns the month of this [`Date`] in `1..=12` range.
    #[must_use]
    pub fn month(self) -> u8 {
        self.0.month().into()
    }

    /// Returns the day of month of this [`Date`].
    #[must_use]
    pub fn day(self) -> u8 {
        self.0.day()
    }

    /// Returns the [`Weekday`] of this [`Date`].
    #[must_use]
    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// Indicates whether this [`Date`] is a Sunday.
    #[must_use]
    pub fn is_sunday(self) -> bool {
        self.weekday() == Weekday::Sunday
    }

    /// Returns the [`Date`] following this one.
    ///
    /// [`None`] is returned at the end of the supported range.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Returns an iterator over all the [`Date`]s from this one up to the
    /// `last` one, inclusive.
    pub fn until(self, last: Self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self), |d| d.next())
            .take_while(move |d| *d <= last)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year(),
            self.month(),
            self.day(),
        )
    }
}

/// Error of parsing a [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// String is not in a `YYYY-MM-DD` format.
    #[display("expected `YYYY-MM-DD` format")]
    Format,

    /// Components don't form a valid calendar date.
    #[display("no such calendar date")]
    Range,
}

impl FromStr for Date {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ParseError as E;

        let mut parts = s.split('-');
        let (Some(y), Some(m), Some(d), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(E::Format);
        };
        if y.len() != 4 || m.len() != 2 || d.len() != 2 {
            return Err(E::Format);
        }
        if ![y, m, d]
            .iter()
            .all(|p| p.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(E::Format);
        }

        let year = y.parse().map_err(|_| E::Format)?;
        let month = m.parse().map_err(|_| E::Format)?;
        let day = d.parse().map_err(|_| E::Format)?;
        Self::new(year, month, day).ok_or(E::Range)
    }
}

impl From<time::Date> for Date {
    fn from(date: time::Date) -> Self {
        Self(date)
    }
}

impl From<Date> for time::Date {
    fn from(date: Date) -> Self {
        date.0
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Date;

    impl Serialize for Date {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Date {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Date::from_str(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = super::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(Date::from_str("2025-03-09").unwrap(), date("2025-03-09"));
        assert_eq!(
            Date::from_str("2024-02-29").unwrap(),
            Date::new(2024, 2, 29).unwrap(),
        );

        assert!(Date::from_str("2025-02-29").is_err());
        assert!(Date::from_str("2025-13-01").is_err());
        assert!(Date::from_str("20250309").is_err());
        assert!(Date::from_str("2025-3-9").is_err());
        assert!(Date::from_str("2025-03-09-01").is_err());
        assert!(Date::from_str("+025-03-09").is_err());
        assert!(Date::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Date::new(2025, 3, 9).unwrap().to_string(), "2025-03-09");
        assert_eq!(Date::new(999, 12, 31).unwrap().to_string(), "0999-12-31");
    }

    #[test]
    fn detects_sundays() {
        assert!(date("2025-03-09").is_sunday());
        assert!(!date("2025-03-10").is_sunday());
        assert!(!date("2025-03-08").is_sunday());
    }

    #[test]
    fn month_bounds() {
        let first = Date::first_of_month(2024, 2).unwrap();
        assert_eq!(first, date("2024-02-01"));
        assert_eq!(first.last_of_month(), date("2024-02-29"));
        assert_eq!(
            date("2025-12-15").last_of_month(),
            date("2025-12-31"),
        );
        assert!(Date::first_of_month(2025, 13).is_none());
    }

    #[test]
    fn iterates_until() {
        let days = date("2025-02-27")
            .until(date("2025-03-02"))
            .map(|d| d.to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            days,
            ["2025-02-27", "2025-02-28", "2025-03-01", "2025-03-02"],
        );
        assert_eq!(date("2025-03-02").until(date("2025-03-01")).count(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() {
        let d = date("2025-03-09");
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2025-03-09\"");
        assert_eq!(
            serde_json::from_str::<Date>("\"2025-03-09\"").unwrap(),
            d,
        );
    }
}
