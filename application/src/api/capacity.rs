//! Capacity-related definitions.

use common::{Date, DateTime};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, read};

use crate::{api::scalar, Context};

/// Number of units bookable on a `Date`: zero or more.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Slots", with = scalar::Int)]
pub struct Slots(domain::capacity::Slots);

impl From<Slots> for i32 {
    fn from(s: Slots) -> Self {
        s.0.get()
    }
}

impl TryFrom<i32> for Slots {
    type Error = i32;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        domain::capacity::Slots::new(n).map(Self).ok_or(n)
    }
}

/// Converts a number of units into a GraphQL integer, saturating.
fn units(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
}

/// Admin-set ceiling of booked units on a `Date`.
#[derive(Clone, Copy, Debug, From)]
pub struct Capacity(domain::Capacity);

/// Admin-set ceiling of booked units on a `Date`.
#[graphql_object(context = Context)]
impl Capacity {
    /// `Date` this `Capacity` is set for.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.date
    }

    /// Number of units that can be booked on the `Date`.
    #[must_use]
    pub fn slots(&self) -> Slots {
        self.0.slots.into()
    }

    /// `DateTime` when this `Capacity` was last set.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Capacity of a `Date` against the units booked on it.
#[derive(Clone, Copy, Debug, From)]
pub struct Availability(read::Availability);

/// Capacity of a `Date` against the units booked on it.
#[graphql_object(context = Context)]
impl Availability {
    /// `Date` this `Availability` is of.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.date
    }

    /// Admin-set capacity of the `Date`, zero if not set.
    #[must_use]
    pub fn capacity(&self) -> Slots {
        self.0.capacity.into()
    }

    /// Units booked on the `Date` and not cancelled.
    #[must_use]
    pub fn booked(&self) -> i32 {
        units(self.0.booked)
    }

    /// Units still available, negative if the `Date` is overbooked.
    #[must_use]
    pub fn remaining(&self) -> i32 {
        units(self.0.remaining())
    }

    /// Indicator whether more units are booked than the `capacity`.
    #[must_use]
    pub fn is_overbooked(&self) -> bool {
        self.0.is_overbooked()
    }
}
