//! [`Capacity`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateTimeOf};
use derive_more::{Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Booking;

/// Admin-set ceiling of booked units on a [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct Capacity {
    /// [`Date`] this [`Capacity`] is set for.
    pub date: Date,

    /// Number of units that can be booked on the [`Date`].
    pub slots: Slots,

    /// [`DateTime`] when this [`Capacity`] was last set.
    pub updated_at: UpdateDateTime,
}

/// Non-negative number of [`Booking`] units.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Slots(i32);

impl Slots {
    /// No slots at all.
    pub const ZERO: Self = Self(0);

    /// Creates new [`Slots`] if the provided `count` is not negative.
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (count >= 0).then_some(Self(count))
    }

    /// Returns the number of slots.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

/// [`DateTime`] when a [`Capacity`] was set.
pub type UpdateDateTime = DateTimeOf<(Capacity, unit::Update)>;
