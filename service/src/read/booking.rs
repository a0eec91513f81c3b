//! [`Booking`] read model definition.
//!
//! [`Booking`]: crate::domain::Booking

use common::Date;

#[cfg(doc)]
use crate::domain::Booking;

pub mod list {
    //! [`Booking`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::{
        domain::{booking, user},
        read::capacity::Range,
    };
    #[cfg(doc)]
    use crate::domain::Booking;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = booking::Id;

    /// Cursor pointing to a specific [`Booking`] in a list.
    ///
    /// [`booking::Id`]s are time-ordered, so the list is ordered by
    /// creation.
    pub type Cursor = booking::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the seller to list [`Booking`]s of.
        pub seller_id: Option<user::Id>,

        /// [`booking::Status`] to list [`Booking`]s in.
        pub status: Option<booking::Status>,

        /// [`Range`] of dates to list [`Booking`]s for.
        pub dates: Option<Range>,
    }

    /// Total count of [`Booking`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}

/// Month of the progress report: confirmed [`Booking`]s dated within it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressMonth {
    /// First day of the month.
    first: Date,
}

impl ProgressMonth {
    /// Creates a new [`ProgressMonth`] if the provided `month` is within
    /// `1..=12` range.
    #[must_use]
    pub fn new(year: i32, month: u8) -> Option<Self> {
        Date::first_of_month(year, month).map(|first| Self { first })
    }

    /// Returns the first day of this [`ProgressMonth`].
    #[must_use]
    pub fn first(&self) -> Date {
        self.first
    }

    /// Returns the last day of this [`ProgressMonth`].
    #[must_use]
    pub fn last(&self) -> Date {
        self.first.last_of_month()
    }
}

#[cfg(test)]
mod spec {
    use super::ProgressMonth;

    #[test]
    fn progress_month_bounds() {
        let m = ProgressMonth::new(2024, 2).unwrap();
        assert_eq!(m.first().to_string(), "2024-02-01");
        assert_eq!(m.last().to_string(), "2024-02-29");

        assert!(ProgressMonth::new(2024, 0).is_none());
        assert!(ProgressMonth::new(2024, 13).is_none());
    }
}
