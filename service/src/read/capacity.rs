//! [`Capacity`] read model definitions.

use common::Date;

#[cfg(doc)]
use crate::domain::{booking::Status, Booking};
use crate::domain::{capacity::Slots, Capacity};

/// Capacity of a [`Date`] against the units booked on it.
///
/// Derived at read time out of the [`Capacity`] and the active
/// [`Booking`]s, so never goes stale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Availability {
    /// [`Date`] this [`Availability`] is of.
    pub date: Date,

    /// Admin-set [`Capacity`] of the [`Date`], [`Slots::ZERO`] if not set.
    pub capacity: Slots,

    /// Sum of quantities of the [`Date`]'s [`Booking`]s which are not
    /// [`Status::CancelledBySellerFault`].
    pub booked: i64,
}

impl Availability {
    /// Returns the number of units still available.
    ///
    /// Negative if the [`Date`] is overbooked.
    #[must_use]
    pub fn remaining(&self) -> i64 {
        i64::from(self.capacity.get()) - self.booked
    }

    /// Indicates whether more units are booked than the [`Capacity`] allows.
    #[must_use]
    pub fn is_overbooked(&self) -> bool {
        self.remaining() < 0
    }

    /// Indicates whether new [`Booking`]s of the provided total `units` are
    /// accepted.
    ///
    /// Any number of units is accepted while some units remain, possibly
    /// overbooking the [`Date`]. In `strict` mode the `units` must fit into
    /// the remaining ones.
    #[must_use]
    pub fn accepts(&self, units: i64, strict: bool) -> bool {
        if strict {
            units <= self.remaining()
        } else {
            self.remaining() > 0
        }
    }
}

/// Inclusive range of [`Date`]s to select [`Availability`] for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Range {
    /// First [`Date`] of this [`Range`].
    from: Date,

    /// Last [`Date`] of this [`Range`].
    to: Date,
}

impl Range {
    /// Maximum number of days in a [`Range`].
    pub const MAX_DAYS: usize = 366;

    /// Creates a new [`Range`] if `from` is not after `to` and the range
    /// spans no more than [`Range::MAX_DAYS`].
    #[must_use]
    pub fn new(from: Date, to: Date) -> Option<Self> {
        let ok = from <= to && from.until(to).nth(Self::MAX_DAYS).is_none();
        ok.then_some(Self { from, to })
    }

    /// Creates a new [`Range`] of the single provided [`Date`].
    #[must_use]
    pub fn single(date: Date) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    /// Returns the first [`Date`] of this [`Range`].
    #[must_use]
    pub fn first(&self) -> Date {
        self.from
    }

    /// Returns the last [`Date`] of this [`Range`].
    #[must_use]
    pub fn last(&self) -> Date {
        self.to
    }

    /// Iterates over all the [`Date`]s of this [`Range`].
    pub fn dates(&self) -> impl Iterator<Item = Date> {
        self.from.until(self.to)
    }

    /// Builds [`Availability`] of every [`Date`] of this [`Range`] out of the
    /// provided [`Capacity`]s and booked quantities.
    #[must_use]
    pub fn availability(
        &self,
        capacities: &[Capacity],
        booked: &[(Date, i64)],
    ) -> Vec<Availability> {
        self.dates()
            .map(|date| Availability {
                date,
                capacity: capacities
                    .iter()
                    .find(|c| c.date == date)
                    .map_or(Slots::ZERO, |c| c.slots),
                booked: booked
                    .iter()
                    .filter(|(d, _)| *d == date)
                    .map(|(_, q)| *q)
                    .sum(),
            })
            .collect()
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime};

    use crate::domain::{capacity::Slots, Capacity};

    use super::{Availability, Range};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn goes_overbooked_without_clamping() {
        let d = date("2025-03-10");
        let capacity = Capacity {
            date: d,
            slots: Slots::new(50).unwrap(),
            updated_at: DateTime::now().coerce(),
        };
        let range = Range::single(d);

        let booked = vec![(d, 10), (d, 15), (d, 5)];
        let a = range.availability(&[capacity], &booked)[0];
        assert_eq!(a.booked, 30);
        assert_eq!(a.remaining(), 20);
        assert!(!a.is_overbooked());
        assert!(a.accepts(25, false));
        assert!(!a.accepts(25, true));

        let booked = [booked, vec![(d, 25)]].concat();
        let a = range.availability(&[capacity], &booked)[0];
        assert_eq!(a.remaining(), -5);
        assert!(a.is_overbooked());
        assert!(!a.accepts(1, false));
        assert!(!a.accepts(1, true));
    }

    #[test]
    fn ignores_other_dates() {
        let a = Range::new(date("2025-03-10"), date("2025-03-11"))
            .unwrap()
            .availability(&[], &[(date("2025-03-11"), 7)]);

        assert_eq!(a[0].booked, 0);
        assert_eq!(a[1].booked, 7);
        assert_eq!(a[1].remaining(), -7);
    }

    #[test]
    fn absent_capacity_accepts_nothing() {
        let a = Range::new(date("2025-03-10"), date("2025-03-10"))
            .unwrap()
            .availability(&[], &[]);

        assert_eq!(a[0].capacity, Slots::ZERO);
        assert_eq!(a[0].remaining(), 0);
        assert!(!a[0].accepts(1, false));
    }

    #[test]
    fn validates_range() {
        assert!(Range::new(date("2025-03-10"), date("2025-03-09")).is_none());
        assert!(Range::new(date("2025-01-01"), date("2026-01-01")).is_some());
        assert!(Range::new(date("2024-01-01"), date("2025-01-02")).is_none());
        assert_eq!(
            Range::new(date("2025-02-27"), date("2025-03-02"))
                .unwrap()
                .dates()
                .count(),
            4,
        );
    }
}
