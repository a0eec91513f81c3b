//! [`Order`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Booking, Seller};
use crate::domain::{pricing::Quote, user};

/// Set of [`Booking`]s placed by a [`Seller`] in one checkout.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// ID of the [`Seller`] who placed this [`Order`].
    pub seller_id: user::Id,

    /// Sum of the line totals of this [`Order`]'s [`Booking`]s.
    pub subtotal: Money,

    /// [`Order::subtotal`] with the commission applied.
    pub total: Money,

    /// Part of the [`Order::total`] paid with the [`Seller`]'s deposit.
    pub deposit_applied: Money,

    /// Part of the [`Order::total`] to be paid through the payment gateway.
    pub payable: Money,

    /// [`Status`] of this [`Order`].
    pub status: Status,

    /// [`DateTime`] when this [`Order`] was placed.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Order`] was paid.
    pub paid_at: Option<PaymentDateTime>,
}

impl Order {
    /// Creates a new [`Order`] for the provided [`Quote`], paying the
    /// `deposit_applied` part of its total with the [`Seller`]'s deposit.
    ///
    /// An [`Order`] with nothing left to pay is created already
    /// [`Status::Paid`].
    #[must_use]
    pub fn new(
        seller_id: user::Id,
        quote: &Quote,
        deposit_applied: Money,
    ) -> Self {
        let now = DateTime::now();
        let payable = quote.total - deposit_applied;
        let paid = payable == Money::ZERO;
        Self {
            id: Id::new(),
            seller_id,
            subtotal: quote.subtotal,
            total: quote.total,
            deposit_applied,
            payable,
            status: if paid {
                Status::Paid
            } else {
                Status::AwaitingPayment
            },
            created_at: now.coerce(),
            paid_at: paid.then(|| now.coerce()),
        }
    }

    /// Marks this [`Order`] as [`Status::Paid`].
    pub fn mark_paid(&mut self) {
        self.status = Status::Paid;
        self.paid_at = Some(DateTime::now().coerce());
    }
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

define_kind! {
    #[doc = "Payment status of an [`Order`]."]
    enum Status {
        #[doc = "Payable amount is not paid yet."]
        #[label = "결제대기"]
        AwaitingPayment = 1,

        #[doc = "Order is fully paid."]
        #[label = "결제완료"]
        Paid = 2,
    }
}

/// [`DateTime`] when an [`Order`] was placed.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;

/// [`DateTime`] when an [`Order`] was paid.
pub type PaymentDateTime = DateTimeOf<(Order, unit::Payment)>;

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::domain::{pricing::Quote, user};

    use super::{Order, Status};

    fn quote(total: i64) -> Quote {
        Quote {
            lines: vec![],
            subtotal: Money::new(total),
            total: Money::new(total),
        }
    }

    #[test]
    fn awaits_payment_of_remainder() {
        let order =
            Order::new(user::Id::new(), &quote(39_672), Money::new(9_672));

        assert_eq!(order.payable, Money::new(30_000));
        assert_eq!(order.status, Status::AwaitingPayment);
        assert!(order.paid_at.is_none());
    }

    #[test]
    fn fully_covered_by_deposit_is_paid() {
        let order =
            Order::new(user::Id::new(), &quote(39_672), Money::new(39_672));

        assert_eq!(order.payable, Money::ZERO);
        assert_eq!(order.status, Status::Paid);
        assert!(order.paid_at.is_some());
    }
}
