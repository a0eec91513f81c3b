//! [`Booking`] definitions.

use std::sync::LazyLock;

use common::{define_kind, unit, Date, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Order, Seller};
use crate::domain::{
    order,
    pricing::{self, DeliveryType, Line, Quantity, ReviewType, UnitPrice},
    user,
};

/// One seller's request for a number of reviews of a product on a date.
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the [`Order`] this [`Booking`] was placed with.
    pub order_id: order::Id,

    /// ID of the [`Seller`] owning this [`Booking`].
    pub seller_id: user::Id,

    /// [`Date`] this [`Booking`] is made for.
    pub date: Date,

    /// [`DeliveryType`] of this [`Booking`].
    pub delivery_type: DeliveryType,

    /// [`ReviewType`] of this [`Booking`].
    pub review_type: ReviewType,

    /// Number of booked reviews.
    pub quantity: Quantity,

    /// [`Product`] to be reviewed.
    pub product: Product,

    /// Base unit price of a review at the moment of booking.
    pub review_price: Money,

    /// Surcharge per unit at the moment of booking.
    pub surcharge: Money,

    /// Cost of a single reviewed product.
    pub product_price: Money,

    /// Total of this [`Booking`]:
    /// `(review price + surcharge + product price) × quantity`.
    pub line_total: Money,

    /// [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`PaymentType`] of this [`Booking`], tracked by admins.
    pub payment_type: Option<PaymentType>,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Booking`] was confirmed.
    pub confirmed_at: Option<ConfirmationDateTime>,

    /// ID of the [`Booking`] this one was split off by a partial
    /// cancellation.
    pub split_from: Option<Id>,
}

impl Booking {
    /// Creates a new [`Status::Unconfirmed`] [`Booking`] out of the
    /// provided priced [`Line`].
    #[must_use]
    pub fn new(
        order_id: order::Id,
        seller_id: user::Id,
        line: Line,
        product: Product,
    ) -> Self {
        let pricing::Item {
            date,
            delivery_type,
            review_type,
            quantity,
            product_price,
        } = line.item;
        Self {
            id: Id::new(),
            order_id,
            seller_id,
            date,
            delivery_type,
            review_type,
            quantity,
            product,
            review_price: line.unit_price.review,
            surcharge: line.unit_price.surcharge,
            product_price,
            line_total: line.total,
            status: Status::Unconfirmed,
            payment_type: None,
            created_at: DateTime::now().coerce(),
            confirmed_at: None,
            split_from: None,
        }
    }

    /// Returns the stored [`UnitPrice`] of this [`Booking`].
    #[must_use]
    pub fn unit_price(&self) -> UnitPrice {
        UnitPrice {
            review: self.review_price,
            surcharge: self.surcharge,
        }
    }

    /// Moves this [`Booking`] to the provided [`Status`].
    ///
    /// Entering [`Status::Confirmed`] records [`Booking::confirmed_at`].
    ///
    /// # Errors
    ///
    /// If the transition is not allowed. Cancellation is never allowed here,
    /// as it has to go through [`Booking::cancel_by_seller_fault()`].
    pub fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        if to == Status::CancelledBySellerFault
            || !self.status.can_transition_to(to)
        {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        if to == Status::Confirmed {
            self.confirmed_at = Some(DateTime::now().coerce());
        }
        self.status = to;
        Ok(())
    }

    /// Cancels the provided `quantity` of this [`Booking`] by seller fault.
    ///
    /// Cancelling the whole [`Booking::quantity`] moves this [`Booking`] to
    /// [`Status::CancelledBySellerFault`]. Cancelling a part reduces this
    /// [`Booking`] and splits the cancelled part off into a new [`Booking`].
    /// Line totals of both are recomputed from the stored per-unit prices.
    ///
    /// # Errors
    ///
    /// - If this [`Booking`] cannot be cancelled in its current [`Status`].
    /// - If the `quantity` exceeds the booked one.
    pub fn cancel_by_seller_fault(
        &mut self,
        quantity: Quantity,
    ) -> Result<Cancellation, CancellationError> {
        use CancellationError as E;

        if !self.status.is_cancellable() {
            return Err(E::InvalidTransition(TransitionError {
                from: self.status,
                to: Status::CancelledBySellerFault,
            }));
        }
        if quantity > self.quantity {
            return Err(E::InvalidQuantity {
                requested: quantity,
                booked: self.quantity,
            });
        }

        let refund = self
            .product_price
            .times(quantity.get())
            .ok_or(E::Overflow)?;

        let left = self.quantity.get() - quantity.get();
        let Some(remainder) = Quantity::new(left) else {
            self.status = Status::CancelledBySellerFault;
            return Ok(Cancellation {
                refund,
                split: None,
            });
        };

        let unit_price = self.unit_price();
        let product_price = self.product_price;
        let line_total = |q| {
            Line::total_of(unit_price, product_price, q).ok_or(E::Overflow)
        };
        let split = Self {
            id: Id::new(),
            quantity,
            line_total: line_total(quantity)?,
            status: Status::CancelledBySellerFault,
            created_at: DateTime::now().coerce(),
            split_from: Some(self.id),
            ..self.clone()
        };
        self.line_total = line_total(remainder)?;
        self.quantity = remainder;

        Ok(Cancellation {
            refund,
            split: Some(split),
        })
    }
}

/// Outcome of [`Booking::cancel_by_seller_fault()`].
#[derive(Clone, Debug)]
pub struct Cancellation {
    /// Amount to be credited to the [`Seller`]'s deposit.
    pub refund: Money,

    /// [`Booking`] holding the cancelled part, if the cancellation was
    /// partial.
    pub split: Option<Booking>,
}

/// Error of a disallowed [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`{from}` -> `{to}` transition is not allowed")]
pub struct TransitionError {
    /// [`Status`] the transition starts from.
    pub from: Status,

    /// [`Status`] the transition leads to.
    pub to: Status,
}

/// Error of [`Booking::cancel_by_seller_fault()`].
#[derive(Clone, Copy, Debug, Display, Error, From)]
pub enum CancellationError {
    /// [`Booking`] cannot be cancelled in its [`Status`].
    #[display("{_0}")]
    InvalidTransition(TransitionError),

    /// More units requested than booked.
    #[display("cannot cancel {requested} of {booked} booked units")]
    #[from(ignore)]
    InvalidQuantity {
        /// Requested [`Quantity`].
        requested: Quantity,

        /// Booked [`Quantity`].
        booked: Quantity,
    },

    /// Refund amount overflows.
    #[display("refund overflow")]
    #[from(ignore)]
    Overflow,
}

/// ID of a [`Booking`].
///
/// Time-ordered, so [`Booking`]s sort by their creation.
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
    #[doc = "Status of a [`Booking`]."]
    enum Status {
        #[doc = "Placed by a seller, not processed yet."]
        #[label = "미확정"]
        Unconfirmed = 1,

        #[doc = "Confirmed by an admin."]
        #[label = "확정"]
        Confirmed = 2,

        #[doc = "Products are purchased by reviewers."]
        #[label = "구매완료"]
        Purchased = 3,

        #[doc = "Reviews are left."]
        #[label = "리뷰완료"]
        Reviewed = 4,

        #[doc = "Cancelled because of the seller's fault."]
        #[label = "셀러귀책취소"]
        CancelledBySellerFault = 5,
    }
}

impl Status {
    /// Indicates whether the transition from this [`Status`] to the provided
    /// one is allowed.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Unconfirmed, Self::Confirmed)
                | (Self::Confirmed, Self::Purchased)
                | (Self::Purchased, Self::Reviewed)
                | (
                    Self::Confirmed | Self::Purchased,
                    Self::CancelledBySellerFault,
                ),
        )
    }

    /// Indicates whether a [`Booking`] in this [`Status`] occupies capacity.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::CancelledBySellerFault)
    }

    /// Indicates whether a [`Booking`] in this [`Status`] may be cancelled by
    /// seller fault.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        self.can_transition_to(Self::CancelledBySellerFault)
    }
}

define_kind! {
    #[doc = "How a [`Booking`] is settled with reviewers."]
    enum PaymentType {
        #[doc = "Reviewers are paid with a cash receipt issued."]
        #[label = "현금영수증"]
        CashReceipt = 1,

        #[doc = "Seller pays reviewers directly."]
        #[label = "자체결제"]
        SelfPayment = 2,
    }
}

/// Product to be reviewed.
#[derive(Clone, Debug)]
pub struct Product {
    /// [`ProductName`] of this [`Product`].
    pub name: ProductName,

    /// Option (size, color and such) of this [`Product`] to purchase.
    pub option: Option<Text>,

    /// [`Url`] of this [`Product`]'s page.
    pub url: Option<Url>,

    /// Search keywords reviewers find this [`Product`] by.
    pub keywords: Option<Text>,

    /// Guide for reviewers.
    pub review_guide: Option<Text>,

    /// Free-form remarks for admins.
    pub remarks: Option<Text>,
}

/// Name of a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProductName(String);

impl ProductName {
    /// Creates a new [`ProductName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let ok = name.trim() == name
            && !name.is_empty()
            && name.chars().count() <= 200;
        ok.then_some(Self(name))
    }
}

impl std::str::FromStr for ProductName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ProductName`")
    }
}

/// Free-form text attached to a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Text(String);

impl Text {
    /// Maximum number of characters in a [`Text`].
    pub const MAX_LEN: usize = 2_000;

    /// Creates a new [`Text`] if the given `text` is valid.
    ///
    /// Surrounding whitespace is trimmed, and blank `text` is considered
    /// absent.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.chars().count() <= Self::MAX_LEN)
            .then(|| Self(text.to_owned()))
    }
}

impl std::str::FromStr for Text {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Text`")
    }
}

/// URL of a [`Product`] page.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Url(String);

impl Url {
    /// Creates a new [`Url`] if the given `url` is a valid HTTP(S) one.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Option<Self> {
        /// Regular expression checking [`Url`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^https?://[^\s/?#]+\.[^\s/?#]+([/?#]\S*)?$")
                .expect("valid regex")
        });

        let url = url.into();
        (url.len() <= 2_048 && REGEX.is_match(&url)).then_some(Self(url))
    }
}

impl std::str::FromStr for Url {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Url`")
    }
}

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// [`DateTime`] when a [`Booking`] was confirmed.
pub type ConfirmationDateTime = DateTimeOf<(Booking, unit::Confirmation)>;

#[cfg(test)]
mod spec {
    use common::{Date, Money};
    use strum::IntoEnumIterator as _;

    use crate::domain::{
        order,
        pricing::{DeliveryType, Item, Line, Policy, Quantity, ReviewType},
        user,
    };

    use super::{
        Booking, CancellationError, Product, ProductName, Status, Text, Url,
    };

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn booking(quantity: i32, product_price: i64) -> Booking {
        let line = Line::price(
            &Policy::default(),
            Item {
                date: "2025-03-09".parse::<Date>().unwrap(),
                delivery_type: DeliveryType::RealDelivery,
                review_type: ReviewType::Photo,
                quantity: qty(quantity),
                product_price: Money::new(product_price),
            },
        )
        .unwrap();
        Booking::new(
            order::Id::new(),
            user::Id::new(),
            line,
            Product {
                name: ProductName::new("Tumbler").unwrap(),
                option: None,
                url: None,
                keywords: Text::new("tumbler, steel"),
                review_guide: None,
                remarks: None,
            },
        )
    }

    #[test]
    fn stores_per_unit_prices() {
        let b = booking(3, 10_000);

        assert_eq!(b.status, Status::Unconfirmed);
        assert_eq!(b.review_price, Money::new(1_800));
        assert_eq!(b.surcharge, Money::new(600));
        assert_eq!(b.line_total, Money::new((1_800 + 600 + 10_000) * 3));
    }

    #[test]
    fn allows_only_forward_transitions() {
        use Status as S;

        let allowed = [
            (S::Unconfirmed, S::Confirmed),
            (S::Confirmed, S::Purchased),
            (S::Purchased, S::Reviewed),
            (S::Confirmed, S::CancelledBySellerFault),
            (S::Purchased, S::CancelledBySellerFault),
        ];
        for from in S::iter() {
            for to in S::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn records_confirmation() {
        let mut b = booking(1, 0);
        assert!(b.confirmed_at.is_none());

        b.transition(Status::Confirmed).unwrap();
        assert_eq!(b.status, Status::Confirmed);
        assert!(b.confirmed_at.is_some());

        assert!(b.transition(Status::Reviewed).is_err());
        assert!(b.transition(Status::CancelledBySellerFault).is_err());
        assert_eq!(b.status, Status::Confirmed);
    }

    #[test]
    fn cancels_whole_booking() {
        let mut b = booking(3, 10_000);
        b.transition(Status::Confirmed).unwrap();

        let c = b.cancel_by_seller_fault(qty(3)).unwrap();
        assert_eq!(c.refund, Money::new(30_000));
        assert!(c.split.is_none());
        assert_eq!(b.status, Status::CancelledBySellerFault);
        assert!(!b.status.is_active());
    }

    #[test]
    fn splits_partially_cancelled_booking() {
        let mut b = booking(10, 7_777);
        b.transition(Status::Confirmed).unwrap();
        b.transition(Status::Purchased).unwrap();
        let per_unit = b.line_total.won() / 10;

        let c = b.cancel_by_seller_fault(qty(3)).unwrap();
        let split = c.split.unwrap();
        assert_eq!(c.refund, Money::new(7_777 * 3));
        assert_eq!(b.quantity, qty(7));
        assert_eq!(b.status, Status::Purchased);
        assert_eq!(b.line_total, Money::new(per_unit * 7));
        assert_eq!(split.quantity, qty(3));
        assert_eq!(split.status, Status::CancelledBySellerFault);
        assert_eq!(split.line_total, Money::new(per_unit * 3));
        assert_eq!(split.split_from, Some(b.id));
        assert_ne!(split.id, b.id);

        for _ in 0..6 {
            _ = b.cancel_by_seller_fault(qty(1)).unwrap();
        }
        assert_eq!(b.quantity, qty(1));
        assert_eq!(b.line_total, Money::new(per_unit));
    }

    #[test]
    fn rejects_invalid_cancellation() {
        let mut b = booking(2, 1_000);
        assert!(matches!(
            b.cancel_by_seller_fault(qty(1)),
            Err(CancellationError::InvalidTransition(_)),
        ));

        b.transition(Status::Confirmed).unwrap();
        assert!(matches!(
            b.cancel_by_seller_fault(qty(3)),
            Err(CancellationError::InvalidQuantity { .. }),
        ));
        assert_eq!(b.quantity, qty(2));
        assert_eq!(b.status, Status::Confirmed);
    }

    #[test]
    fn validates_product_fields() {
        assert!(ProductName::new("").is_none());
        assert!(ProductName::new(" padded ").is_none());
        assert!(Text::new("   ").is_none());
        assert_eq!(Text::new("  a note ").unwrap().to_string(), "a note");
        assert!(Url::new("https://smartstore.naver.com/shop/1").is_some());
        assert!(Url::new("ftp://example.com").is_none());
        assert!(Url::new("https://localhost").is_none());
    }
}
