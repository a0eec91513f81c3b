//! Pricing of review-campaign bookings.

use std::collections::BTreeSet;

use common::{define_kind, Date, Money, Percent};
use derive_more::{Display, Error, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::Deserialize;
use smart_default::SmartDefault;
use strum::IntoEnumIterator as _;

define_kind! {
    #[doc = "How a reviewed product reaches a reviewer."]
    enum DeliveryType {
        #[doc = "Product is actually shipped to a reviewer."]
        #[label = "실배송"]
        RealDelivery = 1,

        #[doc = "Empty box is shipped, only the purchase is made."]
        #[label = "빈박스"]
        EmptyBox = 2,
    }
}

define_kind! {
    #[doc = "Kind of a review left by a reviewer."]
    enum ReviewType {
        #[doc = "Star rating only."]
        #[label = "별점"]
        StarRating = 1,

        #[doc = "Text review."]
        #[label = "텍스트"]
        Text = 2,

        #[doc = "Review with photos."]
        #[label = "포토"]
        Photo = 3,

        #[doc = "Review with professionally taken photos."]
        #[label = "프리미엄 포토"]
        PremiumPhoto = 4,

        #[doc = "Review with a professionally taken video."]
        #[label = "프리미엄 영상"]
        PremiumVideo = 5,
    }
}

/// Returns the base unit price of a review of the provided types.
///
/// [`Money::ZERO`] means there is no such pricing policy.
#[must_use]
pub const fn base_price(delivery: DeliveryType, review: ReviewType) -> Money {
    use DeliveryType as D;
    use ReviewType as R;

    Money::new(match (delivery, review) {
        (D::RealDelivery, R::StarRating) => 1_600,
        (D::RealDelivery, R::Text) => 1_700,
        (D::RealDelivery, R::Photo) => 1_800,
        (D::RealDelivery, R::PremiumPhoto) => 4_000,
        (D::RealDelivery, R::PremiumVideo) => 5_000,
        (D::EmptyBox, R::StarRating | R::Text) => 5_400,
        (D::EmptyBox, R::Photo | R::PremiumPhoto | R::PremiumVideo) => 0,
    })
}

/// Pricing policy: commission and surcharge rules on top of the static
/// price table.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Policy {
    /// Commission (tax included) the order subtotal is increased by.
    #[default(Percent::whole(14).expect("valid `Percent`"))]
    pub commission: Percent,

    /// Rule of charging bookings on special days.
    pub surcharge: SurchargePolicy,
}

impl Policy {
    /// Computes the [`UnitPrice`] of a review of the provided types on the
    /// provided `date`.
    ///
    /// Unsupported combinations are priced at [`Money::ZERO`] with no
    /// surcharge.
    #[must_use]
    pub fn unit_price(
        &self,
        delivery: DeliveryType,
        review: ReviewType,
        date: Date,
    ) -> UnitPrice {
        let review_price = base_price(delivery, review);
        let surcharge = if review_price == Money::ZERO {
            Money::ZERO
        } else {
            self.surcharge.on(date)
        };
        UnitPrice {
            review: review_price,
            surcharge,
        }
    }

    /// Applies the commission to the provided `subtotal`, rounding half away
    /// from zero to a whole won.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn total(&self, subtotal: Money) -> Option<Money> {
        subtotal.increased_by(self.commission)
    }

    /// Returns all the supported combinations of the price table along with
    /// their base unit prices.
    pub fn price_table(
    ) -> impl Iterator<Item = (DeliveryType, ReviewType, Money)> {
        DeliveryType::iter()
            .flat_map(|d| ReviewType::iter().map(move |r| (d, r)))
            .map(|(d, r)| (d, r, base_price(d, r)))
            .filter(|(.., price)| *price != Money::ZERO)
    }
}

/// Rule of charging bookings on special days.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SurchargePolicy {
    /// Amount added to the unit price of every booked unit.
    #[default(Money::new(600))]
    pub amount: Money,

    /// [`SurchargeDays`] the amount is charged on.
    pub days: SurchargeDays,

    /// Dates considered holidays.
    ///
    /// Only matters for [`SurchargeDays::SundayOrHoliday`].
    pub holidays: BTreeSet<Date>,
}

impl SurchargePolicy {
    /// Returns the surcharge per unit booked on the provided `date`.
    #[must_use]
    pub fn on(&self, date: Date) -> Money {
        let charged = match self.days {
            SurchargeDays::Sunday => date.is_sunday(),
            SurchargeDays::SundayOrHoliday => {
                date.is_sunday() || self.holidays.contains(&date)
            }
        };
        if charged {
            self.amount
        } else {
            Money::ZERO
        }
    }
}

/// Days a [`SurchargePolicy`] is applied on.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurchargeDays {
    /// Sundays only.
    #[default]
    Sunday,

    /// Sundays and the configured holidays.
    SundayOrHoliday,
}

/// Per-unit price of a review, as computed by [`Policy::unit_price`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnitPrice {
    /// Base price of the review.
    pub review: Money,

    /// Surcharge of the booked date.
    pub surcharge: Money,
}

impl UnitPrice {
    /// Indicates whether this [`UnitPrice`] denotes an existing pricing
    /// policy.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.review != Money::ZERO
    }

    /// Returns the full price of a single unit.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Money> {
        self.review.checked_add(self.surcharge)
    }
}

/// Number of units in a booking.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Quantity(i32);

impl Quantity {
    /// Maximum number of units in a single booking.
    pub const MAX: i32 = 10_000;

    /// Creates a new [`Quantity`] if the provided `units` are positive and
    /// don't exceed [`Quantity::MAX`].
    #[must_use]
    pub fn new(units: i32) -> Option<Self> {
        (1..=Self::MAX).contains(&units).then_some(Self(units))
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl std::str::FromStr for Quantity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Quantity`")
    }
}

/// Item to be priced.
#[derive(Clone, Copy, Debug)]
pub struct Item {
    /// [`Date`] the item is booked on.
    pub date: Date,

    /// [`DeliveryType`] of the item.
    pub delivery_type: DeliveryType,

    /// [`ReviewType`] of the item.
    pub review_type: ReviewType,

    /// [`Quantity`] of the item.
    pub quantity: Quantity,

    /// Cost of a single reviewed product, reimbursed to a reviewer.
    pub product_price: Money,
}

/// Priced [`Item`].
#[derive(Clone, Copy, Debug)]
pub struct Line {
    /// [`Item`] being priced.
    pub item: Item,

    /// [`UnitPrice`] of the [`Item`].
    pub unit_price: UnitPrice,

    /// Total of this [`Line`]:
    /// `(review + surcharge + product price) × quantity`.
    pub total: Money,
}

impl Line {
    /// Prices the provided [`Item`] according to the provided [`Policy`].
    ///
    /// # Errors
    ///
    /// - If there is no pricing policy for the [`Item`]'s types.
    /// - If the [`Item`]'s product price is negative.
    /// - On overflow.
    pub fn price(policy: &Policy, item: Item) -> Result<Self, PricingError> {
        use PricingError as E;

        let unit_price =
            policy.unit_price(item.delivery_type, item.review_type, item.date);
        if !unit_price.is_supported() {
            return Err(E::UnsupportedPricing {
                delivery_type: item.delivery_type,
                review_type: item.review_type,
            });
        }
        if item.product_price.is_negative() {
            return Err(E::NegativeProductPrice(item.product_price));
        }

        let total =
            Self::total_of(unit_price, item.product_price, item.quantity)
                .ok_or(E::Overflow)?;
        Ok(Self {
            item,
            unit_price,
            total,
        })
    }

    /// Computes a line total out of the stored per-unit prices.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn total_of(
        unit_price: UnitPrice,
        product_price: Money,
        quantity: Quantity,
    ) -> Option<Money> {
        unit_price
            .total()?
            .checked_add(product_price)?
            .times(quantity.get())
    }
}

/// Priced set of [`Item`]s.
#[derive(Clone, Debug)]
pub struct Quote {
    /// Priced [`Line`]s, in the order of the provided [`Item`]s.
    pub lines: Vec<Line>,

    /// Sum of all the [`Line`] totals.
    pub subtotal: Money,

    /// Subtotal with the commission applied.
    pub total: Money,
}

impl Quote {
    /// Computes a [`Quote`] of the provided [`Item`]s.
    ///
    /// # Errors
    ///
    /// If any of the [`Item`]s cannot be priced, see [`Line::price()`].
    pub fn compute(
        policy: &Policy,
        items: impl IntoIterator<Item = Item>,
    ) -> Result<Self, PricingError> {
        let lines = items
            .into_iter()
            .map(|item| Line::price(policy, item))
            .collect::<Result<Vec<_>, _>>()?;
        let subtotal = lines
            .iter()
            .try_fold(Money::ZERO, |acc, l| acc.checked_add(l.total))
            .ok_or(PricingError::Overflow)?;
        let total = policy.total(subtotal).ok_or(PricingError::Overflow)?;
        Ok(Self {
            lines,
            subtotal,
            total,
        })
    }
}

/// Error of pricing an [`Item`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum PricingError {
    /// No pricing policy exists for the combination of types.
    #[display("no pricing policy for `{delivery_type}` with `{review_type}`")]
    UnsupportedPricing {
        /// [`DeliveryType`] of the [`Item`].
        delivery_type: DeliveryType,

        /// [`ReviewType`] of the [`Item`].
        review_type: ReviewType,
    },

    /// Product price is negative.
    #[display("negative product price: {_0}")]
    NegativeProductPrice(#[error(not(source))] Money),

    /// Amounts overflow.
    #[display("price overflow")]
    Overflow,
}

#[cfg(test)]
mod spec {
    use common::{Date, Money, Percent};
    use strum::IntoEnumIterator as _;

    use super::{
        base_price, DeliveryType, Item, Line, Policy, PricingError, Quantity,
        Quote, ReviewType, SurchargeDays,
    };

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn item(
        date_str: &str,
        review_type: ReviewType,
        quantity: i32,
        product_price: i64,
    ) -> Item {
        Item {
            date: date(date_str),
            delivery_type: DeliveryType::RealDelivery,
            review_type,
            quantity: Quantity::new(quantity).unwrap(),
            product_price: Money::new(product_price),
        }
    }

    #[test]
    fn prices_every_combination() {
        use DeliveryType as D;
        use ReviewType as R;

        let expected = [
            (D::RealDelivery, R::StarRating, 1_600),
            (D::RealDelivery, R::Text, 1_700),
            (D::RealDelivery, R::Photo, 1_800),
            (D::RealDelivery, R::PremiumPhoto, 4_000),
            (D::RealDelivery, R::PremiumVideo, 5_000),
            (D::EmptyBox, R::StarRating, 5_400),
            (D::EmptyBox, R::Text, 5_400),
        ];

        for d in D::iter() {
            for r in R::iter() {
                let price = expected
                    .iter()
                    .find(|(ed, er, _)| *ed == d && *er == r)
                    .map_or(0, |(.., p)| *p);
                assert_eq!(base_price(d, r), Money::new(price), "{d}/{r}");
            }
        }

        assert_eq!(Policy::price_table().count(), expected.len());
    }

    #[test]
    fn unsupported_combination_has_no_surcharge() {
        let price = Policy::default().unit_price(
            DeliveryType::EmptyBox,
            ReviewType::Photo,
            date("2025-03-09"),
        );
        assert!(!price.is_supported());
        assert_eq!(price.total(), Some(Money::ZERO));
    }

    #[test]
    fn charges_sundays_by_default() {
        let policy = Policy::default();
        let on = |d| {
            policy.unit_price(
                DeliveryType::RealDelivery,
                ReviewType::StarRating,
                date(d),
            )
        };

        assert_eq!(on("2025-03-09").surcharge, Money::new(600));
        assert_eq!(on("2025-03-09").total(), Some(Money::new(2_200)));
        assert_eq!(on("2025-03-10").surcharge, Money::ZERO);
    }

    #[test]
    fn charges_configured_holidays() {
        let mut policy = Policy::default();
        _ = policy.surcharge.holidays.insert(date("2025-03-01"));

        assert_eq!(policy.surcharge.on(date("2025-03-01")), Money::ZERO);

        policy.surcharge.days = SurchargeDays::SundayOrHoliday;
        assert_eq!(policy.surcharge.on(date("2025-03-01")), Money::new(600));
        assert_eq!(policy.surcharge.on(date("2025-03-09")), Money::new(600));
        assert_eq!(policy.surcharge.on(date("2025-03-10")), Money::ZERO);
    }

    #[test]
    fn computes_quote() {
        let quote = Quote::compute(
            &Policy::default(),
            [item("2025-03-10", ReviewType::StarRating, 3, 10_000)],
        )
        .unwrap();

        assert_eq!(quote.lines[0].total, Money::new(34_800));
        assert_eq!(quote.subtotal, Money::new(34_800));
        assert_eq!(quote.total, Money::new(39_672));
    }

    #[test]
    fn applies_configured_commission() {
        let policy = Policy {
            commission: "10".parse::<Percent>().unwrap(),
            ..Policy::default()
        };
        let quote = Quote::compute(
            &policy,
            [item("2025-03-10", ReviewType::StarRating, 3, 10_000)],
        )
        .unwrap();

        assert_eq!(quote.total, Money::new(38_280));
    }

    #[test]
    fn total_is_reproducible_from_lines() {
        let policy = Policy::default();
        let quote = Quote::compute(
            &policy,
            [
                item("2025-03-09", ReviewType::Photo, 7, 12_345),
                item("2025-03-10", ReviewType::PremiumVideo, 1, 999),
                item("2025-03-11", ReviewType::Text, 13, 0),
            ],
        )
        .unwrap();

        let recomputed = quote
            .lines
            .iter()
            .map(|l| {
                let Item {
                    product_price,
                    quantity,
                    ..
                } = l.item;
                Line::total_of(l.unit_price, product_price, quantity).unwrap()
            })
            .sum::<Money>();
        assert_eq!(recomputed, quote.subtotal);
        assert_eq!(policy.total(recomputed), Some(quote.total));
    }

    #[test]
    fn rejects_unpriceable_items() {
        let policy = Policy::default();

        let unsupported = Item {
            delivery_type: DeliveryType::EmptyBox,
            ..item("2025-03-10", ReviewType::PremiumVideo, 1, 0)
        };
        assert!(matches!(
            Quote::compute(&policy, [unsupported]),
            Err(PricingError::UnsupportedPricing { .. }),
        ));

        assert!(matches!(
            Quote::compute(
                &policy,
                [item("2025-03-10", ReviewType::Text, 1, -1)],
            ),
            Err(PricingError::NegativeProductPrice(_)),
        ));

        assert!(matches!(
            Quote::compute(
                &policy,
                [item("2025-03-10", ReviewType::Text, 2, i64::MAX / 2)],
            ),
            Err(PricingError::Overflow),
        ));
    }

    #[test]
    fn reports_surcharge_overflow() {
        let mut policy = Policy::default();
        policy.surcharge.amount = Money::new(i64::MAX);

        let sunday = item("2025-03-09", ReviewType::Text, 1, 0);
        let price = policy.unit_price(
            sunday.delivery_type,
            sunday.review_type,
            sunday.date,
        );
        assert_eq!(price.total(), None);
        assert!(matches!(
            Line::price(&policy, sunday),
            Err(PricingError::Overflow),
        ));

        let monday = item("2025-03-10", ReviewType::Text, 1, 0);
        assert!(Line::price(&policy, monday).is_ok());
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(Quantity::new(0).is_none());
        assert!(Quantity::new(-3).is_none());
        assert!(Quantity::new(Quantity::MAX + 1).is_none());
        assert_eq!(Quantity::new(1).map(Quantity::get), Some(1));
        assert!("25".parse::<Quantity>().is_ok());
        assert!("2.5".parse::<Quantity>().is_err());
    }
}
