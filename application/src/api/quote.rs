//! Quote-related definitions.

use common::{Date, Money};
use derive_more::From;
use juniper::{graphql_object, GraphQLInputObject};
use service::{domain::pricing, query};

use crate::{api, Context};

/// Item to be priced by a `Quote`.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "QuoteItemInput")]
pub struct ItemInput {
    /// `Date` to book reviews on.
    pub date: Date,

    /// How the reviewed product reaches reviewers.
    pub delivery_type: api::booking::DeliveryType,

    /// Kind of reviews to book.
    pub review_type: api::booking::ReviewType,

    /// Number of reviews to book.
    pub quantity: api::booking::Quantity,

    /// Cost of a single reviewed product.
    pub product_price: Money,
}

impl From<ItemInput> for pricing::Item {
    fn from(input: ItemInput) -> Self {
        Self {
            date: input.date,
            delivery_type: input.delivery_type.into(),
            review_type: input.review_type.into(),
            quantity: input.quantity.into(),
            product_price: input.product_price,
        }
    }
}

/// Priced set of items, not placed yet.
#[derive(Clone, Debug, From)]
pub struct Quote(query::quote::Output);

/// Priced set of items, not placed yet.
#[graphql_object(context = Context)]
impl Quote {
    /// Priced lines, in the order of the provided items.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        self.0.quote.lines.iter().copied().map(Line).collect()
    }

    /// Sum of all the line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.0.quote.subtotal
    }

    /// Subtotal with the commission applied.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0.quote.total
    }

    /// Part of the total the current `Seller`'s deposit would cover.
    #[must_use]
    pub fn deposit_applicable(&self) -> Money {
        self.0.deposit_applicable
    }

    /// Part of the total left to be paid through the payment gateway.
    #[must_use]
    pub fn payable(&self) -> Money {
        self.0.quote.total - self.0.deposit_applicable
    }
}

/// Priced item of a `Quote`.
#[derive(Clone, Copy, Debug)]
pub struct Line(pricing::Line);

/// Priced item of a `Quote`.
#[graphql_object(name = "QuoteLine", context = Context)]
impl Line {
    /// `Date` reviews are booked on.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0.item.date
    }

    /// How the reviewed product reaches reviewers.
    #[must_use]
    pub fn delivery_type(&self) -> api::booking::DeliveryType {
        self.0.item.delivery_type.into()
    }

    /// Kind of booked reviews.
    #[must_use]
    pub fn review_type(&self) -> api::booking::ReviewType {
        self.0.item.review_type.into()
    }

    /// Number of booked reviews.
    #[must_use]
    pub fn quantity(&self) -> api::booking::Quantity {
        self.0.item.quantity.into()
    }

    /// Base price of a single review.
    #[must_use]
    pub fn review_price(&self) -> Money {
        self.0.unit_price.review
    }

    /// Surcharge per unit on the `date`.
    #[must_use]
    pub fn surcharge(&self) -> Money {
        self.0.unit_price.surcharge
    }

    /// Cost of a single reviewed product.
    #[must_use]
    pub fn product_price(&self) -> Money {
        self.0.item.product_price
    }

    /// Total of this line: `(review + surcharge + product) × quantity`.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0.total
    }
}

/// Base unit price of a supported review combination.
#[derive(Clone, Copy, Debug)]
pub struct Price {
    /// How the reviewed product reaches reviewers.
    delivery_type: pricing::DeliveryType,

    /// Kind of reviews.
    review_type: pricing::ReviewType,

    /// Base price of a single review.
    price: Money,
}

impl Price {
    /// Returns the whole static price table.
    #[must_use]
    pub fn table() -> Vec<Self> {
        pricing::Policy::price_table()
            .map(|(delivery_type, review_type, price)| Self {
                delivery_type,
                review_type,
                price,
            })
            .collect()
    }
}

/// Base unit price of a supported review combination.
#[graphql_object(context = Context)]
impl Price {
    /// How the reviewed product reaches reviewers.
    #[must_use]
    pub fn delivery_type(&self) -> api::booking::DeliveryType {
        self.delivery_type.into()
    }

    /// Kind of reviews.
    #[must_use]
    pub fn review_type(&self) -> api::booking::ReviewType {
        self.review_type.into()
    }

    /// Base price of a single review, without surcharges.
    #[must_use]
    pub fn price(&self) -> Money {
        self.price
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use service::domain::pricing::{DeliveryType, ReviewType};

    use super::Price;

    #[test]
    fn price_table_lists_supported_combinations_only() {
        let table = Price::table();

        assert_eq!(table.len(), 7);
        assert!(table.iter().all(|p| p.price != Money::ZERO));
        assert!(!table.iter().any(|p| {
            p.delivery_type == DeliveryType::EmptyBox
                && p.review_type == ReviewType::Photo
        }));
    }
}
