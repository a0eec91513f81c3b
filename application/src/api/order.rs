//! [`Order`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{command, domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// An order of bookings placed in one checkout.
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    id: Id,

    /// Underlying [`domain::Order`].
    order: OnceCell<domain::Order>,
}

impl From<domain::Order> for Order {
    fn from(order: domain::Order) -> Self {
        Self {
            id: order.id.into(),
            order: OnceCell::new_with(Some(order)),
        }
    }
}

impl Order {
    /// Creates a new [`Order`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Order`] with the provided ID exists,
    /// otherwise accessing this [`Order`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            order: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Order`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Order`] doesn't exist.
    async fn order(&self, ctx: &Context) -> Result<&domain::Order, Error> {
        let id = self.id.into();
        self.order
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::order::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|o| {
                        future::ready(o.ok_or_else(|| {
                            api::query::OrderError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// An order of bookings placed in one checkout.
#[graphql_object(context = Context)]
impl Order {
    /// Unique identifier of this `Order`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Seller` who placed this `Order`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.seller",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn seller(&self, ctx: &Context) -> Result<api::Seller, Error> {
        let id = self.order(ctx).await?.seller_id;
        #[expect(
            unsafe_code,
            reason = "`Order` is never placed without a `Seller`"
        )]
        let seller = unsafe { api::Seller::new_unchecked(id) };
        Ok(seller)
    }

    /// `Booking`s placed with this `Order`, including the ones split off by
    /// partial cancellations.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.bookings",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bookings(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Booking>, Error> {
        ctx.service()
            .execute(query::bookings::ByOrder::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|bs| bs.into_iter().map(Into::into).collect())
    }

    /// Sum of the line totals of this `Order`'s `Booking`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.subtotal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn subtotal(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.order(ctx).await?.subtotal)
    }

    /// Subtotal with the commission applied.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.total",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn total(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.order(ctx).await?.total)
    }

    /// Part of the total paid with the `Seller`'s deposit.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.depositApplied",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deposit_applied(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.order(ctx).await?.deposit_applied)
    }

    /// Part of the total to be paid through the payment gateway.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.payable",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payable(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.order(ctx).await?.payable)
    }

    /// Payment status of this `Order`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.order(ctx).await?.status.into())
    }

    /// `DateTime` when this `Order` was placed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.order(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Order` was paid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.paidAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn paid_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.order(ctx).await?.paid_at.map(|at| at.coerce()))
    }
}

/// Unique identifier of an `Order`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::order::Id)]
#[into(domain::order::Id)]
#[graphql(name = "OrderId", transparent)]
pub struct Id(Uuid);

/// Payment status of an `Order`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "OrderStatus")]
pub enum Status {
    /// Payable amount is not paid yet.
    AwaitingPayment,

    /// Order is fully paid.
    Paid,
}

impl From<domain::order::Status> for Status {
    fn from(status: domain::order::Status) -> Self {
        use domain::order::Status as S;
        match status {
            S::AwaitingPayment => Self::AwaitingPayment,
            S::Paid => Self::Paid,
        }
    }
}

/// Booking to be placed with an `Order`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "OrderItemInput")]
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

    /// Name of the reviewed product.
    pub product_name: api::booking::ProductName,

    /// Option of the reviewed product to purchase.
    pub product_option: Option<api::booking::Text>,

    /// URL of the reviewed product's page.
    pub product_url: Option<api::booking::Url>,

    /// Search keywords reviewers find the product by.
    pub keywords: Option<api::booking::Text>,

    /// Guide for reviewers.
    pub review_guide: Option<api::booking::Text>,

    /// Free-form remarks for admins.
    pub remarks: Option<api::booking::Text>,
}

impl From<ItemInput> for command::place_order::Item {
    fn from(input: ItemInput) -> Self {
        let ItemInput {
            date,
            delivery_type,
            review_type,
            quantity,
            product_price,
            product_name,
            product_option,
            product_url,
            keywords,
            review_guide,
            remarks,
        } = input;
        Self {
            pricing: domain::pricing::Item {
                date,
                delivery_type: delivery_type.into(),
                review_type: review_type.into(),
                quantity: quantity.into(),
                product_price,
            },
            product: domain::booking::Product {
                name: product_name.into(),
                option: product_option.map(Into::into),
                url: product_url.map(Into::into),
                keywords: keywords.map(Into::into),
                review_guide: review_guide.map(Into::into),
                remarks: remarks.map(Into::into),
            },
        }
    }
}

/// Result of placing an `Order`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "PlaceOrderResult")]
pub struct PlaceResult {
    /// Placed `Order`.
    pub order: Order,

    /// `Booking`s placed with the `Order`, in the order of the items.
    pub bookings: Vec<api::Booking>,
}

impl From<command::place_order::Output> for PlaceResult {
    fn from(output: command::place_order::Output) -> Self {
        let command::place_order::Output { order, bookings } = output;
        Self {
            order: order.into(),
            bookings: bookings.into_iter().map(Into::into).collect(),
        }
    }
}
