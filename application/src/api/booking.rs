//! [`Booking`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{command, domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A booking of reviews.
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    id: Id,

    /// Underlying [`domain::Booking`].
    booking: OnceCell<domain::Booking>,
}

impl From<domain::Booking> for Booking {
    fn from(booking: domain::Booking) -> Self {
        Self {
            id: booking.id.into(),
            booking: OnceCell::new_with(Some(booking)),
        }
    }
}

impl Booking {
    /// Creates a new [`Booking`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Booking`] with the provided ID exists,
    /// otherwise accessing this [`Booking`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            booking: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Booking`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Booking`] doesn't exist.
    async fn booking(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Booking, Error> {
        let id = self.id.into();
        self.booking
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::booking::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|b| {
                        future::ready(b.ok_or_else(|| {
                            api::query::BookingError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Returns the [`domain::booking::Product`] of this [`Booking`].
    async fn product(
        &self,
        ctx: &Context,
    ) -> Result<&domain::booking::Product, Error> {
        Ok(&self.booking(ctx).await?.product)
    }
}

/// A booking of reviews of a product on a date.
#[graphql_object(context = Context)]
impl Booking {
    /// Unique identifier of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Order` this `Booking` was placed with.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.order",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn order(&self, ctx: &Context) -> Result<api::Order, Error> {
        let id = self.booking(ctx).await?.order_id;
        #[expect(
            unsafe_code,
            reason = "`Booking` is never placed without an `Order`"
        )]
        let order = unsafe { api::Order::new_unchecked(id) };
        Ok(order)
    }

    /// `Seller` owning this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.seller",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn seller(&self, ctx: &Context) -> Result<api::Seller, Error> {
        let id = self.booking(ctx).await?.seller_id;
        #[expect(
            unsafe_code,
            reason = "`Booking` is never placed without a `Seller`"
        )]
        let seller = unsafe { api::Seller::new_unchecked(id) };
        Ok(seller)
    }

    /// `Date` this `Booking` is made for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.date",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.booking(ctx).await?.date)
    }

    /// How the reviewed product reaches reviewers.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.deliveryType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn delivery_type(
        &self,
        ctx: &Context,
    ) -> Result<DeliveryType, Error> {
        Ok(self.booking(ctx).await?.delivery_type.into())
    }

    /// Kind of reviews booked.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.reviewType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn review_type(
        &self,
        ctx: &Context,
    ) -> Result<ReviewType, Error> {
        Ok(self.booking(ctx).await?.review_type.into())
    }

    /// Number of booked reviews.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.quantity",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn quantity(&self, ctx: &Context) -> Result<Quantity, Error> {
        Ok(self.booking(ctx).await?.quantity.into())
    }

    /// Name of the reviewed product.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.productName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn product_name(
        &self,
        ctx: &Context,
    ) -> Result<ProductName, Error> {
        Ok(self.product(ctx).await?.name.clone().into())
    }

    /// Option of the reviewed product to purchase.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.productOption",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn product_option(
        &self,
        ctx: &Context,
    ) -> Result<Option<Text>, Error> {
        Ok(self.product(ctx).await?.option.clone().map(Into::into))
    }

    /// URL of the reviewed product's page.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.productUrl",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn product_url(
        &self,
        ctx: &Context,
    ) -> Result<Option<Url>, Error> {
        Ok(self.product(ctx).await?.url.clone().map(Into::into))
    }

    /// Search keywords reviewers find the product by.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.keywords",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn keywords(
        &self,
        ctx: &Context,
    ) -> Result<Option<Text>, Error> {
        Ok(self.product(ctx).await?.keywords.clone().map(Into::into))
    }

    /// Guide for reviewers.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.reviewGuide",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn review_guide(
        &self,
        ctx: &Context,
    ) -> Result<Option<Text>, Error> {
        Ok(self.product(ctx).await?.review_guide.clone().map(Into::into))
    }

    /// Free-form remarks for admins.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.remarks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn remarks(&self, ctx: &Context) -> Result<Option<Text>, Error> {
        Ok(self.product(ctx).await?.remarks.clone().map(Into::into))
    }

    /// Base price of a single review at the moment of booking.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.reviewPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn review_price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.booking(ctx).await?.review_price)
    }

    /// Surcharge per unit at the moment of booking.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.surcharge",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn surcharge(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.booking(ctx).await?.surcharge)
    }

    /// Full price of a single review: base price with the surcharge.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.unitPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn unit_price(&self, ctx: &Context) -> Result<Money, Error> {
        self.booking(ctx)
            .await?
            .unit_price()
            .total()
            .ok_or_else(|| Error::internal(&"Unit price overflows"))
    }

    /// Cost of a single reviewed product.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.productPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn product_price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.booking(ctx).await?.product_price)
    }

    /// Total of this `Booking`, without the commission.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.lineTotal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn line_total(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.booking(ctx).await?.line_total)
    }

    /// Status of this `Booking`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.booking(ctx).await?.status.into())
    }

    /// How this `Booking` is settled with reviewers.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.paymentType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_type(
        &self,
        ctx: &Context,
    ) -> Result<Option<PaymentType>, Error> {
        Ok(self.booking(ctx).await?.payment_type.map(Into::into))
    }

    /// `Booking` this one was split off by a partial cancellation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.splitFrom",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn split_from(
        &self,
        ctx: &Context,
    ) -> Result<Option<Booking>, Error> {
        let id = self.booking(ctx).await?.split_from;
        #[expect(unsafe_code, reason = "split `Booking`s are never deleted")]
        let origin = id.map(|id| unsafe { Self::new_unchecked(id) });
        Ok(origin)
    }

    /// `DateTime` when this `Booking` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.booking(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Booking` was confirmed by an admin.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Booking.confirmedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn confirmed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.booking(ctx).await?.confirmed_at.map(|at| at.coerce()))
    }
}

/// Result of a seller-fault cancellation of a `Booking`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "CancelBookingResult")]
pub struct CancelResult {
    /// Cancelled `Booking`: reduced by a partial cancellation, or moved to
    /// `CANCELLED_BY_SELLER_FAULT` by a full one.
    pub booking: Booking,

    /// `Booking` holding the cancelled units of a partial cancellation.
    pub split: Option<Booking>,

    /// `Seller` whose deposit has been credited.
    pub seller: api::Seller,
}

impl From<command::cancel_booking::Output> for CancelResult {
    fn from(output: command::cancel_booking::Output) -> Self {
        let command::cancel_booking::Output {
            booking,
            split,
            seller,
        } = output;
        Self {
            booking: booking.into(),
            split: split.map(Into::into),
            seller: seller.into(),
        }
    }
}

/// Unique identifier of a `Booking`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::booking::Id)]
#[into(domain::booking::Id)]
#[graphql(name = "BookingId", transparent)]
pub struct Id(Uuid);

/// Number of booked reviews: from 1 to 10000.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Quantity", with = scalar::Int)]
pub struct Quantity(domain::pricing::Quantity);

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0.get()
    }
}

impl TryFrom<i32> for Quantity {
    type Error = i32;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        domain::pricing::Quantity::new(n).map(Self).ok_or(n)
    }
}

/// Name of a reviewed product.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ProductName",
    with = scalar::Via::<domain::booking::ProductName>,
)]
pub struct ProductName(domain::booking::ProductName);

/// Free-form text describing a reviewed product.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ProductText",
    with = scalar::Via::<domain::booking::Text>,
)]
pub struct Text(domain::booking::Text);

/// HTTP(S) URL of a reviewed product's page.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ProductUrl",
    with = scalar::Via::<domain::booking::Url>,
)]
pub struct Url(domain::booking::Url);

/// Status of a `Booking`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "BookingStatus")]
pub enum Status {
    /// Placed by a seller, not processed yet.
    Unconfirmed,

    /// Confirmed by an admin.
    Confirmed,

    /// Products are purchased by reviewers.
    Purchased,

    /// Reviews are left.
    Reviewed,

    /// Cancelled because of the seller's fault.
    CancelledBySellerFault,
}

impl From<domain::booking::Status> for Status {
    fn from(status: domain::booking::Status) -> Self {
        use domain::booking::Status as S;
        match status {
            S::Unconfirmed => Self::Unconfirmed,
            S::Confirmed => Self::Confirmed,
            S::Purchased => Self::Purchased,
            S::Reviewed => Self::Reviewed,
            S::CancelledBySellerFault => Self::CancelledBySellerFault,
        }
    }
}

impl From<Status> for domain::booking::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Unconfirmed => Self::Unconfirmed,
            Status::Confirmed => Self::Confirmed,
            Status::Purchased => Self::Purchased,
            Status::Reviewed => Self::Reviewed,
            Status::CancelledBySellerFault => Self::CancelledBySellerFault,
        }
    }
}

/// How a `Booking` is settled with reviewers.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "BookingPaymentType")]
pub enum PaymentType {
    /// Reviewers are paid with a cash receipt issued.
    CashReceipt,

    /// Seller pays reviewers directly.
    SelfPayment,
}

impl From<domain::booking::PaymentType> for PaymentType {
    fn from(ty: domain::booking::PaymentType) -> Self {
        use domain::booking::PaymentType as T;
        match ty {
            T::CashReceipt => Self::CashReceipt,
            T::SelfPayment => Self::SelfPayment,
        }
    }
}

impl From<PaymentType> for domain::booking::PaymentType {
    fn from(ty: PaymentType) -> Self {
        match ty {
            PaymentType::CashReceipt => Self::CashReceipt,
            PaymentType::SelfPayment => Self::SelfPayment,
        }
    }
}

/// How a reviewed product reaches reviewers.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum DeliveryType {
    /// Product is actually shipped to a reviewer.
    RealDelivery,

    /// Empty box is shipped, only the purchase is made.
    EmptyBox,
}

impl From<domain::pricing::DeliveryType> for DeliveryType {
    fn from(ty: domain::pricing::DeliveryType) -> Self {
        use domain::pricing::DeliveryType as T;
        match ty {
            T::RealDelivery => Self::RealDelivery,
            T::EmptyBox => Self::EmptyBox,
        }
    }
}

impl From<DeliveryType> for domain::pricing::DeliveryType {
    fn from(ty: DeliveryType) -> Self {
        match ty {
            DeliveryType::RealDelivery => Self::RealDelivery,
            DeliveryType::EmptyBox => Self::EmptyBox,
        }
    }
}

/// Kind of a review left by a reviewer.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
pub enum ReviewType {
    /// Star rating only.
    StarRating,

    /// Text review.
    Text,

    /// Review with photos.
    Photo,

    /// Review with professionally taken photos.
    PremiumPhoto,

    /// Review with a professionally taken video.
    PremiumVideo,
}

impl From<domain::pricing::ReviewType> for ReviewType {
    fn from(ty: domain::pricing::ReviewType) -> Self {
        use domain::pricing::ReviewType as T;
        match ty {
            T::StarRating => Self::StarRating,
            T::Text => Self::Text,
            T::Photo => Self::Photo,
            T::PremiumPhoto => Self::PremiumPhoto,
            T::PremiumVideo => Self::PremiumVideo,
        }
    }
}

impl From<ReviewType> for domain::pricing::ReviewType {
    fn from(ty: ReviewType) -> Self {
        match ty {
            ReviewType::StarRating => Self::StarRating,
            ReviewType::Text => Self::Text,
            ReviewType::Photo => Self::Photo,
            ReviewType::PremiumPhoto => Self::PremiumPhoto,
            ReviewType::PremiumVideo => Self::PremiumVideo,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Booking`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Booking, Id};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Booking` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::booking::list::Cursor)]
    #[graphql(
        name = "BookingListCursor",
        with = scalar::Via::<read::booking::list::Cursor>,
    )]
    pub struct Cursor(pub read::booking::list::Cursor);

    /// Edge in the [`Booking`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::booking::list::Edge);

    /// Edge in the `Booking` list.
    #[graphql_object(name = "BookingListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `BookingListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `BookingListEdge`.
        #[must_use]
        pub fn node(&self) -> Booking {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Booking` \
                          existence"
            )]
            unsafe {
                Booking::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Booking`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::booking::list::Connection`].
        page: read::booking::list::Connection,

        /// [`read::booking::list::Filter`] the page was selected with.
        filter: read::booking::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the provided `page` selected
        /// with the provided `filter`.
        #[must_use]
        pub fn new(
            page: read::booking::list::Connection,
            filter: read::booking::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Booking` list.
    #[graphql_object(name = "BookingListConnection", context = Context)]
    impl Connection {
        /// Edges of this `BookingListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            self.page.page_info().into()
        }

        /// Total count of `Booking`s matching the filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::bookings::TotalCount::by(self.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug, From)]
    pub struct PageInfo(read::booking::list::PageInfo);

    /// Information about a `BookingListConnection` page.
    #[graphql_object(name = "BookingListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.0.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.0.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.0.start_cursor.map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.0.end_cursor.map(Into::into)
        }
    }
}
