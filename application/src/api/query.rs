//! GraphQL [`Query`]s definitions.

use common::Date;
use service::{
    domain::{pricing::PricingError, Booking},
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of nodes on a page.
    const DEFAULT_PAGE_SIZE: i32 = 20;
}

#[juniper::graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id();
        ctx.service()
            .execute(query::user::ById::by(my_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Seller` profile of the currently authenticated `User`,
    /// if it's a seller.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "mySeller",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_seller(
        ctx: &Context,
    ) -> Result<Option<api::Seller>, Error> {
        let my_id = ctx.current_session().await?.user_id();
        ctx.service()
            .execute(query::seller::ById::by(my_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.map(Into::into))
    }

    /// Returns the `Seller` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SELLER_NOT_EXISTS` - the `Seller` with the specified ID does not
    ///                         exist;
    /// - `NOT_ADMIN` - the current `User` is not an admin and tries to
    ///                 access another `Seller`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "seller",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn seller(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::Seller, Error> {
        let session = ctx.current_session().await?;
        if !session.is_admin && session.user_id != id {
            return Err(ctx.error()(api::PrivilegeError::Admin.into()));
        }

        ctx.service()
            .execute(query::seller::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| SellerError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Seller`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `NOT_ADMIN` - the current `User` is not an admin.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "sellers",
            last = ?last,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn sellers(
        first: Option<i32>,
        after: Option<api::seller::list::Cursor>,
        last: Option<i32>,
        before: Option<api::seller::list::Cursor>,
        name: Option<api::user::Name>,
        ctx: &Context,
    ) -> Result<api::seller::list::Connection, Error> {
        let arguments = read::seller::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;

        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(query::sellers::List::by(read::seller::list::Selector {
                arguments,
                filter: read::seller::list::Filter {
                    name: name.map(Into::into),
                },
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Booking` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BOOKING_NOT_EXISTS` - the `Booking` with the specified ID does not
    ///                          exist, or belongs to another `Seller`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "booking",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn booking(
        id: api::booking::Id,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let session = ctx.current_session().await?;
        ctx.service()
            .execute(query::booking::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|b: &Booking| visible(&session, b.seller_id))
            .ok_or_else(|| BookingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Booking`s, ordered by their creation.
    ///
    /// `Seller`s list only their own `Booking`s, ignoring the `sellerId`.
    /// `from` and `to` select `Booking`s dated within the inclusive range
    /// and must be specified together.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `INVALID_DATE_RANGE` - the date range is malformed.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            from = ?from,
            gql.name = "bookings",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            seller_id = ?seller_id,
            status = ?status,
            to = ?to,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn bookings(
        first: Option<i32>,
        after: Option<api::booking::list::Cursor>,
        last: Option<i32>,
        before: Option<api::booking::list::Cursor>,
        seller_id: Option<api::user::Id>,
        status: Option<api::booking::Status>,
        from: Option<Date>,
        to: Option<Date>,
        ctx: &Context,
    ) -> Result<api::booking::list::Connection, Error> {
        let arguments = read::booking::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let dates = match (from, to) {
            (None, None) => None,
            (Some(from), Some(to)) => Some(
                read::capacity::Range::new(from, to)
                    .ok_or_else(|| RangeError::Invalid.into())
                    .map_err(ctx.error())?,
            ),
            (Some(_), None) | (None, Some(_)) => {
                return Err(ctx.error()(RangeError::Invalid.into()));
            }
        };

        let session = ctx.current_session().await?;
        let filter = read::booking::list::Filter {
            seller_id: if session.is_admin {
                seller_id.map(Into::into)
            } else {
                Some(session.user_id())
            },
            status: status.map(Into::into),
            dates,
        };

        ctx.service()
            .execute(query::bookings::List::by(read::booking::list::Selector {
                arguments,
                filter,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::booking::list::Connection::new(page, filter))
    }

    /// Returns the `Order` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` with the specified ID does not
    ///                        exist, or belongs to another `Seller`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "order",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn order(
        id: api::order::Id,
        ctx: &Context,
    ) -> Result<api::Order, Error> {
        let session = ctx.current_session().await?;
        ctx.service()
            .execute(query::order::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|o| visible(&session, o.seller_id))
            .ok_or_else(|| OrderError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns capacity against the booked units of every `Date` within the
    /// inclusive range.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DATE_RANGE` - `from` is after `to`, or the range is too
    ///                          long.
    #[tracing::instrument(
        skip_all,
        fields(
            from = %from,
            gql.name = "availability",
            otel.name = Self::SPAN_NAME,
            to = %to,
        ),
    )]
    pub async fn availability(
        from: Date,
        to: Date,
        ctx: &Context,
    ) -> Result<Vec<api::capacity::Availability>, Error> {
        let range = read::capacity::Range::new(from, to)
            .ok_or_else(|| RangeError::Invalid.into())
            .map_err(ctx.error())?;
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::availability::InRange::by(range))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|a| a.into_iter().map(Into::into).collect())
    }

    /// Prices the provided items without placing them.
    ///
    /// For an authenticated `Seller` also previews how much of the total its
    /// deposit would cover.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NO_ITEMS` - no items provided;
    /// - `UNSUPPORTED_PRICING` - no price exists for an item's combination
    ///                           of types;
    /// - `NEGATIVE_PRODUCT_PRICE` - an item's product price is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quote",
            items = items.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quote(
        items: Vec<api::quote::ItemInput>,
        ctx: &Context,
    ) -> Result<api::quote::Quote, Error> {
        let seller_id = ctx
            .try_current_session()
            .await?
            .filter(|s| !s.is_admin)
            .map(|s| s.user_id());

        ctx.service()
            .execute(query::GetQuote {
                items: items.into_iter().map(Into::into).collect(),
                seller_id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the static price table of the supported review combinations.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "priceTable",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn price_table() -> Vec<api::quote::Price> {
        api::quote::Price::table()
    }

    /// Lists the `Booking`s dated within the specified month which are
    /// currently confirmed, in the order of their confirmation.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_MONTH` - the month is not within `1..=12` range;
    /// - `NOT_ADMIN` - the current `User` is not an admin.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "progressReport",
            month = month,
            otel.name = Self::SPAN_NAME,
            year = year,
        ),
    )]
    pub async fn progress_report(
        year: i32,
        month: i32,
        ctx: &Context,
    ) -> Result<Vec<api::Booking>, Error> {
        let month = u8::try_from(month)
            .ok()
            .and_then(|m| read::booking::ProgressMonth::new(year, m))
            .ok_or_else(|| MonthError::Invalid.into())
            .map_err(ctx.error())?;
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(query::report::Progress::by(month))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|bs| bs.into_iter().map(Into::into).collect())
    }
}

/// Indicates whether data of the `owner` is visible within the provided
/// [`Session`].
fn visible(session: &Session, owner: service::domain::user::Id) -> bool {
    session.is_admin || session.user_id() == owner
}

impl AsError for PricingError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum PricingApiError {
                #[code = "UNSUPPORTED_PRICING"]
                #[status = BAD_REQUEST]
                #[message = "No price exists for the combination of \
                             delivery and review types"]
                Unsupported,

                #[code = "NEGATIVE_PRODUCT_PRICE"]
                #[status = BAD_REQUEST]
                #[message = "Product price cannot be negative"]
                NegativeProductPrice,

                #[code = "PRICE_OVERFLOW"]
                #[status = BAD_REQUEST]
                #[message = "Amounts are too large"]
                Overflow,
            }
        }

        Some(
            match self {
                Self::UnsupportedPricing { .. } => {
                    PricingApiError::Unsupported
                }
                Self::NegativeProductPrice(_) => {
                    PricingApiError::NegativeProductPrice
                }
                Self::Overflow => PricingApiError::Overflow,
            }
            .into(),
        )
    }
}

impl AsError for query::quote::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Pricing(e) => e.try_as_error(),
            Self::NoItems => Some(ItemsError::Empty.into()),
        }
    }
}

define_error! {
    enum BookingError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ItemsError {
        #[code = "NO_ITEMS"]
        #[status = BAD_REQUEST]
        #[message = "At least one item must be provided"]
        Empty,
    }
}

define_error! {
    enum MonthError {
        #[code = "INVALID_MONTH"]
        #[status = BAD_REQUEST]
        #[message = "Month must be within `1..=12` range"]
        Invalid,
    }
}

define_error! {
    enum OrderError {
        #[code = "ORDER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Order` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RangeError {
        #[code = "INVALID_DATE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "`from` must not be after `to`, and the range must \
                     not exceed a year"]
        Invalid,
    }
}

define_error! {
    enum SellerError {
        #[code = "SELLER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Seller` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
