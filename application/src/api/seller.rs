//! [`Seller`]-related definitions.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLObject, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A seller profile of a [`User`].
///
/// [`User`]: api::User
#[derive(Clone, Debug)]
pub struct Seller {
    /// ID of the [`User`] owning this [`Seller`] profile.
    ///
    /// [`User`]: api::User
    id: api::user::Id,

    /// Underlying [`domain::Seller`].
    seller: OnceCell<domain::Seller>,
}

impl From<domain::Seller> for Seller {
    fn from(seller: domain::Seller) -> Self {
        Self {
            id: seller.id.into(),
            seller: OnceCell::new_with(Some(seller)),
        }
    }
}

impl Seller {
    /// Creates a new [`Seller`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Seller`] with the provided ID exists,
    /// otherwise accessing this [`Seller`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<api::user::Id>) -> Self {
        Self {
            id: id.into(),
            seller: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Seller`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Seller`] doesn't exist.
    async fn seller(&self, ctx: &Context) -> Result<&domain::Seller, Error> {
        let id = self.id.into();
        self.seller
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::seller::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|s| {
                        future::ready(s.ok_or_else(|| {
                            api::query::SellerError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A seller profile of a `User`.
#[graphql_object(context = Context)]
impl Seller {
    /// Unique identifier of the `User` owning this `Seller` profile.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> api::user::Id {
        self.id
    }

    /// `User` owning this `Seller` profile.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.user",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn user(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "`Seller` profile exists only along with its `User`"
        )]
        unsafe {
            api::User::new_unchecked(self.id)
        }
    }

    /// Business registration number of this `Seller`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.businessNumber",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn business_number(
        &self,
        ctx: &Context,
    ) -> Result<BusinessNumber, Error> {
        Ok(self.seller(ctx).await?.business_number.clone().into())
    }

    /// `DateTime` when the business of this `Seller` was verified as
    /// active.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.verifiedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn verified_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.seller(ctx).await?.verified_at.map(|at| at.coerce()))
    }

    /// How this `Seller` has learned about the portal.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.referrer",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn referrer(
        &self,
        ctx: &Context,
    ) -> Result<Option<Referrer>, Error> {
        Ok(self.seller(ctx).await?.referrer.clone().map(Into::into))
    }

    /// Prepaid deposit balance of this `Seller`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.deposit",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deposit(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.seller(ctx).await?.deposit)
    }

    /// `DateTime` when this `Seller` profile was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Seller.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.seller(ctx).await?.created_at.coerce())
    }
}

/// Business registration number of a `Seller`: 10 digits.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "BusinessNumber",
    with = scalar::Via::<domain::seller::BusinessNumber>,
)]
pub struct BusinessNumber(domain::seller::BusinessNumber);

/// How a `Seller` has learned about the portal.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "SellerReferrer",
    with = scalar::Via::<domain::seller::Referrer>,
)]
pub struct Referrer(domain::seller::Referrer);

/// Result of a business registration number verification.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context, name = "BusinessVerification")]
pub struct Verification {
    /// Verified business registration number.
    pub business_number: BusinessNumber,

    /// Business status code reported by the registry.
    pub status_code: Option<String>,
}

pub mod list {
    //! Definitions related to the [`Seller`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::Seller;
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Seller` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(crate::api::user::Id, read::seller::list::Cursor)]
    #[graphql(
        name = "SellerListCursor",
        with = scalar::Via::<read::seller::list::Cursor>,
    )]
    pub struct Cursor(pub read::seller::list::Cursor);

    /// Edge in the [`Seller`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::seller::list::Edge);

    /// Edge in the `Seller` list.
    #[graphql_object(name = "SellerListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `SellerListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `SellerListEdge`.
        #[must_use]
        pub fn node(&self) -> Seller {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Seller` \
                          existence"
            )]
            unsafe {
                Seller::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Seller`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Connection(read::seller::list::Connection);

    /// Connection of the `Seller` list.
    #[graphql_object(name = "SellerListConnection", context = Context)]
    impl Connection {
        /// Edges of this `SellerListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.0.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            self.0.page_info().into()
        }

        /// Total count of `Seller`s.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::sellers::TotalCount::by(()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug, From)]
    pub struct PageInfo(read::seller::list::PageInfo);

    /// Information about a `SellerListConnection` page.
    #[graphql_object(name = "SellerListPageInfo", context = Context)]
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
