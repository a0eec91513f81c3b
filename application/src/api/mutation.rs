//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::{booking, seller::DepositError},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Signs up a new `Seller` with the provided credentials, contact info
    /// and business registration number.
    ///
    /// The business registration number is verified with the registry
    /// beforehand.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another
    ///                      `User`;
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`;
    /// - `BUSINESS_NUMBER_OCCUPIED` - provided `BusinessNumber` is
    ///                                registered by another `Seller`;
    /// - `BUSINESS_NOT_ACTIVE` - provided `BusinessNumber` doesn't denote an
    ///                           active business;
    /// - `BAD_GATEWAY` - the registry failed to process the request.
    #[tracing::instrument(
        skip_all,
        fields(
            business_number = %business_number,
            email = %email,
            gql.name = "createSeller",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn create_seller(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: api::user::Email,
        phone: Option<api::user::Phone>,
        business_number: api::seller::BusinessNumber,
        referrer: Option<api::seller::Referrer>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let command::create_seller::Output { user, .. } = ctx
            .service()
            .execute(command::CreateSeller {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                email: email.into(),
                phone: phone.map(Into::into),
                business_number: business_number.into(),
                referrer: referrer.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            is_admin: output.user.is_admin(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            is_admin: output.user.is_admin(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Verifies the provided business registration number with the
    /// registry.
    ///
    /// When called by a `Seller`, its business registration number and
    /// verification time are updated.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BUSINESS_NOT_ACTIVE` - provided `BusinessNumber` doesn't denote an
    ///                           active business;
    /// - `BUSINESS_NUMBER_OCCUPIED` - provided `BusinessNumber` is
    ///                                registered by another `Seller`;
    /// - `BAD_GATEWAY` - the registry failed to process the request.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "verifyBusiness",
            number = %number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn verify_business(
        number: api::seller::BusinessNumber,
        ctx: &Context,
    ) -> Result<api::seller::Verification, Error> {
        let seller_id = ctx
            .try_current_session()
            .await?
            .filter(|s| !s.is_admin)
            .map(|s| s.user_id());

        let status = ctx
            .service()
            .execute(command::VerifyBusiness {
                number: number.clone().into(),
                seller_id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::seller::Verification {
            business_number: number,
            status_code: status.code,
        })
    }

    /// Grants the admin role to the `User` with the provided email.
    ///
    /// Granting the role to an admin once again changes nothing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `USER_NOT_EXISTS` - no `User` has the provided email.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "grantAdminRole",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn grant_admin_role(
        email: api::user::Email,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::GrantAdminRole {
                by: my_id,
                email: email.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Places an `Order` of the provided items on behalf of the current
    /// `Seller`.
    ///
    /// With `useDeposit` the `Seller`'s deposit covers as much of the total
    /// as it can.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NO_ITEMS` - no items provided;
    /// - `UNSUPPORTED_PRICING` - no price exists for an item's combination
    ///                           of types;
    /// - `NEGATIVE_PRODUCT_PRICE` - an item's product price is negative;
    /// - `CAPACITY_EXCEEDED` - a `Date` has no capacity left for the items;
    /// - `NOT_SELLER` - the current `User` is not a `Seller`;
    /// - `CONCURRENT_MODIFICATION` - the `Order` conflicted with concurrent
    ///                               ones too many times.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "placeOrder",
            items = items.len(),
            otel.name = Self::SPAN_NAME,
            use_deposit = use_deposit,
        ),
    )]
    pub async fn place_order(
        items: Vec<api::order::ItemInput>,
        use_deposit: bool,
        ctx: &Context,
    ) -> Result<api::order::PlaceResult, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::PlaceOrder {
                seller_id: my_id,
                items: items.into_iter().map(Into::into).collect(),
                use_deposit,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Sets the number of units bookable on the provided `Date`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date,
            gql.name = "setCapacity",
            otel.name = Self::SPAN_NAME,
            slots = %slots,
        ),
    )]
    pub async fn set_capacity(
        date: Date,
        slots: api::capacity::Slots,
        ctx: &Context,
    ) -> Result<api::capacity::Capacity, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::SetCapacity {
                by: my_id,
                date,
                slots: slots.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Booking` to the provided status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `BOOKING_NOT_EXISTS` - the `Booking` does not exist;
    /// - `INVALID_TRANSITION` - the `Booking` cannot be moved to the status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateBookingStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_booking_status(
        id: api::booking::Id,
        status: api::booking::Status,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::UpdateBookingStatus {
                by: my_id,
                booking_id: id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Sets or clears the payment type of the `Booking`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `BOOKING_NOT_EXISTS` - the `Booking` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "setBookingPaymentType",
            id = %id,
            otel.name = Self::SPAN_NAME,
            payment_type = ?payment_type,
        ),
    )]
    pub async fn set_booking_payment_type(
        id: api::booking::Id,
        payment_type: Option<api::booking::PaymentType>,
        ctx: &Context,
    ) -> Result<api::Booking, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::SetBookingPaymentType {
                by: my_id,
                booking_id: id.into(),
                payment_type: payment_type.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the provided number of units of the `Booking` by seller fault,
    /// crediting the `Seller`'s deposit with their product price.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `BOOKING_NOT_EXISTS` - the `Booking` does not exist;
    /// - `INVALID_TRANSITION` - the `Booking` cannot be cancelled in its
    ///                          status;
    /// - `INVALID_QUANTITY` - more units requested than booked;
    /// - `CONCURRENT_MODIFICATION` - the cancellation conflicted with
    ///                               concurrent ones too many times.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelBooking",
            id = %id,
            otel.name = Self::SPAN_NAME,
            quantity = %quantity,
        ),
    )]
    pub async fn cancel_booking(
        id: api::booking::Id,
        quantity: api::booking::Quantity,
        ctx: &Context,
    ) -> Result<api::booking::CancelResult, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::CancelBooking {
                by: my_id,
                booking_id: id.into(),
                quantity: quantity.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Credits (positive `amount`) or debits (negative `amount`) the
    /// `Seller`'s deposit.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `SELLER_NOT_EXISTS` - the `Seller` does not exist;
    /// - `INSUFFICIENT_DEPOSIT` - the debit exceeds the balance;
    /// - `CONCURRENT_MODIFICATION` - the adjustment conflicted with
    ///                               concurrent ones too many times.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "adjustDeposit",
            otel.name = Self::SPAN_NAME,
            seller_id = %seller_id,
        ),
    )]
    pub async fn adjust_deposit(
        seller_id: api::user::Id,
        amount: Money,
        ctx: &Context,
    ) -> Result<api::Seller, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::AdjustDeposit {
                by: my_id,
                seller_id: seller_id.into(),
                amount,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Removes the `Seller`, so it can neither sign in nor use its issued
    /// sessions anymore.
    ///
    /// `Booking`s and the deposit of the `Seller` are kept untouched.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `SELLER_NOT_EXISTS` - the `Seller` does not exist or is removed
    ///                         already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "removeSeller",
            otel.name = Self::SPAN_NAME,
            seller_id = %seller_id,
        ),
    )]
    pub async fn remove_seller(
        seller_id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id();

        ctx.service()
            .execute(command::RemoveSeller {
                by: my_id,
                seller_id: seller_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum ExistenceError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the specified ID does not exist"]
        Booking,

        #[code = "SELLER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Seller` with the specified ID does not exist"]
        Seller,
    }
}

impl AsError for DepositError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INSUFFICIENT_DEPOSIT"]
                #[status = CONFLICT]
                #[message = "Deposit balance is insufficient"]
                Insufficient,
            }
        }

        match self {
            Self::Insufficient { .. } => Some(Error::Insufficient.into()),
            Self::Overflow => None,
        }
    }
}

impl AsError for booking::TransitionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_TRANSITION"]
                #[status = BAD_REQUEST]
                #[message = "`Booking` cannot be moved to the status"]
                InvalidTransition,
            }
        }

        Some(Error::InvalidTransition.into())
    }
}

impl AsError for command::create_seller::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another `User`"]
                LoginOccupied,

                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(e) => e.try_as_error(),
            Self::PasswordHash(_) => None,
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::BusinessNumberOccupied(_) => {
                Some(BusinessError::NumberOccupied.into())
            }
            Self::BusinessNotActive(status) => Some(
                crate::Error::from(BusinessError::NotActive)
                    .with_payload(Some(status.payload.clone())),
            ),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::verify_business::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(e) => e.try_as_error(),
            Self::BusinessNotActive(status) => Some(
                Error::from(BusinessError::NotActive)
                    .with_payload(Some(status.payload.clone())),
            ),
            Self::BusinessNumberOccupied(_) => {
                Some(BusinessError::NumberOccupied.into())
            }
            Self::SellerNotExists(_) => Some(ExistenceError::Seller.into()),
        }
    }
}

impl AsError for command::grant_admin_role::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the specified email does not exist"]
                UnknownEmail,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::UnknownEmail(_) => Some(Error::UnknownEmail.into()),
        }
    }
}

impl AsError for command::place_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_ITEMS"]
                #[status = BAD_REQUEST]
                #[message = "At least one item must be provided"]
                NoItems,

                #[code = "NOT_SELLER"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` must be a `Seller`"]
                NotSeller,

                #[code = "CAPACITY_EXCEEDED"]
                #[status = CONFLICT]
                #[message = "`Date` has no capacity left for the items"]
                CapacityExceeded,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Pricing(e) => e.try_as_error(),
            Self::Deposit(e) => e.try_as_error(),
            Self::NoItems => Some(Error::NoItems.into()),
            Self::SellerNotExists(_) => Some(Error::NotSeller.into()),
            Self::CapacityExceeded { date, remaining } => {
                let mut err = crate::Error::from(Error::CapacityExceeded);
                err.message = format!(
                    "`{date}` has no capacity left: {remaining} remaining",
                );
                Some(err)
            }
        }
    }
}

impl AsError for command::set_capacity::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
        }
    }
}

impl AsError for command::update_booking_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::BookingNotExists(_) => Some(ExistenceError::Booking.into()),
        }
    }
}

impl AsError for command::set_booking_payment_type::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::BookingNotExists(_) => Some(ExistenceError::Booking.into()),
        }
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use booking::CancellationError as C;

        define_error! {
            enum Error {
                #[code = "INVALID_QUANTITY"]
                #[status = BAD_REQUEST]
                #[message = "Cannot cancel more units than booked"]
                InvalidQuantity,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Cancellation(C::InvalidTransition(e)) => e.try_as_error(),
            Self::Cancellation(C::InvalidQuantity { .. }) => {
                Some(Error::InvalidQuantity.into())
            }
            Self::Cancellation(C::Overflow) => None,
            Self::Deposit(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::BookingNotExists(_) => Some(ExistenceError::Booking.into()),
            Self::SellerNotExists(_) => None,
        }
    }
}

impl AsError for command::adjust_deposit::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Deposit(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::SellerNotExists(_) => Some(ExistenceError::Seller.into()),
        }
    }
}

impl AsError for command::remove_seller::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::SellerNotExists(_) => Some(ExistenceError::Seller.into()),
        }
    }
}

define_error! {
    enum BusinessError {
        #[code = "BUSINESS_NOT_ACTIVE"]
        #[status = BAD_REQUEST]
        #[message = "Business registration number doesn't denote an \
                     active business"]
        NotActive,

        #[code = "BUSINESS_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Business registration number is registered by \
                     another `Seller`"]
        NumberOccupied,
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};
    use service::{command, domain::seller::DepositError};

    use crate::AsError as _;

    #[test]
    fn maps_capacity_and_deposit_errors() {
        let err = command::place_order::ExecutionError::CapacityExceeded {
            date: "2025-03-09".parse::<Date>().unwrap(),
            remaining: -5,
        }
        .as_error();
        assert_eq!(err.code, "CAPACITY_EXCEEDED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert!(err.message.contains("-5 remaining"));

        let err = command::adjust_deposit::ExecutionError::Deposit(
            DepositError::Insufficient {
                balance: Money::new(1_000),
                amount: Money::new(-1_001),
            },
        )
        .as_error();
        assert_eq!(err.code, "INSUFFICIENT_DEPOSIT");
    }

    #[test]
    fn unexpected_failures_are_internal() {
        let err = command::cancel_booking::ExecutionError::Cancellation(
            service::domain::booking::CancellationError::Overflow,
        )
        .as_error();
        assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn maps_seller_removal_errors() {
        use command::remove_seller::ExecutionError as E;

        let id = service::domain::user::Id::new();
        assert_eq!(E::NotAdmin(id).as_error().code, "NOT_ADMIN");
        let err = E::SellerNotExists(id).as_error();
        assert_eq!(err.code, "SELLER_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
