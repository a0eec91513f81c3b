//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use derive_more::Debug;

#[cfg(doc)]
use infra::{Database, Gateway};

use self::domain::pricing;

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`pricing::Policy`] bookings are priced with.
    pub pricing: pricing::Policy,

    /// [`command::PlaceOrder`] configuration.
    pub place_order: command::place_order::Config,

    /// Maximum number of attempts to execute a [`Command`] touching
    /// deposits or capacities in presence of concurrent modifications.
    pub max_attempts: u8,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Gw> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Gateway`] to third-party APIs of this [`Service`].
    gateway: Gw,
}

impl<Db, Gw> Service<Db, Gw> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, gateway: Gw) -> Self {
        Self {
            config,
            database,
            gateway,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Gateway`] of this [`Service`].
    #[must_use]
    pub fn gateway(&self) -> &Gw {
        &self.gateway
    }
}

#[cfg(test)]
mod test_support {
    //! Helpers shared by [`Command`] and [`Query`] tests.

    use common::{Date, DateTime, Money};
    use secrecy::SecretBox;
    use uuid::Uuid;

    use crate::{
        command::place_order,
        domain::{
            booking::{self, Product, ProductName},
            pricing::{self, DeliveryType, Line, Quantity, ReviewType},
            seller::BusinessNumber,
            user, Booking, Order, Seller, User,
        },
        infra::database::Memory,
        Config, Service,
    };

    pub(crate) use crate::infra::gateway::Stub;

    /// [`Service`] backed by [`Memory`] and [`Stub`].
    pub(crate) type TestService = Service<Memory, Stub>;

    /// Creates a new [`TestService`] answering with the provided [`Stub`].
    pub(crate) fn service(gateway: Stub) -> TestService {
        Service::new(
            Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    b"secret",
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    b"secret",
                ),
                pricing: pricing::Policy::default(),
                place_order: place_order::Config::default(),
                max_attempts: 3,
            },
            Memory::default(),
            gateway,
        )
    }

    /// Wraps the provided plain-text password into a secret.
    pub(crate) fn password(s: &str) -> SecretBox<user::Password> {
        let password = user::Password::new(s).unwrap();
        SecretBox::init_with(move || password)
    }

    /// Stores a new [`User`] with the provided [`user::Role`].
    ///
    /// Its password is `password1`.
    pub(crate) async fn user(svc: &TestService, role: user::Role) -> User {
        let id = user::Id::new();
        let tag = Uuid::from(id).simple().to_string()[..12].to_owned();
        let user = User {
            id,
            name: user::Name::new(format!("User {tag}")).unwrap(),
            login: user::Login::new(format!("u{tag}")).unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("password1").unwrap(),
            )
            .unwrap(),
            email: user::Email::new(format!("{tag}@example.com")).unwrap(),
            phone: None,
            role,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        let stored = user.clone();
        svc.database()
            .seed(|s| drop(s.users.insert(stored.id, stored)))
            .await;
        user
    }

    /// Stores a new verified [`Seller`] with the provided `deposit`.
    pub(crate) async fn seller(svc: &TestService, deposit: i64) -> Seller {
        let user = user(svc, user::Role::Seller).await;
        let digits = Uuid::from(user.id).as_u128() % 10_000_000_000;
        let seller = Seller {
            id: user.id,
            business_number: BusinessNumber::new(format!("{digits:010}"))
                .unwrap(),
            verified_at: Some(DateTime::now().coerce()),
            referrer: None,
            deposit: Money::new(deposit),
            created_at: DateTime::now().coerce(),
        };
        let stored = seller.clone();
        svc.database()
            .seed(|s| drop(s.sellers.insert(stored.id, stored)))
            .await;
        seller
    }

    /// Stores a new [`Booking`] of the provided `quantity` in the provided
    /// [`booking::Status`], along with its [`Order`] and [`Seller`].
    ///
    /// The [`Booking`] is of photo reviews on Sunday `2025-03-09`, with the
    /// product price of 10,000 won.
    pub(crate) async fn booking_in(
        svc: &TestService,
        quantity: i32,
        status: booking::Status,
    ) -> Booking {
        let seller = seller(svc, 0).await;
        let line = Line::price(
            &svc.config().pricing,
            pricing::Item {
                date: "2025-03-09".parse::<Date>().unwrap(),
                delivery_type: DeliveryType::RealDelivery,
                review_type: ReviewType::Photo,
                quantity: Quantity::new(quantity).unwrap(),
                product_price: Money::new(10_000),
            },
        )
        .unwrap();
        let quote = pricing::Quote {
            lines: vec![line],
            subtotal: line.total,
            total: svc.config().pricing.total(line.total).unwrap(),
        };
        let order = Order::new(seller.id, &quote, Money::ZERO);
        let mut booking = Booking::new(
            order.id,
            seller.id,
            line,
            Product {
                name: ProductName::new("Tumbler").unwrap(),
                option: None,
                url: None,
                keywords: None,
                review_guide: None,
                remarks: None,
            },
        );
        for s in [
            booking::Status::Confirmed,
            booking::Status::Purchased,
            booking::Status::Reviewed,
        ] {
            if booking.status == status {
                break;
            }
            booking.transition(s).unwrap();
        }
        if status == booking::Status::CancelledBySellerFault {
            booking.status = status;
        }

        let stored = booking.clone();
        svc.database()
            .seed(|s| {
                drop(s.orders.insert(order.id, order));
                drop(s.bookings.insert(stored.id, stored));
            })
            .await;
        booking
    }

    /// Stores a new [`booking::Status::Unconfirmed`] [`Booking`], see
    /// [`booking_in()`].
    pub(crate) async fn booking(svc: &TestService, quantity: i32) -> Booking {
        booking_in(svc, quantity, booking::Status::Unconfirmed).await
    }
}
