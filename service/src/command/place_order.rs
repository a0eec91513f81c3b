//! [`Command`] for placing an [`Order`] of [`Booking`]s.

use std::collections::BTreeMap;

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, Money,
};
use derive_more::{Display, Error, From};
use serde::Deserialize;
use tracerr::Traced;

use crate::{
    domain::{
        booking::Product,
        capacity::Slots,
        pricing::{self, PricingError, Quote},
        seller::DepositError,
        user, Booking, Capacity, Order, Seller,
    },
    infra::{database, Database},
    read::{capacity::Range, Availability},
    Service,
};

use super::{Command, Conflicting};

/// [`Command`] for placing an [`Order`] of [`Booking`]s.
#[derive(Clone, Debug)]
pub struct PlaceOrder {
    /// ID of the [`Seller`] placing the [`Order`].
    pub seller_id: user::Id,

    /// [`Item`]s to be booked.
    pub items: Vec<Item>,

    /// Indicator whether the [`Seller`]'s deposit should be used to pay the
    /// [`Order`].
    pub use_deposit: bool,
}

/// Item of a [`PlaceOrder`] [`Command`].
#[derive(Clone, Debug)]
pub struct Item {
    /// [`pricing::Item`] to be priced and booked.
    pub pricing: pricing::Item,

    /// [`Product`] to be reviewed.
    pub product: Product,
}

/// [`PlaceOrder`] configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Indicator whether a [`Booking`] must fit into the remaining capacity
    /// of its [`Date`], rather than just requiring some capacity to remain.
    pub strict_capacity: bool,
}

/// Output of [`PlaceOrder`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Placed [`Order`].
    pub order: Order,

    /// [`Booking`]s of the placed [`Order`].
    pub bookings: Vec<Booking>,
}

impl<Db, Gw> Command<PlaceOrder> for Service<Db, Gw>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Seller, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Capacity, Date>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Seller>, user::Id>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Availability>, Range>>,
            Ok = Vec<Availability>,
            Err = Traced<database::Error>,
        > + Database<Update<Seller>, Ok = (), Err = Traced<database::Error>>
        + Database<Insert<Order>, Ok = (), Err = Traced<database::Error>>
        + Database<Insert<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: PlaceOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PlaceOrder {
            seller_id,
            items,
            use_deposit,
        } = cmd;
        if items.is_empty() {
            return Err(tracerr::new!(E::NoItems));
        }

        let quote = Quote::compute(
            &self.config().pricing,
            items.iter().map(|i| i.pricing),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let mut units = BTreeMap::<Date, i64>::new();
        for i in &items {
            *units.entry(i.pricing.date).or_default() +=
                i64::from(i.pricing.quantity.get());
        }

        let strict_capacity = self.config().place_order.strict_capacity;
        let (units, quote, items) = (&units, &quote, &items);

        self.retry_on_conflict(
            "PlaceOrder",
            || async move {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Lock the `Seller` before any `Date`, and `Date`s in
                // ascending order, so concurrent orders never deadlock.
                tx.execute(Lock(By::<Seller, _>::new(seller_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                for date in units.keys() {
                    tx.execute(Lock(By::<Capacity, _>::new(*date)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                }

                let mut seller = tx
                    .execute(Select(By::<Option<Seller>, _>::new(seller_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::SellerNotExists(seller_id))
                    .map_err(tracerr::wrap!())?;

                for (date, units) in units {
                    let availability = tx
                        .execute(Select(By::new(Range::single(*date))))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?
                        .into_iter()
                        .next()
                        .unwrap_or(Availability {
                            date: *date,
                            capacity: Slots::ZERO,
                            booked: 0,
                        });
                    if !availability.accepts(*units, strict_capacity) {
                        return Err(tracerr::new!(E::CapacityExceeded {
                            date: *date,
                            remaining: availability.remaining(),
                        }));
                    }
                }

                let deposit_applied = if use_deposit {
                    seller.usable_deposit(quote.total)
                } else {
                    Money::ZERO
                };
                if deposit_applied != Money::ZERO {
                    _ = seller
                        .apply(-deposit_applied)
                        .map_err(tracerr::from_and_wrap!(=> E))?;
                    tx.execute(Update(seller))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                }

                let order = Order::new(seller_id, quote, deposit_applied);
                tx.execute(Insert(order.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                let mut bookings = Vec::with_capacity(items.len());
                for (line, item) in quote.lines.iter().zip(items) {
                    let booking = Booking::new(
                        order.id,
                        seller_id,
                        *line,
                        item.product.clone(),
                    );
                    tx.execute(Insert(booking.clone()))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    bookings.push(booking);
                }

                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                Ok::<_, Traced<E>>(Output { order, bookings })
            },
        )
        .await
    }
}

/// Error of [`PlaceOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`pricing::Item`] cannot be priced.
    #[display("Failed to price an item: {_0}")]
    Pricing(PricingError),

    /// Deposit cannot be applied.
    #[display("Failed to apply the deposit: {_0}")]
    Deposit(DepositError),

    /// No [`Item`]s provided.
    #[display("No items provided")]
    NoItems,

    /// [`Seller`] doesn't exist.
    #[display("`Seller(id: {_0})` does not exist")]
    #[from(ignore)]
    SellerNotExists(#[error(not(source))] user::Id),

    /// [`Date`] has no capacity left for the requested units.
    #[display("`{date}` has no capacity left: {remaining} remaining")]
    #[from(ignore)]
    CapacityExceeded {
        /// [`Date`] with no capacity left.
        date: Date,

        /// Units remaining on the [`Date`].
        remaining: i64,
    },
}

impl Conflicting for ExecutionError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_conflict())
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, DateTime, Money};

    use crate::{
        command::Conflicting as _,
        domain::{
            booking::{self, Product, ProductName},
            capacity::Slots,
            order,
            pricing::{self, DeliveryType, Quantity, ReviewType},
            Capacity,
        },
        test_support::{self, service, Stub, TestService},
        Command as _,
    };

    use super::{ExecutionError, Item, Output, PlaceOrder};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn item(day: &str, review_type: ReviewType, quantity: i32) -> Item {
        Item {
            pricing: pricing::Item {
                date: date(day),
                delivery_type: DeliveryType::RealDelivery,
                review_type,
                quantity: Quantity::new(quantity).unwrap(),
                product_price: Money::new(10_000),
            },
            product: Product {
                name: ProductName::new("Tumbler").unwrap(),
                option: None,
                url: None,
                keywords: None,
                review_guide: None,
                remarks: None,
            },
        }
    }

    async fn set_capacity(svc: &TestService, day: &str, slots: i32) {
        let capacity = Capacity {
            date: date(day),
            slots: Slots::new(slots).unwrap(),
            updated_at: DateTime::now().coerce(),
        };
        svc.database()
            .seed(|s| drop(s.capacities.insert(capacity.date, capacity)))
            .await;
    }

    #[tokio::test]
    async fn places_order_with_deposit() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 9_672).await;
        set_capacity(&svc, "2025-03-10", 50).await;

        let Output { order, bookings } = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::StarRating, 3)],
                use_deposit: true,
            })
            .await
            .unwrap();

        assert_eq!(order.subtotal, Money::new(34_800));
        assert_eq!(order.total, Money::new(39_672));
        assert_eq!(order.deposit_applied, Money::new(9_672));
        assert_eq!(order.payable, Money::new(30_000));
        assert_eq!(order.status, order::Status::AwaitingPayment);
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, booking::Status::Unconfirmed);
        assert_eq!(bookings[0].line_total, Money::new(34_800));

        let state = svc.database().state().await;
        assert_eq!(state.sellers[&seller.id].deposit, Money::ZERO);
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.bookings.len(), 1);
    }

    #[tokio::test]
    async fn fully_covered_order_is_paid() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 100_000).await;
        set_capacity(&svc, "2025-03-10", 50).await;

        let Output { order, .. } = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::StarRating, 3)],
                use_deposit: true,
            })
            .await
            .unwrap();

        assert_eq!(order.payable, Money::ZERO);
        assert_eq!(order.status, order::Status::Paid);
        let state = svc.database().state().await;
        assert_eq!(state.sellers[&seller.id].deposit, Money::new(60_328));
    }

    #[tokio::test]
    async fn keeps_deposit_when_not_used() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 5_000).await;
        set_capacity(&svc, "2025-03-10", 50).await;

        let Output { order, .. } = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::Text, 1)],
                use_deposit: false,
            })
            .await
            .unwrap();

        assert_eq!(order.deposit_applied, Money::ZERO);
        assert_eq!(order.payable, order.total);
        let state = svc.database().state().await;
        assert_eq!(state.sellers[&seller.id].deposit, Money::new(5_000));
    }

    #[tokio::test]
    async fn overbooks_while_capacity_remains() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;
        set_capacity(&svc, "2025-03-10", 50).await;

        for q in [10, 15, 5, 25] {
            _ = svc
                .execute(PlaceOrder {
                    seller_id: seller.id,
                    items: vec![item("2025-03-10", ReviewType::Photo, q)],
                    use_deposit: false,
                })
                .await
                .unwrap();
        }

        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::Photo, 1)],
                use_deposit: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::CapacityExceeded { remaining: -5, .. },
        ));
        assert_eq!(svc.database().state().await.bookings.len(), 4);
    }

    #[tokio::test]
    async fn rejects_whole_order_on_any_full_date() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 50_000).await;
        set_capacity(&svc, "2025-03-10", 10).await;

        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![
                    item("2025-03-10", ReviewType::Text, 1),
                    item("2025-03-11", ReviewType::Text, 1),
                ],
                use_deposit: true,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::CapacityExceeded { remaining: 0, .. },
        ));
        let state = svc.database().state().await;
        assert!(state.bookings.is_empty());
        assert!(state.orders.is_empty());
        assert_eq!(state.sellers[&seller.id].deposit, Money::new(50_000));
    }

    #[tokio::test]
    async fn strict_capacity_aggregates_same_date() {
        let mut svc = service(Stub::default());
        svc.config.place_order.strict_capacity = true;
        let seller = test_support::seller(&svc, 0).await;
        set_capacity(&svc, "2025-03-10", 10).await;

        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![
                    item("2025-03-10", ReviewType::Text, 6),
                    item("2025-03-10", ReviewType::Photo, 5),
                ],
                use_deposit: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::CapacityExceeded { remaining: 10, .. },
        ));

        let Output { bookings, .. } = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![
                    item("2025-03-10", ReviewType::Text, 6),
                    item("2025-03-10", ReviewType::Photo, 4),
                ],
                use_deposit: false,
            })
            .await
            .unwrap();
        assert_eq!(bookings.len(), 2);
    }

    #[tokio::test]
    async fn rejects_unpriceable_items_before_storage() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;
        set_capacity(&svc, "2025-03-10", 10).await;

        let mut unsupported = item("2025-03-10", ReviewType::Photo, 1);
        unsupported.pricing.delivery_type = DeliveryType::EmptyBox;
        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![unsupported],
                use_deposit: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Pricing(_)));

        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![],
                use_deposit: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoItems));
        assert_eq!(svc.database().commits(), 0);
    }

    #[tokio::test]
    async fn retries_conflicts() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;
        set_capacity(&svc, "2025-03-10", 10).await;
        svc.database().fail_commits(2);

        let Output { order, .. } = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::Text, 1)],
                use_deposit: false,
            })
            .await
            .unwrap();

        assert_eq!(svc.database().commits(), 1);
        let state = svc.database().state().await;
        assert_eq!(state.orders.len(), 1);
        assert!(state.orders.contains_key(&order.id));
        assert_eq!(state.bookings.len(), 1);
    }

    #[tokio::test]
    async fn reports_conflict_after_max_attempts() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;
        set_capacity(&svc, "2025-03-10", 10).await;
        svc.database().fail_commits(3);

        let err = svc
            .execute(PlaceOrder {
                seller_id: seller.id,
                items: vec![item("2025-03-10", ReviewType::Text, 1)],
                use_deposit: false,
            })
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(svc.database().commits(), 0);
        assert!(svc.database().state().await.orders.is_empty());
    }
}
