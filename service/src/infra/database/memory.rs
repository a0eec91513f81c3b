//! In-memory [`Database`] implementation for tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    Date,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{
        booking, order, seller::BusinessNumber, user, Booking, Capacity, Order,
        Payment, Seller, User,
    },
    infra::{database, Database},
    read::{booking::ProgressMonth, capacity::Range, Availability},
};

/// Stored data of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`User`]s.
    pub users: HashMap<user::Id, User>,

    /// Stored [`Seller`]s.
    pub sellers: HashMap<user::Id, Seller>,

    /// Stored [`Booking`]s.
    pub bookings: BTreeMap<booking::Id, Booking>,

    /// Stored [`Capacity`]s.
    pub capacities: BTreeMap<Date, Capacity>,

    /// Stored [`Order`]s.
    pub orders: HashMap<order::Id, Order>,

    /// Stored [`Payment`]s.
    pub payments: Vec<Payment>,
}

/// In-memory [`Database`].
///
/// [`Transact`] takes a snapshot of the committed [`State`], and [`Commit`]
/// replaces the committed [`State`] with the snapshot.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed [`State`].
    committed: Arc<RwLock<State>>,

    /// [`State`] of the started transaction, if any.
    staged: Option<Arc<RwLock<State>>>,

    /// Number of the next [`Commit`]s to fail with [`Error::Conflict`].
    conflicts: Arc<AtomicUsize>,

    /// Number of successful [`Commit`]s.
    commits: Arc<AtomicUsize>,
}

impl Memory {
    /// Makes the next `n` [`Commit`]s fail with [`Error::Conflict`].
    pub fn fail_commits(&self, n: usize) {
        self.conflicts.store(n, Ordering::SeqCst);
    }

    /// Returns the number of successful [`Commit`]s.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Returns a copy of the committed [`State`].
    pub async fn state(&self) -> State {
        self.committed.read().await.clone()
    }

    /// Modifies the committed [`State`] directly.
    pub async fn seed(&self, f: impl FnOnce(&mut State)) {
        f(&mut *self.committed.write().await);
    }

    /// Returns the [`State`] operations are applied to.
    fn current(&self) -> &RwLock<State> {
        self.staged.as_deref().unwrap_or(&self.committed)
    }

    /// Reads the current [`State`].
    async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        f(&*self.current().read().await)
    }

    /// Modifies the current [`State`].
    async fn write(&self, f: impl FnOnce(&mut State)) {
        f(&mut *self.current().write().await);
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Concurrent modification detected on [`Commit`].
    #[display("Concurrent modification detected")]
    Conflict,
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.staged.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.committed.read().await.clone();
        Ok(Self {
            staged: Some(Arc::new(RwLock::new(snapshot))),
            ..self.clone()
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let failed = self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok();
        if failed {
            return Err(tracerr::new!(database::Error::from(Error::Conflict)));
        }

        if let Some(staged) = &self.staged {
            *self.committed.write().await = staged.read().await.clone();
        }
        _ = self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<W, B> Database<Lock<By<W, B>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .read(|s| {
                s.users
                    .get(&id)
                    .filter(|u| u.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .read(|s| {
                s.users
                    .values()
                    .find(|u| &u.login == login && u.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .read(|s| {
                s.users
                    .values()
                    .find(|u| &u.email == email && u.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl Database<Select<By<Option<Seller>, user::Id>>> for Memory {
    type Ok = Option<Seller>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Seller>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.sellers.get(&id).cloned()).await)
    }
}

impl<'n> Database<Select<By<Option<Seller>, &'n BusinessNumber>>> for Memory {
    type Ok = Option<Seller>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Seller>, &'n BusinessNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        Ok(self
            .read(|s| {
                s.sellers
                    .values()
                    .find(|seller| &seller.business_number == number)
                    .cloned()
            })
            .await)
    }
}

impl Database<Select<By<Option<Booking>, booking::Id>>> for Memory {
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.bookings.get(&id).cloned()).await)
    }
}

impl Database<Select<By<Vec<Booking>, order::Id>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .read(|s| {
                s.bookings
                    .values()
                    .filter(|b| b.order_id == id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

impl Database<Select<By<Vec<Booking>, ProgressMonth>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, ProgressMonth>>,
    ) -> Result<Self::Ok, Self::Err> {
        let month = by.into_inner();
        let mut bookings: Vec<Booking> = self
            .read(|s| {
                s.bookings
                    .values()
                    .filter(|b| {
                        (month.first()..=month.last()).contains(&b.date)
                            && b.status == booking::Status::Confirmed
                    })
                    .cloned()
                    .collect()
            })
            .await;
        bookings.sort_by_key(|b| (b.confirmed_at, b.created_at, b.date));
        Ok(bookings)
    }
}

impl Database<Select<By<Vec<Booking>, Range>>> for Memory {
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, Range>>,
    ) -> Result<Self::Ok, Self::Err> {
        let range = by.into_inner();
        let mut bookings: Vec<Booking> = self
            .read(|s| {
                s.bookings
                    .values()
                    .filter(|b| {
                        (range.first()..=range.last()).contains(&b.date)
                    })
                    .cloned()
                    .collect()
            })
            .await;
        bookings.sort_by_key(|b| (b.date, b.id));
        Ok(bookings)
    }
}

impl Database<Select<By<Vec<Availability>, Range>>> for Memory {
    type Ok = Vec<Availability>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Availability>, Range>>,
    ) -> Result<Self::Ok, Self::Err> {
        let range = by.into_inner();
        Ok(self
            .read(|s| {
                let capacities = s
                    .capacities
                    .range(range.first()..=range.last())
                    .map(|(_, c)| *c)
                    .collect::<Vec<_>>();
                let booked = s
                    .bookings
                    .values()
                    .filter(|b| b.status.is_active())
                    .map(|b| (b.date, i64::from(b.quantity.get())))
                    .collect::<Vec<_>>();
                range.availability(&capacities, &booked)
            })
            .await)
    }
}

impl Database<Select<By<Option<Order>, order::Id>>> for Memory {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.orders.get(&id).cloned()).await)
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.users.insert(user.id, user))).await;
        Ok(())
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(user)).await
    }
}

impl Database<Insert<Seller>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(seller): Insert<Seller>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.sellers.insert(seller.id, seller))).await;
        Ok(())
    }
}

impl Database<Update<Seller>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(seller): Update<Seller>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(seller)).await
    }
}

impl Database<Insert<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.bookings.insert(booking.id, booking)))
            .await;
        Ok(())
    }
}

impl Database<Update<Booking>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(booking)).await
    }
}

impl Database<Insert<Capacity>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(capacity): Insert<Capacity>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.capacities.insert(capacity.date, capacity)))
            .await;
        Ok(())
    }
}

impl Database<Insert<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.orders.insert(order.id, order))).await;
        Ok(())
    }
}

impl Database<Update<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Insert(order)).await
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.payments.push(payment)).await;
        Ok(())
    }
}
