//! [`Command`] for cancelling a [`Booking`] by seller fault.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, CancellationError},
        pricing::Quantity,
        seller::DepositError,
        user, Booking, Seller, User,
    },
    infra::{database, Database},
    Service,
};

use super::{Command, Conflicting};

/// [`Command`] for cancelling a [`Booking`] by seller fault.
///
/// The product price of the cancelled units is credited to the [`Seller`]'s
/// deposit.
#[derive(Clone, Copy, Debug)]
pub struct CancelBooking {
    /// ID of the admin [`User`] cancelling the [`Booking`].
    pub by: user::Id,

    /// ID of the [`Booking`] to cancel.
    pub booking_id: booking::Id,

    /// [`Quantity`] of units to cancel.
    pub quantity: Quantity,
}

/// Output of [`CancelBooking`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Cancelled (or reduced, if cancelled partially) [`Booking`].
    pub booking: Booking,

    /// [`Booking`] holding the cancelled units of a partially cancelled
    /// [`Booking`].
    pub split: Option<Booking>,

    /// [`Seller`] with the credited deposit.
    pub seller: Seller,
}

impl<Db, Gw> Command<CancelBooking> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Seller>, user::Id>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Booking, booking::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Seller, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Seller>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelBooking,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelBooking {
            by,
            booking_id,
            quantity,
        } = cmd;

        let admin = self
            .database()
            .execute(Select(By::new(by)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !admin.is_some_and(|u| u.is_admin()) {
            return Err(tracerr::new!(E::NotAdmin(by)));
        }

        self.retry_on_conflict(
            "CancelBooking",
            || async move {
                let tx = self
                    .database()
                    .execute(Transact)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                // Lock the `Booking` before its `Seller`, so concurrent
                // cancellations never deadlock.
                tx.execute(Lock(By::<Booking, _>::new(booking_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                let mut booking = tx
                    .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::BookingNotExists(booking_id))
                    .map_err(tracerr::wrap!())?;

                tx.execute(Lock(By::<Seller, _>::new(booking.seller_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                let mut seller = tx
                    .execute(Select(By::<Option<Seller>, _>::new(
                        booking.seller_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::SellerNotExists(booking.seller_id))
                    .map_err(tracerr::wrap!())?;

                let cancellation = booking
                    .cancel_by_seller_fault(quantity)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                _ = seller
                    .apply(cancellation.refund)
                    .map_err(tracerr::from_and_wrap!(=> E))?;

                tx.execute(Update(booking.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if let Some(split) = &cancellation.split {
                    tx.execute(Insert(split.clone()))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                }
                tx.execute(Update(seller.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                Ok::<_, Traced<E>>(Output {
                    booking,
                    split: cancellation.split,
                    seller,
                })
            },
        )
        .await
    }
}

/// Error of [`CancelBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Booking`] cannot be cancelled.
    #[display("{_0}")]
    Cancellation(CancellationError),

    /// Refund cannot be credited to the deposit.
    #[display("Failed to credit the deposit: {_0}")]
    Deposit(DepositError),

    /// [`User`] cancelling the [`Booking`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Booking`] doesn't exist.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Seller`] of the [`Booking`] doesn't exist.
    #[display("`Seller(id: {_0})` does not exist")]
    #[from(ignore)]
    SellerNotExists(#[error(not(source))] user::Id),
}

impl Conflicting for ExecutionError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_conflict())
    }
}
