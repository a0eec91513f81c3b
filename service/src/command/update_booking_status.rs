//! [`Command`] for moving a [`Booking`] to another [`booking::Status`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::command::CancelBooking;
use crate::{
    domain::{booking, user, Booking, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a [`Booking`] to another [`booking::Status`].
///
/// Cancellation is done with [`CancelBooking`] instead.
#[derive(Clone, Copy, Debug)]
pub struct UpdateBookingStatus {
    /// ID of the admin [`User`] updating the [`Booking`].
    pub by: user::Id,

    /// ID of the [`Booking`] to update.
    pub booking_id: booking::Id,

    /// New [`booking::Status`] of the [`Booking`].
    pub status: booking::Status,
}

impl<Db, Gw> Command<UpdateBookingStatus> for Service<Db, Gw>
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
            Lock<By<Booking, booking::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateBookingStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateBookingStatus {
            by,
            booking_id,
            status,
        } = cmd;

        let admin = self
            .database()
            .execute(Select(By::new(by)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !admin.is_some_and(|u| u.is_admin()) {
            return Err(tracerr::new!(E::NotAdmin(by)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Booking`.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        booking
            .transition(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(booking)
    }
}

/// Error of [`UpdateBookingStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`booking::Status`] transition is not allowed.
    #[display("{_0}")]
    Transition(booking::TransitionError),

    /// [`User`] updating the [`Booking`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Booking`] doesn't exist.
    #[display("`Booking(id: {_0})` does not exist")]
    #[from(ignore)]
    BookingNotExists(#[error(not(source))] booking::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{booking::Status, user},
        test_support::{self, service, Stub},
        Command as _,
    };

    use super::{ExecutionError, UpdateBookingStatus};

    #[tokio::test]
    async fn walks_booking_lifecycle() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let booking = test_support::booking(&svc, 3).await;

        for status in [Status::Confirmed, Status::Purchased, Status::Reviewed]
        {
            let updated = svc
                .execute(UpdateBookingStatus {
                    by: admin.id,
                    booking_id: booking.id,
                    status,
                })
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }

        let state = svc.database().state().await;
        let stored = &state.bookings[&booking.id];
        assert_eq!(stored.status, Status::Reviewed);
        assert!(stored.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn rejects_invalid_transitions() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let booking = test_support::booking(&svc, 3).await;

        for status in [Status::Purchased, Status::CancelledBySellerFault] {
            let err = svc
                .execute(UpdateBookingStatus {
                    by: admin.id,
                    booking_id: booking.id,
                    status,
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::Transition(_)));
        }

        let err = svc
            .execute(UpdateBookingStatus {
                by: booking.seller_id,
                booking_id: booking.id,
                status: Status::Confirmed,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));

        let state = svc.database().state().await;
        assert_eq!(state.bookings[&booking.id].status, Status::Unconfirmed);
    }
}
