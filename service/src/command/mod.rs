//! [`Command`] definition.

pub mod adjust_deposit;
pub mod authorize_user_session;
pub mod cancel_booking;
pub mod confirm_payment;
pub mod create_seller;
pub mod create_user_session;
pub mod grant_admin_role;
pub mod place_order;
pub mod remove_seller;
pub mod set_booking_payment_type;
pub mod set_capacity;
pub mod update_booking_status;
pub mod verify_business;

use std::{fmt, future::Future};

use tracerr::Traced;
use tracing as log;

use crate::Service;

/// [`Command`] of the [`Service`].
pub use common::Handler as Command;

pub use self::{
    adjust_deposit::AdjustDeposit,
    authorize_user_session::AuthorizeUserSession,
    cancel_booking::CancelBooking, confirm_payment::ConfirmPayment,
    create_seller::CreateSeller, create_user_session::CreateUserSession,
    grant_admin_role::GrantAdminRole, place_order::PlaceOrder,
    remove_seller::RemoveSeller,
    set_booking_payment_type::SetBookingPaymentType,
    set_capacity::SetCapacity, update_booking_status::UpdateBookingStatus,
    verify_business::VerifyBusiness,
};

/// Error of a [`Command`] execution which may be caused by a concurrent
/// modification.
pub trait Conflicting {
    /// Indicates whether this error is caused by a concurrent modification,
    /// so the [`Command`] may be re-submitted.
    fn is_conflict(&self) -> bool;
}

impl<E: Conflicting> Conflicting for Traced<E> {
    fn is_conflict(&self) -> bool {
        self.as_ref().is_conflict()
    }
}

impl<Db, Gw> Service<Db, Gw> {
    /// Runs the provided transactional `attempt` of a [`Command`], re-running
    /// it on a [`Conflicting`] error up to [`Config::max_attempts`] times.
    ///
    /// [`Config::max_attempts`]: crate::Config::max_attempts
    pub(crate) async fn retry_on_conflict<T, E, F, Fut>(
        &self,
        command: &'static str,
        mut attempt: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Conflicting + fmt::Display,
    {
        let max_attempts = self.config().max_attempts.max(1);
        let mut n = 1;
        loop {
            match attempt().await {
                Err(e) if n < max_attempts && e.is_conflict() => {
                    log::warn!(
                        "`{command}` attempt {n}/{max_attempts} conflicted, \
                         retrying: {e}",
                    );
                    n += 1;
                }
                res => return res,
            }
        }
    }
}
