//! [`Command`] for removing a [`Seller`] by an admin.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Booking, Seller};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`Seller`] by an admin.
///
/// Marks the [`User`] of the [`Seller`] as deleted, so it can neither sign
/// in nor use its issued sessions anymore. [`Booking`]s and the deposit of
/// the [`Seller`] are kept untouched.
#[derive(Clone, Copy, Debug)]
pub struct RemoveSeller {
    /// ID of the admin [`User`] removing the [`Seller`].
    pub by: user::Id,

    /// ID of the [`Seller`] to remove.
    pub seller_id: user::Id,
}

impl<Db, Gw> Command<RemoveSeller> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RemoveSeller) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveSeller { by, seller_id } = cmd;

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

        tx.execute(Lock(By::<User, _>::new(seller_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(seller_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|u| u.role == user::Role::Seller)
            .ok_or(E::SellerNotExists(seller_id))
            .map_err(tracerr::wrap!())?;

        _ = user.deleted_at.replace(DateTime::now().coerce());
        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`RemoveSeller`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] removing the [`Seller`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Seller`] doesn't exist or is removed already.
    #[display("`Seller(id: {_0})` does not exist")]
    #[from(ignore)]
    SellerNotExists(#[error(not(source))] user::Id),
}
