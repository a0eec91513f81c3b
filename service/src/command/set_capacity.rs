//! [`Command`] for setting a [`Capacity`] of a [`Date`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{capacity::Slots, user, Capacity, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for setting a [`Capacity`] of a [`Date`].
///
/// Overwrites the previous [`Capacity`] of the [`Date`], if any.
#[derive(Clone, Copy, Debug)]
pub struct SetCapacity {
    /// ID of the admin [`User`] setting the [`Capacity`].
    pub by: user::Id,

    /// [`Date`] to set the [`Capacity`] of.
    pub date: Date,

    /// [`Slots`] of the [`Date`].
    pub slots: Slots,
}

impl<Db, Gw> Command<SetCapacity> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Capacity, Date>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Capacity>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Capacity;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SetCapacity) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetCapacity { by, date, slots } = cmd;

        let admin = self
            .database()
            .execute(Select(By::new(by)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !admin.is_some_and(|u| u.is_admin()) {
            return Err(tracerr::new!(E::NotAdmin(by)));
        }

        let capacity = Capacity {
            date,
            slots,
            updated_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize with orders booking the same `Date`.
        tx.execute(Lock(By::new(date)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(capacity))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(capacity)
    }
}

/// Error of [`SetCapacity`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] setting the [`Capacity`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        domain::{capacity::Slots, user},
        test_support::{self, service, Stub},
        Command as _,
    };

    use super::{ExecutionError, SetCapacity};

    #[tokio::test]
    async fn overwrites_capacity() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let date = "2025-03-10".parse::<Date>().unwrap();

        for slots in [50, 30, 30] {
            let capacity = svc
                .execute(SetCapacity {
                    by: admin.id,
                    date,
                    slots: Slots::new(slots).unwrap(),
                })
                .await
                .unwrap();
            assert_eq!(capacity.slots.get(), slots);
        }

        let state = svc.database().state().await;
        assert_eq!(state.capacities.len(), 1);
        assert_eq!(state.capacities[&date].slots.get(), 30);
    }

    #[tokio::test]
    async fn requires_admin() {
        let svc = service(Stub::default());
        let seller = test_support::user(&svc, user::Role::Seller).await;

        let err = svc
            .execute(SetCapacity {
                by: seller.id,
                date: "2025-03-10".parse().unwrap(),
                slots: Slots::ZERO,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));
        assert!(svc.database().state().await.capacities.is_empty());
    }
}
