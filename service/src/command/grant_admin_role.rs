//! [`Command`] for granting [`user::Role::Admin`] to a [`User`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for granting [`user::Role::Admin`] to a [`User`].
#[derive(Clone, Debug)]
pub struct GrantAdminRole {
    /// ID of the [`User`] granting the role.
    ///
    /// Must hold [`user::Role::Admin`] already.
    pub by: user::Id,

    /// [`user::Email`] of the [`User`] to grant the role to.
    pub email: user::Email,
}

impl<Db, Gw> Command<GrantAdminRole> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
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

    async fn execute(
        &self,
        cmd: GrantAdminRole,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GrantAdminRole { by, email } = cmd;

        let granter = self
            .database()
            .execute(Select(By::new(by)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !granter.is_some_and(|u| u.is_admin()) {
            return Err(tracerr::new!(E::NotAdmin(by)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let user_id = tx
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UnknownEmail(email.clone()))
            .map_err(tracerr::wrap!())?
            .id;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Re-read under the lock, as the `User` may have changed meanwhile.
        let mut user = tx
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|u| u.id == user_id)
            .ok_or(E::UnknownEmail(email))
            .map_err(tracerr::wrap!())?;
        if user.is_admin() {
            return Ok(user);
        }

        user.role = user::Role::Admin;
        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`GrantAdminRole`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Granting [`User`] doesn't hold [`user::Role::Admin`].
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// No [`User`] is registered with the [`user::Email`].
    #[display("No `User` with `{_0}` email")]
    #[from(ignore)]
    UnknownEmail(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::user,
        test_support::{self, service, Stub},
        Command as _,
    };

    use super::{ExecutionError, GrantAdminRole};

    #[tokio::test]
    async fn elevates_user_idempotently() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let seller = test_support::user(&svc, user::Role::Seller).await;

        for _ in 0..2 {
            let user = svc
                .execute(GrantAdminRole {
                    by: admin.id,
                    email: seller.email.clone(),
                })
                .await
                .unwrap();
            assert_eq!(user.id, seller.id);
            assert!(user.is_admin());
        }

        let state = svc.database().state().await;
        assert!(state.users[&seller.id].is_admin());
        assert_eq!(svc.database().commits(), 1);
    }

    #[tokio::test]
    async fn requires_stored_admin_role() {
        let svc = service(Stub::default());
        let seller = test_support::user(&svc, user::Role::Seller).await;
        let other = test_support::user(&svc, user::Role::Seller).await;

        let err = svc
            .execute(GrantAdminRole {
                by: seller.id,
                email: other.email.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));

        let err = svc
            .execute(GrantAdminRole {
                by: user::Id::new(),
                email: other.email.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotAdmin(_)));

        let admin = test_support::user(&svc, user::Role::Admin).await;
        let err = svc
            .execute(GrantAdminRole {
                by: admin.id,
                email: user::Email::new("ghost@example.com").unwrap(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UnknownEmail(_)));

        assert!(!svc.database().state().await.users[&other.id].is_admin());
    }
}
