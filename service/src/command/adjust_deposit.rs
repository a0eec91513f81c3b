//! [`Command`] for adjusting a [`Seller`]'s deposit by an admin.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{seller::DepositError, user, Seller, User},
    infra::{database, Database},
    Service,
};

use super::{Command, Conflicting};

/// [`Command`] for adjusting a [`Seller`]'s deposit by an admin.
#[derive(Clone, Copy, Debug)]
pub struct AdjustDeposit {
    /// ID of the admin [`User`] adjusting the deposit.
    pub by: user::Id,

    /// ID of the [`Seller`] to adjust the deposit of.
    pub seller_id: user::Id,

    /// Signed amount to apply: credits if positive, debits if negative.
    pub amount: Money,
}

impl<Db, Gw> Command<AdjustDeposit> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Seller>, user::Id>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Seller, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Seller>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Seller;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AdjustDeposit,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdjustDeposit {
            by,
            seller_id,
            amount,
        } = cmd;

        let admin = self
            .database()
            .execute(Select(By::new(by)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !admin.is_some_and(|u| u.is_admin()) {
            return Err(tracerr::new!(E::NotAdmin(by)));
        }

        self.retry_on_conflict("AdjustDeposit", || async move {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            // Avoid concurrent actions upon the same `Seller`.
            tx.execute(Lock(By::new(seller_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let mut seller = tx
                .execute(Select(By::<Option<Seller>, _>::new(seller_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::SellerNotExists(seller_id))
                .map_err(tracerr::wrap!())?;
            if amount == Money::ZERO {
                return Ok(seller);
            }

            _ = seller
                .apply(amount)
                .map_err(tracerr::from_and_wrap!(=> E))?;
            tx.execute(Update(seller.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            Ok::<_, Traced<E>>(seller)
        })
        .await
    }
}

/// Error of [`AdjustDeposit`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Amount cannot be applied to the deposit.
    #[display("{_0}")]
    Deposit(DepositError),

    /// [`User`] adjusting the deposit is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    #[from(ignore)]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Seller`] doesn't exist.
    #[display("`Seller(id: {_0})` does not exist")]
    #[from(ignore)]
    SellerNotExists(#[error(not(source))] user::Id),
}

impl Conflicting for ExecutionError {
    fn is_conflict(&self) -> bool {
        matches!(self, Self::Db(e) if e.is_conflict())
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::{seller::DepositError, user},
        test_support::{self, service, Stub},
        Command as _,
    };

    use super::{AdjustDeposit, ExecutionError};

    #[tokio::test]
    async fn credit_then_debit_restores_balance() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let seller = test_support::seller(&svc, 7_000).await;

        for (amount, balance) in [(2_500, 9_500), (-2_500, 7_000)] {
            let updated = svc
                .execute(AdjustDeposit {
                    by: admin.id,
                    seller_id: seller.id,
                    amount: Money::new(amount),
                })
                .await
                .unwrap();
            assert_eq!(updated.deposit, Money::new(balance));
        }
    }

    #[tokio::test]
    async fn rejects_negative_balance() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let seller = test_support::seller(&svc, 1_000).await;

        let err = svc
            .execute(AdjustDeposit {
                by: admin.id,
                seller_id: seller.id,
                amount: Money::new(-1_001),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Deposit(DepositError::Insufficient { .. }),
        ));
        let state = svc.database().state().await;
        assert_eq!(state.sellers[&seller.id].deposit, Money::new(1_000));
    }

    #[tokio::test]
    async fn retries_conflicts() {
        let svc = service(Stub::default());
        let admin = test_support::user(&svc, user::Role::Admin).await;
        let seller = test_support::seller(&svc, 1_000).await;
        svc.database().fail_commits(1);

        let updated = svc
            .execute(AdjustDeposit {
                by: admin.id,
                seller_id: seller.id,
                amount: Money::new(500),
            })
            .await
            .unwrap();

        assert_eq!(updated.deposit, Money::new(1_500));
        assert_eq!(svc.database().commits(), 1);
        let state = svc.database().state().await;
        assert_eq!(state.sellers[&seller.id].deposit, Money::new(1_500));
    }
}
