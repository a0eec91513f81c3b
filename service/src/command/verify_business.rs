//! [`Command`] for verifying a [`BusinessNumber`] with the business registry.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{seller::BusinessNumber, user, Seller},
    infra::{database, gateway, gateway::nts, Database, Gateway},
    Service,
};

use super::Command;

/// [`Command`] for verifying a [`BusinessNumber`] with the business registry.
///
/// When issued on behalf of a [`Seller`], the verified [`BusinessNumber`] is
/// stored as the [`Seller`]'s one.
#[derive(Clone, Debug)]
pub struct VerifyBusiness {
    /// [`BusinessNumber`] to verify.
    pub number: BusinessNumber,

    /// ID of the [`Seller`] to store the verified [`BusinessNumber`] for.
    pub seller_id: Option<user::Id>,
}

impl<Db, Gw> Command<VerifyBusiness> for Service<Db, Gw>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Seller>, user::Id>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<By<Option<Seller>, &'n BusinessNumber>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Seller, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Seller>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Gw: Gateway<
        Select<By<nts::Status, BusinessNumber>>,
        Ok = nts::Status,
        Err = Traced<gateway::Error>,
    >,
{
    type Ok = nts::Status;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: VerifyBusiness,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let VerifyBusiness { number, seller_id } = cmd;

        let status = self
            .gateway()
            .execute(Select(By::new(number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !status.is_active() {
            return Err(tracerr::new!(E::BusinessNotActive(status)));
        }
        let Some(seller_id) = seller_id else {
            return Ok(status);
        };

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

        let owner = tx
            .execute(Select(By::new(&number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if owner.is_some_and(|s| s.id != seller_id) {
            return Err(tracerr::new!(E::BusinessNumberOccupied(number)));
        }

        seller.business_number = number;
        seller.verified_at = Some(DateTime::now().coerce());
        tx.execute(Update(seller))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(status)
    }
}

/// Error of [`VerifyBusiness`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Gateway`] error.
    #[display("Business registry request failed: {_0}")]
    Gateway(gateway::Error),

    /// Business registry doesn't report the business as active.
    #[display("Business is not active: {}", _0.payload)]
    #[from(ignore)]
    BusinessNotActive(#[error(not(source))] nts::Status),

    /// [`BusinessNumber`] is already registered by another [`Seller`].
    #[display("`{_0}` business number is occupied")]
    #[from(ignore)]
    BusinessNumberOccupied(#[error(not(source))] BusinessNumber),

    /// [`Seller`] doesn't exist.
    #[display("`Seller(id: {_0})` does not exist")]
    #[from(ignore)]
    SellerNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::seller::BusinessNumber,
        test_support::{self, service, Stub},
        Command as _,
    };

    use super::{ExecutionError, VerifyBusiness};

    fn number(s: &str) -> BusinessNumber {
        BusinessNumber::new(s).unwrap()
    }

    #[tokio::test]
    async fn verifies_without_seller() {
        let svc = service(Stub::default());

        let status = svc
            .execute(VerifyBusiness {
                number: number("1234567890"),
                seller_id: None,
            })
            .await
            .unwrap();

        assert!(status.is_active());
        assert_eq!(svc.database().commits(), 0);
    }

    #[tokio::test]
    async fn stores_verified_number() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;

        _ = svc
            .execute(VerifyBusiness {
                number: number("222-33-44444"),
                seller_id: Some(seller.id),
            })
            .await
            .unwrap();

        let state = svc.database().state().await;
        let stored = &state.sellers[&seller.id];
        assert_eq!(stored.business_number, number("2223344444"));
        assert!(stored.verified_at >= seller.verified_at);
    }

    #[tokio::test]
    async fn rejects_inactive_and_foreign_numbers() {
        let svc = service(Stub::default().with_business_code("02"));
        let seller = test_support::seller(&svc, 0).await;

        let err = svc
            .execute(VerifyBusiness {
                number: number("1234567890"),
                seller_id: Some(seller.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::BusinessNotActive(_),
        ));

        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 0).await;
        let other = test_support::seller(&svc, 0).await;
        let err = svc
            .execute(VerifyBusiness {
                number: other.business_number.clone(),
                seller_id: Some(seller.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::BusinessNumberOccupied(_),
        ));
        assert_eq!(svc.database().commits(), 0);
    }
}
