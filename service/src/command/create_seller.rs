//! [`Command`] for signing up a new [`Seller`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Login, Name, Password, Phone};
use crate::{
    domain::{
        seller::{self, BusinessNumber},
        user, Seller, User,
    },
    infra::{database, gateway, gateway::nts, Database, Gateway},
    Service,
};

use super::Command;

/// [`Command`] for signing up a new [`Seller`].
#[derive(Clone, Debug)]
pub struct CreateSeller {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Phone`] of a new [`User`].
    pub phone: Option<user::Phone>,

    /// [`BusinessNumber`] of a new [`Seller`].
    pub business_number: BusinessNumber,

    /// [`seller::Referrer`] of a new [`Seller`].
    pub referrer: Option<seller::Referrer>,
}

/// Output of [`CreateSeller`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`User`].
    pub user: User,

    /// Created [`Seller`].
    pub seller: Seller,
}

impl<Db, Gw> Command<CreateSeller> for Service<Db, Gw>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<By<Option<Seller>, &'n BusinessNumber>>,
            Ok = Option<Seller>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Insert<Seller>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Gw: Gateway<
        Select<By<nts::Status, BusinessNumber>>,
        Ok = nts::Status,
        Err = Traced<gateway::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateSeller) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSeller {
            name,
            login,
            password,
            email,
            phone,
            business_number,
            referrer,
        } = cmd;

        let occupied = self
            .database()
            .execute(Select(By::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }
        let occupied = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }
        let occupied = self
            .database()
            .execute(Select(By::new(&business_number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::BusinessNumberOccupied(
                business_number
            )));
        }

        let status = self
            .gateway()
            .execute(Select(By::new(business_number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !status.is_active() {
            return Err(tracerr::new!(E::BusinessNotActive(status)));
        }

        let password_hash = user::PasswordHash::new(password.expose_secret())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            name,
            login,
            password_hash,
            email,
            phone,
            role: user::Role::Seller,
            created_at: now.coerce(),
            deleted_at: None,
        };
        let seller = Seller {
            id: user.id,
            business_number,
            verified_at: Some(now.coerce()),
            referrer,
            deposit: Money::ZERO,
            created_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(seller.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { user, seller })
    }
}

/// Error of [`CreateSeller`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Gateway`] error.
    #[display("Business registry request failed: {_0}")]
    Gateway(gateway::Error),

    /// Password hashing error.
    #[display("Failed to hash the password: {_0}")]
    PasswordHash(argon2::password_hash::Error),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    #[from(ignore)]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    #[from(ignore)]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`BusinessNumber`] is already registered by another [`Seller`].
    #[display("`{_0}` business number is occupied")]
    #[from(ignore)]
    BusinessNumberOccupied(#[error(not(source))] BusinessNumber),

    /// Business registry doesn't report the business as active.
    #[display("Business is not active: {}", _0.payload)]
    #[from(ignore)]
    BusinessNotActive(#[error(not(source))] nts::Status),
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::{seller::BusinessNumber, user},
        test_support::{self, password, service, Stub},
        Command as _,
    };

    use super::{CreateSeller, ExecutionError, Output};

    fn cmd(login: &str, email: &str, number: &str) -> CreateSeller {
        CreateSeller {
            name: user::Name::new("Kim Seller").unwrap(),
            login: user::Login::new(login).unwrap(),
            password: password("password1"),
            email: user::Email::new(email).unwrap(),
            phone: user::Phone::new("010-1234-5678"),
            business_number: BusinessNumber::new(number).unwrap(),
            referrer: None,
        }
    }

    #[tokio::test]
    async fn creates_user_and_seller() {
        let svc = service(Stub::default());

        let Output { user, seller } = svc
            .execute(cmd("kim", "kim@Example.COM", "123-45-67890"))
            .await
            .unwrap();

        assert_eq!(user.role, user::Role::Seller);
        assert_eq!(user.email.to_string(), "kim@example.com");
        assert!(user.password_hash.verify(
            &user::Password::new("password1").unwrap(),
        ));
        assert_eq!(seller.id, user.id);
        assert_eq!(seller.deposit, Money::ZERO);
        assert!(seller.verified_at.is_some());

        let state = svc.database().state().await;
        assert!(state.users.contains_key(&user.id));
        assert!(state.sellers.contains_key(&user.id));
    }

    #[tokio::test]
    async fn rejects_occupied_credentials() {
        let svc = service(Stub::default());
        let existing = test_support::seller(&svc, 0).await;
        let taken = svc.database().state().await.users[&existing.id].clone();
        let number = existing.business_number.to_string();

        let err = svc
            .execute(cmd(&taken.login.to_string(), "a@b.cd", "1112223334"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));

        let err = svc
            .execute(cmd("fresh", taken.email.as_ref(), "1112223334"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));

        let err = svc
            .execute(cmd("fresh", "a@b.cd", &number))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::BusinessNumberOccupied(_),
        ));

        assert_eq!(svc.database().state().await.users.len(), 1);
        assert_eq!(svc.gateway().requests(), 0);
    }

    #[tokio::test]
    async fn rejects_inactive_business() {
        let svc = service(Stub::default().with_business_code("03"));

        let err = svc
            .execute(cmd("closed", "closed@shop.kr", "9998887776"))
            .await
            .unwrap_err();
        let ExecutionError::BusinessNotActive(status) = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(status.code.as_deref(), Some("03"));
        assert!(svc.database().state().await.users.is_empty());
    }
}
