//! [`Command`] for authorizing a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Gw> Command<AuthorizeUserSession> for Service<Db, Gw>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok(Output { session, user })
    }
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Authorized [`Session`].
    pub session: Session,

    /// [`User`] the [`Session`] belongs to.
    ///
    /// Its [`user::Role`] is read from storage on every authorization, so
    /// a granted role takes effect without a new [`Session`].
    pub user: User,
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::{create_user_session, CreateUserSession},
        domain::user::{self, session, Session},
        test_support::{self, service},
        Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn authorizes_issued_token() {
        let svc = service(test_support::Stub::default());
        let user = test_support::user(&svc, user::Role::Admin).await;

        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();
        let out = svc.execute(AuthorizeUserSession { token }).await.unwrap();

        assert_eq!(out.session.user_id, user.id);
        assert!(out.user.is_admin());
    }

    #[tokio::test]
    async fn rejects_expired_and_foreign_tokens() {
        let svc = service(test_support::Stub::default());
        let user = test_support::user(&svc, user::Role::Seller).await;

        let encode = |session: &Session| {
            let token = jsonwebtoken::encode(
                &jsonwebtoken::Header::default(),
                session,
                &svc.config().jwt_encoding_key,
            )
            .unwrap();
            token.parse::<session::Token>().unwrap()
        };

        let expired = encode(&Session {
            user_id: user.id,
            expires_at: DateTime::from_unix_timestamp(1_000)
                .unwrap()
                .coerce(),
        });
        let err = svc
            .execute(AuthorizeUserSession { token: expired })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));

        let stranger = user::Id::new();
        let foreign = encode(&Session {
            user_id: stranger,
            expires_at: (DateTime::now()
                + std::time::Duration::from_secs(60))
            .coerce(),
        });
        let err = svc
            .execute(AuthorizeUserSession { token: foreign })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::UserNotExists(id) if *id == stranger,
        ));
    }
}
