//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::user,
        test_support::{self, service, Stub},
        Query as _,
    };

    use super::ById;

    #[tokio::test]
    async fn finds_stored_user_only() {
        let svc = service(Stub::default());
        let stored = test_support::user(&svc, user::Role::Seller).await;

        let found = svc.execute(ById::by(stored.id)).await.unwrap();
        assert_eq!(found.map(|u| u.login), Some(stored.login));

        let missing = svc.execute(ById::by(user::Id::new())).await.unwrap();
        assert!(missing.is_none());
    }
}
