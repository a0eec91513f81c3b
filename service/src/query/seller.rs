//! [`Query`] collection related to a single [`Seller`].

use common::operations::By;

use crate::domain::{user, Seller};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries a [`Seller`] by the [`user::Id`] of its [`User`].
pub type ById = DatabaseQuery<By<Option<Seller>, user::Id>>;
