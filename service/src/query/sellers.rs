//! [`Query`] collection related to the multiple [`Seller`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Seller, Query};
use crate::read::seller::list;

use super::DatabaseQuery;

/// Queries a list of [`Seller`]s.
pub type List = DatabaseQuery<By<list::Page, list::Selector>>;

/// Queries total count of [`Seller`]s.
pub type TotalCount = DatabaseQuery<By<list::TotalCount, ()>>;
