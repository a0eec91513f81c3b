//! [`Query`] of the [`Availability`] of dates.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::read::{capacity::Range, Availability};

use super::DatabaseQuery;

/// Queries [`Availability`] of every date in a [`Range`].
pub type InRange = DatabaseQuery<By<Vec<Availability>, Range>>;
