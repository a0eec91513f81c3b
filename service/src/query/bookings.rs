//! [`Query`] collection related to the multiple [`Booking`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{
    domain::{order, Booking},
    read::booking::list,
};

use super::DatabaseQuery;

/// Queries a list of [`Booking`]s.
pub type List = DatabaseQuery<By<list::Page, list::Selector>>;

/// Queries total count of [`Booking`]s matching a [`list::Filter`].
pub type TotalCount = DatabaseQuery<By<list::TotalCount, list::Filter>>;

/// Queries all the [`Booking`]s placed in an [`Order`].
///
/// [`Order`]: crate::domain::Order
pub type ByOrder = DatabaseQuery<By<Vec<Booking>, order::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::booking,
        test_support::{self, service, Stub},
        Query as _,
    };

    use super::ByOrder;

    #[tokio::test]
    async fn lists_bookings_of_order() {
        let svc = service(Stub::default());
        let placed = test_support::booking(&svc, 2).await;
        _ = test_support::booking(&svc, 3).await;

        let found = svc.execute(ByOrder::by(placed.order_id)).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, placed.id);
        assert_eq!(found[0].status, booking::Status::Unconfirmed);
    }
}
