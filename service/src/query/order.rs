//! [`Query`] collection related to a single [`Order`].

use common::operations::By;

use crate::domain::{order, Order};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Order`] by its [`order::Id`].
pub type ById = DatabaseQuery<By<Option<Order>, order::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::order,
        test_support::{self, service, Stub},
        Query as _,
    };

    use super::ById;

    #[tokio::test]
    async fn finds_placed_order() {
        let svc = service(Stub::default());
        let booking = test_support::booking(&svc, 2).await;

        let order = svc
            .execute(ById::by(booking.order_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.seller_id, booking.seller_id);
        assert_eq!(order.subtotal, booking.line_total);

        let missing = svc.execute(ById::by(order::Id::new())).await.unwrap();
        assert!(missing.is_none());
    }
}
