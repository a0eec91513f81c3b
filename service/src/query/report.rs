//! [`Query`] collection of admin reports over [`Booking`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::booking::Status, Query};
use crate::{
    domain::Booking,
    read::{booking::ProgressMonth, capacity::Range},
};

use super::DatabaseQuery;

/// Queries [`Booking`]s dated within a [`ProgressMonth`] which are currently
/// [`Status::Confirmed`], in the order of their confirmation.
pub type Progress = DatabaseQuery<By<Vec<Booking>, ProgressMonth>>;

/// Queries all the [`Booking`]s dated within a [`Range`] for an export,
/// ordered by date.
pub type Export = DatabaseQuery<By<Vec<Booking>, Range>>;

#[cfg(test)]
mod spec {
    use crate::{
        domain::booking::Status,
        read::{booking::ProgressMonth, capacity::Range},
        test_support::{self, service, Stub},
        Query as _,
    };

    use super::{Export, Progress};

    #[tokio::test]
    async fn progress_lists_confirmed_bookings_only() {
        let svc = service(Stub::default());
        let confirmed = test_support::booking_in(&svc, 2, Status::Confirmed)
            .await;
        _ = test_support::booking_in(&svc, 1, Status::Purchased).await;
        _ = test_support::booking_in(&svc, 1, Status::Reviewed).await;
        _ = test_support::booking(&svc, 4).await;

        let month = ProgressMonth::new(2025, 3).unwrap();
        let report = svc.execute(Progress::by(month)).await.unwrap();

        let ids = report.iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(ids, [confirmed.id]);

        let empty = ProgressMonth::new(2025, 4).unwrap();
        assert!(svc.execute(Progress::by(empty)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn export_includes_every_status() {
        let svc = service(Stub::default());
        _ = test_support::booking(&svc, 1).await;
        _ = test_support::booking_in(&svc, 1, Status::Purchased).await;

        let range = Range::single("2025-03-09".parse().unwrap());
        let rows = svc.execute(Export::by(range)).await.unwrap();

        assert_eq!(rows.len(), 2);
    }
}
