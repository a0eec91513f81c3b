//! [`Capacity`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{booking, Capacity},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{capacity::Range, Availability},
};

impl<C> Database<Select<By<Vec<Availability>, Range>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Availability>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Availability>, Range>>,
    ) -> Result<Self::Ok, Self::Err> {
        let range = by.into_inner();
        let (first, last) = (range.first(), range.last());
        let cancelled = booking::Status::CancelledBySellerFault;

        const CAPACITIES_SQL: &str = "\
            SELECT date, slots, updated_at \
            FROM capacities \
            WHERE date BETWEEN $1::DATE AND $2::DATE";
        let capacities = self
            .query(CAPACITIES_SQL, &[&first, &last])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Capacity {
                date: row.get("date"),
                slots: row.get("slots"),
                updated_at: row.get("updated_at"),
            })
            .collect::<Vec<_>>();

        const BOOKED_SQL: &str = "\
            SELECT date, SUM(quantity)::INT8 AS booked \
            FROM bookings \
            WHERE date BETWEEN $1::DATE AND $2::DATE \
              AND status <> $3::INT2 \
            GROUP BY date";
        let booked = self
            .query(BOOKED_SQL, &[&first, &last, &cancelled])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| (row.get("date"), row.get("booked")))
            .collect::<Vec<(Date, i64)>>();

        Ok(range.availability(&capacities, &booked))
    }
}

impl<C> Database<Insert<Capacity>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(capacity): Insert<Capacity>,
    ) -> Result<Self::Ok, Self::Err> {
        let Capacity {
            date,
            slots,
            updated_at,
        } = capacity;

        const SQL: &str = "\
            INSERT INTO capacities (date, slots, updated_at) \
            VALUES ($1::DATE, $2::INT4, $3::TIMESTAMPTZ) \
            ON CONFLICT (date) DO UPDATE \
            SET slots = EXCLUDED.slots, \
                updated_at = EXCLUDED.updated_at";
        self.exec(SQL, &[&date, &slots, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Capacity, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Capacity, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let date: Date = by.into_inner();

        const SQL: &str = "\
            INSERT INTO capacities_lock \
            VALUES ($1::DATE) \
            ON CONFLICT (date) DO UPDATE SET date = EXCLUDED.date";
        self.exec(SQL, &[&date]).await.map_err(tracerr::wrap!()).map(drop)
    }
}
