//! [`Booking`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Date,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, Product},
        order, Booking,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{
        booking::{list, ProgressMonth},
        capacity::Range,
    },
};

/// Columns of the `bookings` table, in the order [`from_row()`] expects
/// them.
const COLUMNS: &str = "\
    id, order_id, seller_id, \
    date, delivery_type, review_type, quantity, \
    product_name, product_option, product_url, \
    keywords, review_guide, remarks, \
    review_price, surcharge, product_price, line_total, \
    status, payment_type, \
    created_at, confirmed_at, split_from";

/// Reads a [`Booking`] out of the provided [`Row`] selected with
/// [`COLUMNS`].
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        order_id: row.get("order_id"),
        seller_id: row.get("seller_id"),
        date: row.get("date"),
        delivery_type: row.get("delivery_type"),
        review_type: row.get("review_type"),
        quantity: row.get("quantity"),
        product: Product {
            name: row.get("product_name"),
            option: row.get("product_option"),
            url: row.get("product_url"),
            keywords: row.get("keywords"),
            review_guide: row.get("review_guide"),
            remarks: row.get("remarks"),
        },
        review_price: row.get("review_price"),
        surcharge: row.get("surcharge"),
        product_price: row.get("product_price"),
        line_total: row.get("line_total"),
        status: row.get("status"),
        payment_type: row.get("payment_type"),
        created_at: row.get("created_at"),
        confirmed_at: row.get("confirmed_at"),
        split_from: row.get("split_from"),
    }
}

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1::UUID");
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Booking>, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let order_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE order_id = $1::UUID \
             ORDER BY id ASC",
        );
        Ok(self
            .query(&sql, &[&order_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Booking>, ProgressMonth>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, ProgressMonth>>,
    ) -> Result<Self::Ok, Self::Err> {
        let month = by.into_inner();
        let (first, last) = (month.first(), month.last());
        let confirmed = booking::Status::Confirmed;

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE date BETWEEN $1::DATE AND $2::DATE \
               AND status = $3::INT2 \
             ORDER BY confirmed_at ASC, created_at ASC, date ASC",
        );
        Ok(self
            .query(&sql, &[&first, &last, &confirmed])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Booking>, Range>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, Range>>,
    ) -> Result<Self::Ok, Self::Err> {
        let range = by.into_inner();
        let (first, last) = (range.first(), range.last());

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE date BETWEEN $1::DATE AND $2::DATE \
             ORDER BY date ASC, id ASC",
        );
        Ok(self
            .query(&sql, &[&first, &last])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            order_id,
            seller_id,
            date,
            delivery_type,
            review_type,
            quantity,
            product,
            review_price,
            surcharge,
            product_price,
            line_total,
            status,
            payment_type,
            created_at,
            confirmed_at,
            split_from,
        } = booking;

        // Only the mutable state is updated on conflict.
        const SQL: &str = "\
            INSERT INTO bookings (\
                id, order_id, seller_id, \
                date, delivery_type, review_type, quantity, \
                product_name, product_option, product_url, \
                keywords, review_guide, remarks, \
                review_price, surcharge, product_price, line_total, \
                status, payment_type, \
                created_at, confirmed_at, split_from\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::INT2, $6::INT2, $7::INT4, \
                $8::VARCHAR, $9::VARCHAR, $10::VARCHAR, \
                $11::VARCHAR, $12::VARCHAR, $13::VARCHAR, \
                $14::INT8, $15::INT8, $16::INT8, $17::INT8, \
                $18::INT2, $19::INT2, \
                $20::TIMESTAMPTZ, $21::TIMESTAMPTZ, $22::UUID\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET quantity = EXCLUDED.quantity, \
                line_total = EXCLUDED.line_total, \
                status = EXCLUDED.status, \
                payment_type = EXCLUDED.payment_type, \
                confirmed_at = EXCLUDED.confirmed_at";
        self.exec(
            SQL,
            &[
                &id,
                &order_id,
                &seller_id,
                &date,
                &delivery_type,
                &review_type,
                &quantity,
                &product.name,
                &product.option,
                &product.url,
                &product.keywords,
                &product.review_guide,
                &product.remarks,
                &review_price,
                &surcharge,
                &product_price,
                &line_total,
                &status,
                &payment_type,
                &created_at,
                &confirmed_at,
                &split_from,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO bookings_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!()).map(drop)
    }
}

/// Pushes the parameters of the provided [`list::Filter`] into `ps`,
/// returning the SQL `WHERE` conditions referring them.
fn filter_sql<'p>(
    filter: &'p list::Filter,
    dates: Option<&'p (Date, Date)>,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let list::Filter {
        seller_id, status, ..
    } = filter;

    let mut conds = Vec::new();
    if let Some(id) = seller_id {
        ps.push(id);
        conds.push(format!("seller_id = ${}::UUID", ps.len()));
    }
    if let Some(status) = status {
        ps.push(status);
        conds.push(format!("status = ${}::INT2", ps.len()));
    }
    if let Some((first, last)) = dates {
        ps.push(first);
        ps.push(last);
        conds.push(format!(
            "date BETWEEN ${}::DATE AND ${}::DATE",
            ps.len() - 1,
            ps.len(),
        ));
    }
    conds
        .iter()
        .format_with("", |c, f| f(&format_args!("AND {c} ")))
        .to_string()
}

impl<C> Database<Select<By<list::Page, list::Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Page, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { arguments, filter } = by.into_inner();

        let limit = arguments.fetch_limit();
        let dates = filter.dates.map(|r| (r.first(), r.last()));

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor = arguments.cursor().map(|c| {
            ps.push(c);
            let op = arguments.kind().operator();
            format!("AND id {op} ${}::UUID", ps.len())
        });
        let filtering = filter_sql(&filter, dates.as_ref(), &mut ps);

        let sql = format!(
            "SELECT id \
             FROM bookings \
             WHERE TRUE \
                   {cursor} \
                   {filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor.unwrap_or_default(),
            order = arguments.kind().order().sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(list::Page::from_fetched(
            &arguments,
            rows.into_iter().map(|row| {
                let id: booking::Id = row.get("id");
                (id, id)
            }),
        ))
    }
}

impl<C> Database<Select<By<list::TotalCount, list::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::TotalCount, list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let dates = filter.dates.map(|r| (r.first(), r.last()));

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filter_sql(&filter, dates.as_ref(), &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM bookings \
             WHERE TRUE {filtering}",
        );
        let row = self
            .query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;
        Ok(row.map_or(0, |r| r.get::<_, i32>(0)).into())
    }
}
