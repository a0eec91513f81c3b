//! [`Seller`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{seller::BusinessNumber, user, Seller},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `sellers` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, business_number, verified_at, \
    referrer, deposit, \
    created_at";

/// Reads a [`Seller`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Seller {
    Seller {
        id: row.get("id"),
        business_number: row.get("business_number"),
        verified_at: row.get("verified_at"),
        referrer: row.get("referrer"),
        deposit: row.get("deposit"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Seller>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Seller>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Seller>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!("SELECT {COLUMNS} FROM sellers WHERE id = $1::UUID");
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'n, C> Database<Select<By<Option<Seller>, &'n BusinessNumber>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Seller>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Seller>, &'n BusinessNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM sellers \
             WHERE business_number = $1::VARCHAR",
        );
        Ok(self
            .query_opt(&sql, &[&number])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Seller>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Seller>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(seller): Insert<Seller>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(seller)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Seller>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(seller): Update<Seller>,
    ) -> Result<Self::Ok, Self::Err> {
        let Seller {
            id,
            business_number,
            verified_at,
            referrer,
            deposit,
            created_at,
        } = seller;

        const SQL: &str = "\
            INSERT INTO sellers (\
                id, business_number, verified_at, \
                referrer, deposit, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::TIMESTAMPTZ, \
                $4::VARCHAR, $5::INT8, \
                $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET business_number = EXCLUDED.business_number, \
                verified_at = EXCLUDED.verified_at, \
                referrer = EXCLUDED.referrer, \
                deposit = EXCLUDED.deposit";
        self.exec(
            SQL,
            &[
                &id,
                &business_number,
                &verified_at,
                &referrer,
                &deposit,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Seller, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Seller, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO sellers_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id]).await.map_err(tracerr::wrap!()).map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::seller::list::Page, read::seller::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::seller::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::seller::list::Page, read::seller::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::seller::list::Selector {
            arguments,
            filter: read::seller::list::Filter { name },
        } = by.into_inner();

        let limit = arguments.fetch_limit();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let name_idx = name.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let name_pattern = name.as_ref().map(|n| FuzzPattern::new(n.as_ref()));
        let name_pattern_idx = name_pattern.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT s.id \
             FROM sellers AS s \
             INNER JOIN users AS u ON u.id = s.id \
             WHERE u.deleted_at IS NULL \
                   {cursor} \
                   {name_filtering} \
             ORDER BY {name_ordering} \
                      s.id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND s.id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            name_filtering =
                name_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(u.name) SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
            name_ordering = name_idx.into_iter().format_with("", |idx, f| {
                let order = arguments.kind().order().sql();
                f(&format_args!(
                    "LEVENSHTEIN(u.name, ${idx}::VARCHAR, 1, 1, 0) {order},"
                ))
            })
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::seller::list::Page::from_fetched(
            &arguments,
            rows.into_iter().map(|row| {
                let id: user::Id = row.get("id");
                (id, id)
            }),
        ))
    }
}

impl<C> Database<Select<By<read::seller::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::seller::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::seller::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM sellers AS s \
            INNER JOIN users AS u ON u.id = s.id \
            WHERE u.deleted_at IS NULL";
        let row = self
            .query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(row.map_or(0, |r| r.get::<_, i32>(0)).into())
    }
}
