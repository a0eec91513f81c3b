//! CSV export of [`Booking`]s.

use axum::{
    extract::{rejection::QueryRejection, Query},
    response::{IntoResponse, Response},
};
use common::Date;
use csv_async::{AsyncWriterBuilder, QuoteStyle, Terminator};
use serde::Deserialize;
use service::{
    domain::{booking::Text, Booking},
    query,
    read::capacity::Range,
    Query as _,
};

use crate::{define_error, AsError, Context, Error};

/// UTF-8 byte order mark the export starts with.
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row of the export.
const HEADER: [&str; 16] = [
    "순번",
    "진행일자",
    "구분",
    "리뷰종류",
    "작업개수",
    "상품명",
    "옵션",
    "상품가",
    "상품URL",
    "키워드",
    "리뷰가이드",
    "비고",
    "체험단견적",
    "상태",
    "결제유형",
    "판매자ID",
];

/// Query parameters of the export.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Params {
    /// First [`Date`] to export.
    pub from: Date,

    /// Last [`Date`] to export.
    pub to: Date,
}

/// Exports all the [`Booking`]s dated within the requested range as a CSV
/// file.
///
/// # Errors
///
/// Possible error codes:
/// - `NOT_ADMIN` - the current `User` is not an admin;
/// - `INVALID_DATE_RANGE` - `from` is after `to` or the range is too long.
#[tracing::instrument(skip_all, fields(otel.name = "bookings export"))]
pub async fn bookings_csv(
    ctx: Context,
    params: Result<Query<Params>, QueryRejection>,
) -> Result<Response, Error> {
    define_error! {
        enum Error {
            #[code = "INVALID_DATE_RANGE"]
            #[status = BAD_REQUEST]
            #[message = "`from` must not be after `to` and the range must \
                         not exceed a year"]
            InvalidRange,
        }
    }

    let Query(Params { from, to }) = params.map_err(AsError::into_error)?;
    _ = ctx.admin_session().await?;
    let range = Range::new(from, to).ok_or(Error::InvalidRange)?;

    let bookings = ctx
        .service()
        .execute(query::report::Export::by(range))
        .await
        .map_err(AsError::into_error)?;

    let disposition =
        format!("attachment; filename=\"bookings_{from}_{to}.csv\"");
    Ok((
        [
            (http::header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (http::header::CONTENT_DISPOSITION, disposition),
        ],
        render(&bookings).await?,
    )
        .into_response())
}

/// Renders the provided [`Booking`]s as a UTF-8 CSV document with a BOM and
/// CRLF line endings.
///
/// # Errors
///
/// If writing a CSV record fails.
pub async fn render(bookings: &[Booking]) -> Result<Vec<u8>, Error> {
    let mut csv = AsyncWriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .create_writer(BOM.to_vec());

    csv.write_record(HEADER).await.map_err(|e| Error::internal(&e))?;
    for (n, b) in bookings.iter().enumerate() {
        let text = |t: &Option<Text>| {
            t.as_ref().map(|t| t.as_ref().to_owned()).unwrap_or_default()
        };
        csv.write_record([
            (n + 1).to_string(),
            b.date.to_string(),
            b.delivery_type.label().to_owned(),
            b.review_type.label().to_owned(),
            b.quantity.get().to_string(),
            b.product.name.to_string(),
            text(&b.product.option),
            b.product_price.won().to_string(),
            b.product
                .url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            text(&b.product.keywords),
            text(&b.product.review_guide),
            text(&b.product.remarks),
            b.line_total.won().to_string(),
            b.status.label().to_owned(),
            b.payment_type
                .map(|p| p.label().to_owned())
                .unwrap_or_default(),
            b.seller_id.to_string(),
        ])
        .await
        .map_err(|e| Error::internal(&e))?;
    }

    csv.into_inner().await.map_err(|e| Error::internal(&e))
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};
    use service::domain::{
        booking::{self, PaymentType, Product, ProductName, Text},
        order,
        pricing::{self, DeliveryType, Line, Policy, Quantity, ReviewType},
        user, Booking,
    };

    use super::{render, HEADER};

    async fn rendered(bookings: &[Booking]) -> String {
        String::from_utf8(render(bookings).await.unwrap()).unwrap()
    }

    fn booking(name: &str, remarks: Option<&str>) -> Booking {
        let item = pricing::Item {
            date: "2025-03-10".parse::<Date>().unwrap(),
            delivery_type: DeliveryType::RealDelivery,
            review_type: ReviewType::Text,
            quantity: Quantity::new(2).unwrap(),
            product_price: Money::new(10_000),
        };
        let line = Line::price(&Policy::default(), item).unwrap();
        Booking::new(
            order::Id::new(),
            user::Id::new(),
            line,
            Product {
                name: ProductName::new(name).unwrap(),
                option: None,
                url: None,
                keywords: Text::new("양말, 겨울"),
                review_guide: None,
                remarks: remarks.and_then(Text::new),
            },
        )
    }

    #[tokio::test]
    async fn starts_with_bom_and_header() {
        let csv = rendered(&[]).await;

        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(
            csv.trim_start_matches('\u{feff}'),
            format!("{}\r\n", HEADER.join(",")),
        );
    }

    #[tokio::test]
    async fn quotes_special_characters() {
        let mut b = booking("울 \"프리미엄\" 양말", Some("첫 줄\n둘째 줄"));
        b.payment_type = Some(PaymentType::CashReceipt);
        b.status = booking::Status::Confirmed;

        let csv = rendered(&[b.clone()]).await;
        let row = csv.split("\r\n").nth(1).unwrap();

        assert!(row.starts_with("1,2025-03-10,실배송,텍스트,2,"));
        assert!(row.contains(",\"울 \"\"프리미엄\"\" 양말\","));
        assert!(row.contains(",\"양말, 겨울\","));
        assert!(row.contains(",\"첫 줄\n둘째 줄\","));
        assert!(row.ends_with(&format!(",확정,현금영수증,{}", b.seller_id)));
    }

    #[tokio::test]
    async fn numbers_rows_and_leaves_absent_fields_empty() {
        let csv =
            rendered(&[booking("양말", None), booking("장갑", None)]).await;
        let rows = csv.split("\r\n").collect::<Vec<_>>();

        assert_eq!(rows.len(), 4, "header, two rows and a trailing empty");
        assert!(rows[2].starts_with("2,"));
        assert!(rows[2].contains(",장갑,,10000,,"));
        assert_eq!(rows[3], "");
    }
}
