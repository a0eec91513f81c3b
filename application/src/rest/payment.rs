//! Payment confirmation callback.

use axum::{extract::rejection::JsonRejection, Json};
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{order, payment},
};
use tracing as log;

use crate::{define_error, AsError, Context, Error};

/// Request the payment widget redirects the buyer with.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Key of the authorized payment.
    pub payment_key: String,

    /// Merchant order reference the payment was requested with.
    pub order_id: String,

    /// Authorized amount, in won.
    pub amount: i64,

    /// ID of the [`Order`] being paid.
    ///
    /// [`Order`]: service::domain::Order
    pub product_id: order::Id,
}

/// Summary of a confirmed payment.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// ID of the paid [`Order`].
    ///
    /// [`Order`]: service::domain::Order
    pub order_id: order::Id,

    /// ID of the recorded payment.
    pub payment_id: payment::Id,

    /// Charged amount, in won.
    pub amount: i64,

    /// [RFC 3339] moment the [`Order`] was paid at.
    ///
    /// [`Order`]: service::domain::Order
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub paid_at: String,
}

/// Confirms the payment of an `Order` of the authenticated `Seller`.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - the request body is malformed;
/// - `ORDER_NOT_EXISTS` - the `Order` doesn't exist or isn't the
///                        `Seller`'s one;
/// - `ALREADY_PAID` - the `Order` is paid already;
/// - `AMOUNT_MISMATCH` - the amount differs from the payable one;
/// - `PAYMENT_NOT_CONFIRMED` - the payment gateway didn't confirm the
///                             payment.
#[tracing::instrument(
    skip_all,
    fields(order_id = tracing::field::Empty, otel.name = "payment confirm"),
)]
pub async fn confirm(
    ctx: Context,
    request: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, Error> {
    let Json(request) = request.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("order_id", tracing::field::display(request.product_id));

    let session = ctx.current_session().await?;
    let cmd = command::ConfirmPayment {
        seller_id: session.user_id(),
        order_id: request.product_id,
        payment_key: payment::Key::new(request.payment_key).ok_or_else(
            || Error::bad_request(&"invalid `paymentKey`"),
        )?,
        gateway_order_id: payment::GatewayOrderId::new(request.order_id)
            .ok_or_else(|| Error::bad_request(&"invalid `orderId`"))?,
        amount: Money::new(request.amount),
    };

    let command::confirm_payment::Output { order, payment } = ctx
        .service()
        .execute(cmd)
        .await
        .map_err(|e| {
            log::warn!("payment confirmation failed: {e}");
            e.into_error()
        })?;

    Ok(Json(Response {
        order_id: order.id,
        payment_id: payment.id,
        amount: payment.amount.won(),
        paid_at: order
            .paid_at
            .map_or_else(DateTime::now, |at| at.coerce())
            .to_rfc3339(),
    }))
}

impl AsError for command::confirm_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_NOT_CONFIRMED"]
                #[status = BAD_GATEWAY]
                #[message = "Payment gateway didn't confirm the payment"]
                NotConfirmed,

                #[code = "ORDER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Order` with the specified ID does not exist"]
                OrderNotExists,

                #[code = "ALREADY_PAID"]
                #[status = CONFLICT]
                #[message = "`Order` is paid already"]
                AlreadyPaid,

                #[code = "AMOUNT_MISMATCH"]
                #[status = BAD_REQUEST]
                #[message = "Amount differs from the payable one"]
                AmountMismatch,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(e) => Some(
                crate::Error::from(Error::NotConfirmed)
                    .with_payload(e.payload().cloned()),
            ),
            Self::NotConfirmed(receipt) => Some(
                crate::Error::from(Error::NotConfirmed)
                    .with_payload(Some(receipt.payload.clone())),
            ),
            Self::OrderNotExists(_) => Some(Error::OrderNotExists.into()),
            Self::AlreadyPaid(_) => Some(Error::AlreadyPaid.into()),
            Self::AmountMismatch { .. } => Some(Error::AmountMismatch.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use serde_json::json;
    use service::{
        command::confirm_payment::ExecutionError,
        infra::gateway::{self, toss},
    };

    use crate::AsError as _;

    use super::Request;

    #[test]
    fn reads_widget_redirect() {
        let req: Request = serde_json::from_value(json!({
            "paymentKey": "tgen_20250309abcd",
            "orderId": "order-000001",
            "amount": 15_000,
            "productId": "0195780a-7a5e-7d1c-9c3e-1f2a3b4c5d6e",
        }))
        .unwrap();

        assert_eq!(req.payment_key, "tgen_20250309abcd");
        assert_eq!(req.amount, 15_000);
    }

    #[test]
    fn reports_upstream_payload() {
        let payload = json!({"status": "WAITING_FOR_DEPOSIT"});
        let err = ExecutionError::NotConfirmed(toss::Receipt {
            status: "WAITING_FOR_DEPOSIT".to_owned(),
            total_amount: None,
            payload: payload.clone(),
        })
        .as_error();
        assert_eq!(err.code, "PAYMENT_NOT_CONFIRMED");
        assert_eq!(err.status_code, http::StatusCode::BAD_GATEWAY);
        assert_eq!(err.payload, Some(payload));

        let payload = json!({"code": "REJECT_CARD_PAYMENT"});
        let err = ExecutionError::Gateway(gateway::Error::Rejected {
            status: 403,
            payload: payload.clone(),
        })
        .as_error();
        assert_eq!(err.code, "PAYMENT_NOT_CONFIRMED");
        assert_eq!(err.payload, Some(payload));
    }
}
