//! [Toss Payments] API.
//!
//! [Toss Payments]: https://docs.tosspayments.com/reference

use common::{operations::Perform, Money};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracerr::Traced;

use crate::domain::payment;

use super::{read_json, Error, Gateway, Http};

/// [Toss Payments] API configuration.
///
/// [Toss Payments]: https://docs.tosspayments.com/reference
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the API.
    pub url: String,

    /// Secret key authenticating the merchant.
    pub secret_key: SecretString,
}

/// Confirmation of a payment authorized by a buyer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    /// [`payment::Key`] issued on the buyer's authorization.
    pub payment_key: payment::Key,

    /// Merchant-side order reference the payment was requested with.
    pub order_id: payment::GatewayOrderId,

    /// Amount to be charged.
    pub amount: Money,
}

/// Result of a [`Confirmation`] reported by the API.
#[derive(Clone, Debug)]
pub struct Receipt {
    /// Status of the payment.
    pub status: String,

    /// Total amount charged, if reported.
    pub total_amount: Option<Money>,

    /// Raw response of the API.
    pub payload: Json,
}

impl Receipt {
    /// Status of a successfully confirmed payment.
    pub const DONE: &'static str = "DONE";

    /// Parses a [`Receipt`] out of the provided API response.
    ///
    /// # Errors
    ///
    /// With [`Error::Malformed`] if the response has no `status`.
    pub fn parse(payload: Json) -> Result<Self, Error> {
        /// Fields of the response this [`Receipt`] is interested in.
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            /// Status of the payment.
            status: String,

            /// Total amount charged.
            #[serde(default)]
            total_amount: Option<Money>,
        }

        match Body::deserialize(&payload) {
            Ok(Body {
                status,
                total_amount,
            }) => Ok(Self {
                status,
                total_amount,
                payload,
            }),
            Err(_) => Err(Error::Malformed(payload)),
        }
    }

    /// Indicates whether the payment is successfully confirmed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == Self::DONE
    }
}

impl Gateway<Perform<Confirmation>> for Http {
    type Ok = Receipt;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(confirmation): Perform<Confirmation>,
    ) -> Result<Self::Ok, Self::Err> {
        let url = format!(
            "{}/v1/payments/confirm",
            self.toss.url.trim_end_matches('/'),
        );
        let response = self
            .client
            .post(url)
            .basic_auth(self.toss.secret_key.expose_secret(), None::<&str>)
            .json(&confirmation)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let payload = read_json(response).await.map_err(tracerr::wrap!())?;
        Receipt::parse(payload).map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use serde_json::json;

    use crate::{domain::payment, infra::gateway::Error};

    use super::{Confirmation, Receipt};

    #[test]
    fn serializes_confirmation() {
        let c = Confirmation {
            payment_key: payment::Key::new("tgen_20240101abc").unwrap(),
            order_id: payment::GatewayOrderId::new("order-123456").unwrap(),
            amount: Money::new(39_672),
        };

        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({
                "paymentKey": "tgen_20240101abc",
                "orderId": "order-123456",
                "amount": 39_672,
            }),
        );
    }

    #[test]
    fn parses_receipt() {
        let r = Receipt::parse(json!({
            "status": "DONE",
            "totalAmount": 39_672,
            "method": "카드",
        }))
        .unwrap();
        assert!(r.is_done());
        assert_eq!(r.total_amount, Some(Money::new(39_672)));
        assert_eq!(r.payload["method"], "카드");

        let r = Receipt::parse(json!({"status": "WAITING_FOR_DEPOSIT"}))
            .unwrap();
        assert!(!r.is_done());
        assert_eq!(r.total_amount, None);
    }

    #[test]
    fn rejects_receipt_without_status() {
        let err = Receipt::parse(json!({"code": "NOT_FOUND_PAYMENT"}))
            .unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }
}
