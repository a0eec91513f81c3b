//! Stub [`Gateway`] for tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::operations::{By, Perform, Select};
use serde_json::json;
use tracerr::Traced;

use crate::domain::seller::BusinessNumber;

use super::{nts, toss, Error, Gateway};

/// [`Gateway`] answering without performing any requests.
#[derive(Clone, Debug)]
pub struct Stub {
    /// Status payment confirmations are answered with, or [`None`] to reject
    /// them.
    payment_status: Option<&'static str>,

    /// Status code businesses are reported with.
    business_code: &'static str,

    /// Number of the answered requests.
    requests: Arc<AtomicUsize>,
}

impl Default for Stub {
    fn default() -> Self {
        Self {
            payment_status: Some(toss::Receipt::DONE),
            business_code: nts::Status::ACTIVE,
            requests: Arc::default(),
        }
    }
}

impl Stub {
    /// Answers payment confirmations with the provided `status`, or rejects
    /// them if [`None`].
    #[must_use]
    pub fn with_payment_status(mut self, status: Option<&'static str>) -> Self {
        self.payment_status = status;
        self
    }

    /// Reports businesses with the provided status `code`.
    #[must_use]
    pub fn with_business_code(mut self, code: &'static str) -> Self {
        self.business_code = code;
        self
    }

    /// Returns the number of the answered requests.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Gateway<Perform<toss::Confirmation>> for Stub {
    type Ok = toss::Receipt;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Perform(c): Perform<toss::Confirmation>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.requests.fetch_add(1, Ordering::SeqCst);

        let Some(status) = self.payment_status else {
            return Err(tracerr::new!(Error::Rejected {
                status: 400,
                payload: json!({
                    "code": "REJECT_CARD_PAYMENT",
                    "message": "한도초과 혹은 잔액부족으로 결제에 실패했습니다.",
                }),
            }));
        };
        toss::Receipt::parse(json!({
            "paymentKey": c.payment_key,
            "orderId": c.order_id,
            "status": status,
            "totalAmount": c.amount,
        }))
        .map_err(tracerr::wrap!())
    }
}

impl Gateway<Select<By<nts::Status, BusinessNumber>>> for Stub {
    type Ok = nts::Status;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<nts::Status, BusinessNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.requests.fetch_add(1, Ordering::SeqCst);

        nts::Status::parse(json!({
            "data": [{
                "b_no": by.into_inner().to_string(),
                "b_stt_cd": self.business_code,
            }],
        }))
        .map_err(tracerr::wrap!())
    }
}
