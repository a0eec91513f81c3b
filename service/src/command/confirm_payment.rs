//! [`Command`] for confirming a payment of an [`Order`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Perform, Select, Transact, Transacted,
        Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{order, payment, user, Order, Payment},
    infra::{database, gateway, gateway::toss, Database, Gateway},
    Service,
};

use super::Command;

/// [`Command`] for confirming a payment of an [`Order`] authorized by its
/// [`Seller`] in the payment gateway.
///
/// [`Seller`]: crate::domain::Seller
#[derive(Clone, Debug)]
pub struct ConfirmPayment {
    /// ID of the [`Seller`] paying the [`Order`].
    ///
    /// [`Seller`]: crate::domain::Seller
    pub seller_id: user::Id,

    /// ID of the [`Order`] being paid.
    pub order_id: order::Id,

    /// [`payment::Key`] issued by the payment gateway.
    pub payment_key: payment::Key,

    /// [`payment::GatewayOrderId`] the payment was requested with.
    pub gateway_order_id: payment::GatewayOrderId,

    /// Amount authorized by the buyer.
    pub amount: Money,
}

/// Output of [`ConfirmPayment`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Paid [`Order`].
    pub order: Order,

    /// Recorded [`Payment`].
    pub payment: Payment,
}

impl<Db, Gw> Command<ConfirmPayment> for Service<Db, Gw>
where
    Db: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Order, order::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Order>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Gw: Gateway<
        Perform<toss::Confirmation>,
        Ok = toss::Receipt,
        Err = Traced<gateway::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmPayment {
            seller_id,
            order_id,
            payment_key,
            gateway_order_id,
            amount,
        } = cmd;

        let order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|o| o.seller_id == seller_id)
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if order.status != order::Status::AwaitingPayment {
            return Err(tracerr::new!(E::AlreadyPaid(order_id)));
        }
        if order.payable != amount {
            return Err(tracerr::new!(E::AmountMismatch {
                expected: order.payable,
                actual: amount,
            }));
        }

        let receipt = self
            .gateway()
            .execute(Perform(toss::Confirmation {
                payment_key: payment_key.clone(),
                order_id: gateway_order_id.clone(),
                amount,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !receipt.is_done() {
            log::warn!(
                "payment of `Order(id: {order_id})` is not confirmed: \
                 `{}` status",
                receipt.status,
            );
            return Err(tracerr::new!(E::NotConfirmed(receipt)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Reject a second confirmation of the same `Order`.
        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if order.status != order::Status::AwaitingPayment {
            return Err(tracerr::new!(E::AlreadyPaid(order_id)));
        }

        let payment = Payment {
            id: payment::Id::new(),
            order_id,
            seller_id,
            payment_key,
            gateway_order_id,
            amount: receipt.total_amount.unwrap_or(amount),
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        order.mark_paid();
        tx.execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output { order, payment })
    }
}

/// Error of [`ConfirmPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Gateway`] error.
    #[display("`Gateway` operation failed: {_0}")]
    Gateway(gateway::Error),

    /// Payment gateway didn't confirm the payment.
    #[display("Payment is not confirmed: `{}` status", _0.status)]
    #[from(ignore)]
    NotConfirmed(#[error(not(source))] toss::Receipt),

    /// [`Order`] doesn't exist or belongs to another seller.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Order`] is paid already.
    #[display("`Order(id: {_0})` is paid already")]
    #[from(ignore)]
    AlreadyPaid(#[error(not(source))] order::Id),

    /// Authorized amount differs from the payable one.
    #[display("Expected `{expected}` to be paid, but `{actual}` authorized")]
    #[from(ignore)]
    AmountMismatch {
        /// Payable amount of the [`Order`].
        expected: Money,

        /// Authorized amount.
        actual: Money,
    },
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::{order, payment, user::Id},
        test_support::{self, service, Stub, TestService},
        Command as _,
    };

    use super::{ConfirmPayment, ExecutionError, Output};

    fn confirmation(
        seller_id: Id,
        order_id: order::Id,
        amount: Money,
    ) -> ConfirmPayment {
        ConfirmPayment {
            seller_id,
            order_id,
            payment_key: payment::Key::new("tgen_20250309abcd").unwrap(),
            gateway_order_id: payment::GatewayOrderId::new("order-000001")
                .unwrap(),
            amount,
        }
    }

    async fn unpaid(svc: &TestService) -> (Id, order::Id, Money) {
        let booking = test_support::booking(svc, 1).await;
        let state = svc.database().state().await;
        let order = &state.orders[&booking.order_id];
        (booking.seller_id, order.id, order.payable)
    }

    #[tokio::test]
    async fn records_payment_and_marks_order_paid() {
        let svc = service(Stub::default());
        let (seller_id, order_id, payable) = unpaid(&svc).await;

        let Output { order, payment } = svc
            .execute(confirmation(seller_id, order_id, payable))
            .await
            .unwrap();

        assert_eq!(order.status, order::Status::Paid);
        assert!(order.paid_at.is_some());
        assert_eq!(payment.amount, payable);

        let state = svc.database().state().await;
        assert_eq!(state.orders[&order_id].status, order::Status::Paid);
        assert_eq!(state.payments.len(), 1);

        let err = svc
            .execute(confirmation(seller_id, order_id, payable))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyPaid(_)));
        assert_eq!(svc.gateway().requests(), 1);
    }

    #[tokio::test]
    async fn mutates_nothing_unless_done() {
        for stub in [
            Stub::default().with_payment_status(Some("WAITING_FOR_DEPOSIT")),
            Stub::default().with_payment_status(None),
        ] {
            let svc = service(stub);
            let (seller_id, order_id, payable) = unpaid(&svc).await;

            let err = svc
                .execute(confirmation(seller_id, order_id, payable))
                .await
                .unwrap_err();

            assert!(matches!(
                err.as_ref(),
                ExecutionError::NotConfirmed(_) | ExecutionError::Gateway(_),
            ));
            let state = svc.database().state().await;
            assert_eq!(
                state.orders[&order_id].status,
                order::Status::AwaitingPayment,
            );
            assert!(state.payments.is_empty());
        }
    }

    #[tokio::test]
    async fn rejects_foreign_order_and_wrong_amount() {
        let svc = service(Stub::default());
        let (seller_id, order_id, payable) = unpaid(&svc).await;

        let err = svc
            .execute(confirmation(Id::new(), order_id, payable))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::OrderNotExists(_)));

        let wrong = Money::new(payable.won() - 1);
        let err = svc
            .execute(confirmation(seller_id, order_id, wrong))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::AmountMismatch { .. },
        ));

        assert_eq!(svc.gateway().requests(), 0);
    }
}
