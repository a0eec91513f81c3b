//! [`Query`] pricing booking items without placing them.

use common::{
    operations::{By, Select},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        pricing::{self, PricingError},
        user, Seller,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] pricing [`pricing::Item`]s with the configured
/// [`pricing::Policy`].
#[derive(Clone, Debug)]
pub struct GetQuote {
    /// [`pricing::Item`]s to be priced.
    pub items: Vec<pricing::Item>,

    /// ID of the [`Seller`] to preview the deposit usage of.
    pub seller_id: Option<user::Id>,
}

/// Output of [`GetQuote`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Computed [`pricing::Quote`].
    pub quote: pricing::Quote,

    /// Part of the total the [`Seller`]'s deposit would cover.
    pub deposit_applicable: Money,
}

impl<Db, Gw> Query<GetQuote> for Service<Db, Gw>
where
    Db: Database<
        Select<By<Option<Seller>, user::Id>>,
        Ok = Option<Seller>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        GetQuote { items, seller_id }: GetQuote,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        if items.is_empty() {
            return Err(tracerr::new!(E::NoItems));
        }
        let quote = pricing::Quote::compute(&self.config().pricing, items)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let deposit_applicable = match seller_id {
            Some(id) => self
                .database()
                .execute(Select(By::<Option<Seller>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .map_or(Money::ZERO, |s| s.usable_deposit(quote.total)),
            None => Money::ZERO,
        };

        Ok(Output {
            quote,
            deposit_applicable,
        })
    }
}

/// Error of [`GetQuote`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`pricing::Item`] cannot be priced.
    #[display("{_0}")]
    Pricing(PricingError),

    /// No [`pricing::Item`]s provided.
    #[display("No items to quote")]
    NoItems,
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::pricing::{
            DeliveryType, Item, PricingError, Quantity, ReviewType,
        },
        test_support::{self, service, Stub},
        Query as _,
    };

    use super::{ExecutionError, GetQuote};

    fn item(review_type: ReviewType, delivery_type: DeliveryType) -> Item {
        Item {
            date: "2025-03-10".parse().unwrap(),
            delivery_type,
            review_type,
            quantity: Quantity::new(3).unwrap(),
            product_price: Money::new(10_000),
        }
    }

    #[tokio::test]
    async fn quotes_with_commission_and_deposit() {
        let svc = service(Stub::default());
        let seller = test_support::seller(&svc, 50_000).await;

        let out = svc
            .execute(GetQuote {
                items: vec![item(
                    ReviewType::StarRating,
                    DeliveryType::RealDelivery,
                )],
                seller_id: Some(seller.id),
            })
            .await
            .unwrap();

        assert_eq!(out.quote.subtotal, Money::new(34_800));
        assert_eq!(out.quote.total, Money::new(39_672));
        assert_eq!(out.deposit_applicable, Money::new(39_672));

        let anonymous = svc
            .execute(GetQuote {
                items: vec![item(
                    ReviewType::StarRating,
                    DeliveryType::RealDelivery,
                )],
                seller_id: None,
            })
            .await
            .unwrap();
        assert_eq!(anonymous.deposit_applicable, Money::ZERO);
    }

    #[tokio::test]
    async fn rejects_unsupported_and_empty_items() {
        let svc = service(Stub::default());

        let err = svc
            .execute(GetQuote {
                items: vec![item(ReviewType::Photo, DeliveryType::EmptyBox)],
                seller_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Pricing(PricingError::UnsupportedPricing { .. }),
        ));

        let err = svc
            .execute(GetQuote {
                items: vec![],
                seller_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoItems));
    }
}
