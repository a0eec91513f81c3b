//! [`Payment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Order, Seller};
use crate::domain::{order, user};

/// Payment of an [`Order`] confirmed by the payment gateway.
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the paid [`Order`].
    pub order_id: order::Id,

    /// ID of the [`Seller`] who paid.
    pub seller_id: user::Id,

    /// [`Key`] of this [`Payment`] in the payment gateway.
    pub payment_key: Key,

    /// [`GatewayOrderId`] this [`Payment`] was requested with.
    pub gateway_order_id: GatewayOrderId,

    /// Total amount reported by the payment gateway.
    pub amount: Money,

    /// [`DateTime`] when this [`Payment`] was recorded.
    pub created_at: CreationDateTime,
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Key identifying a [`Payment`] in the payment gateway.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Key(String);

impl Key {
    /// Creates a new [`Key`] if the given `key` is valid.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let ok = !key.is_empty()
            && key.len() <= 200
            && !key.chars().any(char::is_whitespace);
        ok.then_some(Self(key))
    }
}

/// Merchant-side order reference a [`Payment`] is requested with.
///
/// Consists of 6 to 64 ASCII letters, digits, `-` or `_`.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct GatewayOrderId(String);

impl GatewayOrderId {
    /// Creates a new [`GatewayOrderId`] if the given `id` is valid.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let ok = (6..=64).contains(&id.len())
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        ok.then_some(Self(id))
    }
}

/// [`DateTime`] when a [`Payment`] was recorded.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{GatewayOrderId, Key};

    #[test]
    fn validates_gateway_order_id() {
        assert!(GatewayOrderId::new("order_2025-03-09_0001").is_some());
        assert!(GatewayOrderId::new("short").is_none());
        assert!(GatewayOrderId::new("with space 1").is_none());
        assert!(GatewayOrderId::new("x".repeat(65)).is_none());
    }

    #[test]
    fn validates_key() {
        assert!(Key::new("tgen_20250309abcdEFGH").is_some());
        assert!(Key::new("").is_none());
        assert!(Key::new("a b").is_none());
    }
}
