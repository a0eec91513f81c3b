//! [`Seller`] definitions.

use std::cmp;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Business profile and deposit ledger of a seller [`User`].
#[derive(Clone, Debug)]
pub struct Seller {
    /// ID of this [`Seller`], same as the ID of its [`User`].
    pub id: user::Id,

    /// [`BusinessNumber`] this [`Seller`] is registered with.
    pub business_number: BusinessNumber,

    /// [`DateTime`] when the [`BusinessNumber`] was last confirmed active
    /// by the business registry.
    pub verified_at: Option<VerificationDateTime>,

    /// [`Referrer`] this [`Seller`] came through, if any.
    pub referrer: Option<Referrer>,

    /// Deposit balance of this [`Seller`].
    ///
    /// Never negative.
    pub deposit: Money,

    /// [`DateTime`] when this [`Seller`] was created.
    pub created_at: CreationDateTime,
}

impl Seller {
    /// Applies the signed `amount` to the deposit balance of this [`Seller`]
    /// and returns the new balance.
    ///
    /// # Errors
    ///
    /// If the balance would become negative or overflow. The balance stays
    /// untouched in such case.
    pub fn apply(&mut self, amount: Money) -> Result<Money, DepositError> {
        use DepositError as E;

        let balance = self
            .deposit
            .checked_add(amount)
            .ok_or(E::Overflow)?;
        if balance.is_negative() {
            return Err(E::Insufficient {
                balance: self.deposit,
                amount,
            });
        }

        self.deposit = balance;
        Ok(balance)
    }

    /// Returns the part of the deposit usable to pay the provided `total`.
    #[must_use]
    pub fn usable_deposit(&self, total: Money) -> Money {
        cmp::max(cmp::min(total, self.deposit), Money::ZERO)
    }
}

/// Error of applying an amount to a [`Seller::deposit`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum DepositError {
    /// Balance is not enough to be debited by the amount.
    #[display("deposit balance {balance} is insufficient for {amount}")]
    Insufficient {
        /// Balance at the moment of the debit.
        balance: Money,

        /// Requested amount.
        amount: Money,
    },

    /// Balance would overflow.
    #[display("deposit balance overflow")]
    Overflow,
}

/// Korean business registration number: 10 digits.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct BusinessNumber(String);

impl BusinessNumber {
    /// Number of digits in a [`BusinessNumber`].
    pub const DIGITS: usize = 10;

    /// Creates a new [`BusinessNumber`] out of the provided `input`.
    ///
    /// Hyphens (as in the common `123-45-67890` notation) and surrounding
    /// whitespace are ignored.
    #[must_use]
    pub fn new(input: impl AsRef<str>) -> Option<Self> {
        let digits = input
            .as_ref()
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>();
        (digits.len() == Self::DIGITS
            && digits.bytes().all(|b| b.is_ascii_digit()))
        .then_some(Self(digits))
    }

    /// Returns this [`BusinessNumber`] in the `123-45-67890` notation.
    #[must_use]
    pub fn hyphenated(&self) -> String {
        format!("{}-{}-{}", &self.0[..3], &self.0[3..5], &self.0[5..])
    }
}

impl std::str::FromStr for BusinessNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `BusinessNumber`")
    }
}

/// Free-form note on who referred a [`Seller`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Referrer(String);

impl Referrer {
    /// Creates a new [`Referrer`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let ok = text.trim() == text
            && !text.is_empty()
            && text.chars().count() <= 64;
        ok.then_some(Self(text))
    }
}

impl std::str::FromStr for Referrer {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Referrer`")
    }
}

/// [`DateTime`] when a [`Seller`] was created.
pub type CreationDateTime = DateTimeOf<(Seller, unit::Creation)>;

/// [`DateTime`] when a [`Seller`]'s [`BusinessNumber`] was verified.
pub type VerificationDateTime = DateTimeOf<(Seller, unit::Verification)>;
