//! Abstract operations [`Handler`]s are executed with.
//!
//! An operation names the action, and its type parameter names the subject,
//! so a single storage may implement [`Handler`] for any number of them:
//! `Select<By<Option<Seller>, Id>>`, `Lock<By<Booking, Id>>` and so on.

use std::marker::PhantomData;

use crate::Handler;

/// Operation to insert a new value, or overwrite the stored one with the
/// same key.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to update an already stored value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation to select a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to exclusively lock a value until the end of the current
/// transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Operation to perform a side-effecting action, like a request to a
/// third-party API.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Operation to start a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Handler`] executing operations inside the started transaction.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to commit the started transaction.
///
/// A transaction dropped without being committed is rolled back.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W`hat by `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value to select.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector of `W` by the provided value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns the value to select by.
    #[must_use]
    pub fn by(&self) -> &B {
        &self.by
    }

    /// Consumes this [`By`] and returns the value to select by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
