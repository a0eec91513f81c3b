//! [`Seller`] read model definition.
//!
//! [`Seller`]: crate::domain::Seller

pub mod list {
    //! [`Seller`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::{Seller, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = user::Id;

    /// Cursor pointing to a specific [`Seller`] in a list.
    pub type Cursor = user::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`user::Name`] (or its part) of the [`User`] to fuzzy search for.
        pub name: Option<user::Name>,
    }

    /// Total count of [`Seller`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
