//! GraphQL API definitions.

pub mod booking;
pub mod capacity;
mod mutation;
pub mod order;
mod query;
pub mod quote;
pub mod scalar;
pub mod seller;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    booking::Booking, mutation::Mutation, order::Order, query::Query,
    seller::Seller, user::User,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an admin"]
        Admin,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
