//! Plain HTTP endpoints living next to the GraphQL API.

pub mod export;
pub mod payment;

pub use self::{export::bookings_csv, payment::confirm};
