//! Domain definitions.

pub mod booking;
pub mod capacity;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod seller;
pub mod user;

pub use self::{
    booking::Booking, capacity::Capacity, order::Order, payment::Payment,
    seller::Seller, user::User,
};
