//! Read entities definitions.

pub mod booking;
pub mod capacity;
pub mod seller;

pub use self::capacity::Availability;
