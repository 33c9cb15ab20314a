pub mod booking;
pub mod user;

pub use booking::{Booking, NewBooking};
pub use user::User;
