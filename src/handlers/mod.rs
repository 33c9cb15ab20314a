pub mod bookings;
pub mod health;
pub mod login;
pub mod password_reset;
pub mod profile;
pub mod register;

pub use bookings::{create_booking, get_booking, list_bookings};
pub use health::health_check;
pub use login::login;
pub use password_reset::{forgot_password, reset_password, verify_reset_token};
pub use profile::update_profile;
pub use register::register;
