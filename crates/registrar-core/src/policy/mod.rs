//! Pure decision functions consulted before any mutating registrar call
//!
//! - [`evaluate_mode`]: is a renewal due?
//! - [`check_price`]: is a purchase affordable?

pub mod expiry;
pub mod price;

pub use expiry::{EXPIRY_LAYOUT, RenewalMode, evaluate_mode, evaluate_mode_at, format_expiry, parse_expiry};
pub use price::{MICROS_PER_UNIT, check_price, micros};
