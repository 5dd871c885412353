//! Maximum-price guard
//!
//! Registrars quote prices in micro-units of the account currency
//! (1 whole unit = 1,000,000 micro-units); callers express their ceiling in
//! whole units.

use crate::error::{Error, Result};

/// Micro-units per whole currency unit
pub const MICROS_PER_UNIT: u64 = 1_000_000;

/// Convert whole currency units to micro-units, saturating on overflow
pub fn micros(whole_units: u64) -> u64 {
    whole_units.saturating_mul(MICROS_PER_UNIT)
}

/// Accept a quote that does not exceed the ceiling (inclusive)
pub fn check_price(quoted_micros: u64, max_price_whole_units: u64) -> Result<()> {
    let max_micros = micros(max_price_whole_units);
    if quoted_micros > max_micros {
        return Err(Error::Overpriced {
            quoted_micros,
            max_micros,
        });
    }
    Ok(())
}
