//! Pairwise conversion over a domestic-based rate set.

use crate::core::error::ConversionError;
use crate::core::rates::RateSet;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conversion {
    pub result: f64,
    pub rate: f64,
}

pub fn validate_amount(amount: f64) -> Result<f64, ConversionError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(ConversionError::InvalidAmount(amount.to_string()))
    }
}

/// Converts `amount` of `from` into `to`.
///
/// Each entry's `rate` is the domestic price of one unit, so the cross rate is
/// `rate[from] / rate[to]`. A code missing from the set is priced at 1, i.e.
/// treated as the domestic currency.
pub fn convert(
    rates: &RateSet,
    from: &str,
    to: &str,
    amount: f64,
) -> Result<Conversion, ConversionError> {
    let amount = validate_amount(amount)?;

    let from_rate = rates.get(from).map_or(1.0, |e| e.rate);
    let to_rate = rates.get(to).map_or(1.0, |e| e.rate);

    let rate = from_rate / to_rate;
    Ok(Conversion {
        result: amount * rate,
        rate,
    })
}
