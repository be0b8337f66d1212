use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed-point currency amount (two decimal places)
pub type Money = Decimal;

/// Charge breakdown for one completed occupancy interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingBreakdown {
    /// Occupancy start (epoch seconds)
    pub entry_time: i64,
    /// Occupancy end (epoch seconds)
    pub exit_time: i64,
    /// Whole minutes parked
    pub duration_minutes: i64,
    pub base_charge: Money,
    pub minute_charge: Money,
    pub total_amount: Money,
}

/// Convert to integer hundredths for storage
pub fn to_minor_units(amount: Money) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .unwrap_or_default()
}

/// Convert stored hundredths back to a two-place amount
pub fn from_minor_units(minor: i64) -> Money {
    Decimal::new(minor, 2)
}
