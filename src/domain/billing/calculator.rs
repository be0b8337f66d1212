use rust_decimal::{Decimal, RoundingStrategy};

use super::model::{BillingBreakdown, Money};
use crate::shared::errors::{DomainError, DomainResult};

/// Flat charge applied to every settled session and every quote
pub const BASE_CHARGE: i64 = 30;
/// Charge per started 30-second interval of whole-minute usage
pub const RATE_PER_INTERVAL: i64 = 50;
pub const INTERVAL_SECONDS: i64 = 30;
/// Hourly rate for the advance reservation quote
pub const RESERVATION_RATE_PER_HOUR: i64 = 100;
/// Longest reservation that can be booked or quoted (one year)
pub const MAX_RESERVATION_HOURS: i64 = 24 * 365;

/// Compute the settlement charge for `[entry_time, exit_time]`.
///
/// Sub-minute remainders are truncated before the 30-second ceiling is
/// applied, so an 89-second stay bills as 60 seconds.
pub fn compute(entry_time: i64, exit_time: i64) -> DomainResult<BillingBreakdown> {
    if exit_time < entry_time {
        return Err(DomainError::InvalidInterval {
            entry_time,
            exit_time,
        });
    }

    // Non-negative, so integer division is floor.
    let duration_minutes = (exit_time - entry_time) / 60;
    let duration_seconds = duration_minutes * 60;
    let intervals = (duration_seconds + INTERVAL_SECONDS - 1) / INTERVAL_SECONDS;

    let base_charge = Money::from(BASE_CHARGE);
    let minute_charge = Money::from(intervals * RATE_PER_INTERVAL);

    Ok(BillingBreakdown {
        entry_time,
        exit_time,
        duration_minutes,
        base_charge,
        minute_charge,
        total_amount: base_charge + minute_charge,
    })
}

/// Reject reservation durations outside `0..=MAX_RESERVATION_HOURS`
pub fn check_reservation_hours(duration_hours: Decimal) -> DomainResult<()> {
    if duration_hours.is_sign_negative() && !duration_hours.is_zero() {
        return Err(DomainError::Validation(format!(
            "duration_hours must not be negative (got {})",
            duration_hours
        )));
    }
    if duration_hours > Decimal::from(MAX_RESERVATION_HOURS) {
        return Err(DomainError::Validation(format!(
            "duration_hours must not exceed {} (got {})",
            MAX_RESERVATION_HOURS, duration_hours
        )));
    }
    Ok(())
}

/// Advance quote for a reservation of `duration_hours`:
/// `duration_hours * 100 + 30`, rounded to cents.
pub fn reservation_quote(duration_hours: Decimal) -> DomainResult<Money> {
    check_reservation_hours(duration_hours)?;

    let hourly = duration_hours
        .checked_mul(Money::from(RESERVATION_RATE_PER_HOUR))
        .ok_or_else(|| DomainError::Validation("duration_hours is out of range".to_string()))?;
    Ok((hourly + Money::from(BASE_CHARGE))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_total(entry: i64, exit: i64) -> Money {
        let whole_seconds = ((exit - entry) / 60) * 60;
        let intervals = (whole_seconds as f64 / 30.0).ceil() as i64;
        Money::from(30 + intervals * 50)
    }

    #[test]
    fn ninety_five_seconds_bills_two_intervals() {
        let b = compute(0, 95).unwrap();
        assert_eq!(b.duration_minutes, 1);
        assert_eq!(b.base_charge, Money::from(30));
        assert_eq!(b.minute_charge, Money::from(100));
        assert_eq!(b.total_amount, Money::from(130));
        assert_eq!(b.entry_time, 0);
        assert_eq!(b.exit_time, 95);
    }

    #[test]
    fn sub_minute_remainder_is_truncated() {
        // 89 s bills exactly like 60 s
        assert_eq!(compute(0, 89).unwrap(), BillingBreakdown {
            exit_time: 89,
            ..compute(0, 60).unwrap()
        });
    }

    #[test]
    fn zero_length_session_is_base_charge_only() {
        let b = compute(500, 500).unwrap();
        assert_eq!(b.duration_minutes, 0);
        assert_eq!(b.minute_charge, Money::ZERO);
        assert_eq!(b.total_amount, Money::from(30));

        let b = compute(500, 559).unwrap();
        assert_eq!(b.total_amount, Money::from(30));
    }

    #[test]
    fn total_matches_closed_form() {
        let entry = 1_700_000_000;
        for elapsed in [0, 1, 59, 60, 61, 119, 120, 3_599, 3_600, 7_265, 86_400] {
            let b = compute(entry, entry + elapsed).unwrap();
            assert_eq!(b.total_amount, expected_total(entry, entry + elapsed), "elapsed={elapsed}");
            assert_eq!(b.total_amount, b.base_charge + b.minute_charge);
        }
    }

    #[test]
    fn one_hour_costs_six_thousand_thirty() {
        assert_eq!(compute(0, 3_600).unwrap().total_amount, Money::from(6_030));
    }

    #[test]
    fn exit_before_entry_is_rejected() {
        let err = compute(100, 99).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidInterval {
                entry_time: 100,
                exit_time: 99
            }
        );
    }

    #[test]
    fn reservation_quote_is_hourly_plus_base() {
        assert_eq!(reservation_quote(Decimal::from(2)).unwrap(), Money::from(230));
        assert_eq!(reservation_quote(Decimal::ZERO).unwrap(), Money::from(30));
        assert_eq!(
            reservation_quote(Decimal::new(15, 1)).unwrap(),
            Money::from(180)
        );
    }

    #[test]
    fn negative_reservation_duration_is_rejected() {
        assert!(matches!(
            reservation_quote(Decimal::from(-1)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn oversized_reservation_duration_is_rejected() {
        let huge = Decimal::from_str_exact("100000000000000000000000000").unwrap();
        assert!(matches!(
            reservation_quote(huge),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            reservation_quote(Decimal::from(MAX_RESERVATION_HOURS + 1)),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            reservation_quote(Decimal::from(MAX_RESERVATION_HOURS)).unwrap(),
            Money::from(MAX_RESERVATION_HOURS * 100 + 30)
        );
    }

    #[test]
    fn reservation_quote_is_rounded_to_cents() {
        assert_eq!(
            reservation_quote(Decimal::from_str_exact("0.00001").unwrap()).unwrap(),
            Money::from(30)
        );
        assert_eq!(
            reservation_quote(Decimal::from_str_exact("0.33333").unwrap()).unwrap(),
            Decimal::new(6_333, 2)
        );
        assert_eq!(
            reservation_quote(Decimal::from_str_exact("0.00005").unwrap()).unwrap(),
            Decimal::new(3_001, 2)
        );
    }
}
