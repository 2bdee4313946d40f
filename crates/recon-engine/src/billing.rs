//! 6-second increment billing
//!
//! The billed unit is one tenth of a minute: the unit count is
//! `ceil(duration / 6)` and each unit costs `rate / 10`. All arithmetic is
//! exact `Decimal`; rounding happens only at the reporting edges (2 decimal
//! places for totals, 4 for per-row cost differences), half-up.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of billed 6-second increments for a duration
#[inline]
pub fn increments(duration_secs: i64) -> i64 {
    if duration_secs <= 0 {
        0
    } else {
        (duration_secs + 5) / 6
    }
}

/// Cost of one call at a per-minute rate
#[inline]
pub fn call_cost(duration_secs: i64, rate_per_minute: Decimal) -> Decimal {
    Decimal::from(increments(duration_secs)) * rate_per_minute / Decimal::from(10)
}

/// Round a dollar total for reporting (2 decimals, half-up)
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a per-row cost difference for reporting (4 decimals, half-up)
#[inline]
pub fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal_macros::dec;

    #[test]
    fn test_increment_boundaries() {
        assert_eq!(increments(0), 0);
        assert_eq!(increments(-30), 0);
        assert_eq!(increments(1), 1);
        assert_eq!(increments(6), 1);
        assert_eq!(increments(7), 2);
        assert_eq!(increments(13), 3);
        assert_eq!(increments(60), 10);
    }

    #[test]
    fn test_cost_boundaries() {
        assert_eq!(call_cost(0, dec!(0.015)), dec!(0));
        assert_eq!(call_cost(1, dec!(0.015)), dec!(0.0015));
        assert_eq!(call_cost(6, dec!(0.015)), dec!(0.0015));
        assert_eq!(call_cost(7, dec!(0.015)), dec!(0.0030));
        assert_eq!(call_cost(13, dec!(0.015)), dec!(0.0045));
        assert_eq!(call_cost(120, dec!(0.015)), dec!(0.030));
    }

    #[test]
    fn test_zero_duration_costs_nothing_at_any_rate() {
        for rate in [dec!(0), dec!(0.015), dec!(5)] {
            assert_eq!(call_cost(0, rate), Decimal::ZERO);
        }
    }

    #[test]
    fn test_cost_monotone_in_duration_and_rate() {
        let rate = dec!(0.0125);
        let mut last = Decimal::ZERO;
        for d in 0..600 {
            let cost = call_cost(d, rate);
            assert!(cost >= last, "cost dropped at d={}", d);
            last = cost;
        }

        let mut last = Decimal::ZERO;
        for tenths in 0..100 {
            let rate = Decimal::from_i64(tenths).unwrap() / dec!(1000);
            let cost = call_cost(95, rate);
            assert!(cost >= last, "cost dropped at rate={}", rate);
            last = cost;
        }
    }

    #[test]
    fn test_rounding_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_cost(dec!(0.00005)), dec!(0.0001));
        assert_eq!(round_cost(dec!(0.00004)), dec!(0.0000));
    }
}
