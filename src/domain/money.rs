use rust_decimal::{Decimal, RoundingStrategy};

/// Monetary amounts are kept with two decimal places, like the `DECIMAL(10,2)`
/// columns of most storefront schemas.
pub const AMOUNT_SCALE: u32 = 2;

/// Exchange rates keep this many significant digits, whatever their magnitude.
pub const RATE_SIGNIFICANT_DIGITS: u32 = 15;

/// Round a monetary amount to [`AMOUNT_SCALE`] places (half away from zero).
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an exchange rate to [`RATE_SIGNIFICANT_DIGITS`] (half away from zero).
/// Returns `None` unless the result is still positive.
pub fn round_rate(rate: Decimal) -> Option<Decimal> {
    rate.round_sf_with_strategy(RATE_SIGNIFICANT_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .map(|r| r.normalize())
        .filter(|r| *r > Decimal::ZERO)
}

/// Reciprocal of a positive rate, rounded like any other rate.
/// Returns `None` for zero or negative input, or when the reciprocal
/// underflows to zero.
pub fn reciprocal_rate(rate: Decimal) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }
    Decimal::ONE.checked_div(rate).and_then(round_rate)
}

/// Re-express an amount priced in one currency using `rate` (from -> to).
/// Returns `None` when the product does not fit in a `Decimal`.
pub fn convert(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount.checked_mul(rate).map(round_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_amount() {
        assert_eq!(round_amount(d("10.005")), d("10.01"));
        assert_eq!(round_amount(d("10.004")), d("10.00"));
        assert_eq!(round_amount(d("-2.345")), d("-2.35"));
    }

    #[test]
    fn test_round_rate_keeps_significant_digits() {
        assert_eq!(round_rate(d("0.92")), Some(d("0.92")));
        assert_eq!(round_rate(d("2500000000")), Some(d("2500000000")));
        assert_eq!(
            round_rate(d("0.0000426330150068212824010914")),
            Some(d("0.0000426330150068213"))
        );
        assert_eq!(round_rate(Decimal::ZERO), None);
        assert_eq!(round_rate(d("-1.5")), None);
    }

    #[test]
    fn test_reciprocal_rate() {
        assert_eq!(reciprocal_rate(d("0.92")), Some(d("1.08695652173913")));
        assert_eq!(reciprocal_rate(d("2")), Some(d("0.5")));
        assert_eq!(reciprocal_rate(d("2500000000")), Some(d("0.0000000004")));
        assert_eq!(reciprocal_rate(Decimal::ZERO), None);
        assert_eq!(reciprocal_rate(d("-1")), None);
    }

    #[test]
    fn test_reciprocal_rate_underflow() {
        assert_eq!(reciprocal_rate(Decimal::MAX), None);
    }

    #[test]
    fn test_convert_rounds_to_cents() {
        assert_eq!(convert(d("100"), d("0.92")), Some(d("92.00")));
        assert_eq!(convert(d("19.99"), d("1.08695652173913")), Some(d("21.73")));
    }

    #[test]
    fn test_convert_overflow() {
        assert_eq!(convert(Decimal::MAX, d("160")), None);
        assert_eq!(convert(Decimal::MAX, Decimal::ONE), Some(Decimal::MAX));
    }
}
