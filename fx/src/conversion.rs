//! Amount conversion and display rounding.

use orderdesk_common::Currency;
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};

/// Convert a home-currency amount into units of the rate's currency.
///
/// Rates are quoted as home currency per unit, so the amount is divided.
pub fn apply_rate(amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
    if rate <= Decimal::ZERO {
        return Err(FxError::InvalidUpstreamResponse(format!(
            "non-positive rate {}",
            rate
        )));
    }

    amount
        .checked_div(rate)
        .ok_or_else(|| FxError::InvalidUpstreamResponse(format!("rate {} overflows amount {}", rate, amount)))
}

/// Round an amount to the currency's canonical precision.
///
/// Midpoints round to even.
pub fn round_currency_amount(amount: Decimal, currency: &Currency) -> Decimal {
    currency.round(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_by_currency() {
        assert_eq!(round_currency_amount(dec!(123.456), &Currency::jpy()), dec!(123));
        assert_eq!(round_currency_amount(dec!(123.456), &Currency::usd()), dec!(123.46));
        assert_eq!(round_currency_amount(dec!(123.456), &Currency::new("ZZZ")), dec!(123.46));
        assert_eq!(round_currency_amount(dec!(123.456), &Currency::pln()), dec!(123.46));
    }

    #[test]
    fn test_round_midpoint_to_even() {
        assert_eq!(round_currency_amount(dec!(0.125), &Currency::eur()), dec!(0.12));
        assert_eq!(round_currency_amount(dec!(0.135), &Currency::eur()), dec!(0.14));
        assert_eq!(round_currency_amount(dec!(2.5), &Currency::jpy()), dec!(2));
    }

    #[test]
    fn test_apply_rate_divides() {
        let converted = apply_rate(dec!(100.0), dec!(4.5)).unwrap();

        assert!(converted > dec!(22.2222) && converted < dec!(22.2223));
        assert_eq!(round_currency_amount(converted, &Currency::usd()), dec!(22.22));
    }

    #[test]
    fn test_apply_rate_rejects_zero() {
        assert!(matches!(
            apply_rate(dec!(100), Decimal::ZERO),
            Err(FxError::InvalidUpstreamResponse(_))
        ));
    }

    proptest! {
        #[test]
        fn rounded_scale_never_exceeds_precision(
            cents in 1i64..10_000_000_000,
            scale in 0u32..8,
            code in prop::sample::select(vec!["PLN", "USD", "EUR", "GBP", "JPY", "CHF"]),
        ) {
            let currency = Currency::new(code);
            let amount = Decimal::new(cents, scale);
            let rounded = round_currency_amount(amount, &currency);

            prop_assert!(rounded.scale() <= currency.decimal_places());
            let half_unit = Decimal::new(5, currency.decimal_places() + 1);
            prop_assert!((rounded - amount).abs() <= half_unit);
        }
    }
}
