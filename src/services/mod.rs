pub mod allocation;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reconciliation;
pub mod supersession;

use rust_decimal::Decimal;

/// Applies a caller-specific percentage adjustment to a base price and
/// rounds to cents. Adjustment is applied at read time and never persisted.
pub(crate) fn adjusted_price(base: Decimal, adjustment_percent: Decimal) -> Decimal {
    (base * (Decimal::ONE + adjustment_percent / Decimal::ONE_HUNDRED)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_adjustment_rounds_to_cents() {
        assert_eq!(adjusted_price(dec!(100), dec!(10)), dec!(110.00));
        assert_eq!(adjusted_price(dec!(9.99), dec!(0)), dec!(9.99));
        assert_eq!(adjusted_price(dec!(33.33), dec!(7.5)), dec!(35.83));
        assert_eq!(adjusted_price(dec!(10), dec!(-25)), dec!(7.50));
    }
}
