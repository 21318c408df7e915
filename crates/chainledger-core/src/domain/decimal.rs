//! Fixed-point helpers at the 8-fractional-digit export boundary.
//!
//! All monetary quantities are `rust_decimal::Decimal`. Parsing is lossless
//! for both plain and scientific-notation inputs, so fractional-digit counts
//! are exact and never inherited from binary floating-point artifacts.

use rust_decimal::Decimal;

use crate::SchemaError;

/// Maximum fractional digits accepted by validation and emitted by export.
pub const MAX_FRACTIONAL_DIGITS: u32 = 8;

/// Parses a decimal quantity from an upstream payload string.
///
/// Accepts plain fixed-point (`"1.23456789"`) and scientific notation
/// (`"1.2e-9"`, `"3E+4"`). Whitespace is trimmed; anything else is rejected.
pub fn parse_decimal(input: &str) -> Result<Decimal, SchemaError> {
    let trimmed = input.trim();
    let invalid = || SchemaError::InvalidDecimal {
        value: input.to_owned(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if trimmed.contains(['e', 'E']) {
        Decimal::from_scientific(trimmed).map_err(|_| invalid())
    } else {
        trimmed.parse::<Decimal>().map_err(|_| invalid())
    }
}

/// Exact count of significant fractional digits.
///
/// Trailing zeros do not count: `1.230` has two fractional digits.
pub fn fractional_digits(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Renders a quantity in fixed-point notation for export.
///
/// Truncates (never rounds) past [`MAX_FRACTIONAL_DIGITS`], then strips
/// trailing zeros and any bare trailing decimal point.
pub fn render_fixed(value: Decimal) -> String {
    value
        .trunc_with_scale(MAX_FRACTIONAL_DIGITS)
        .normalize()
        .to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_plain_and_scientific_forms() {
        assert_eq!(parse_decimal("1.23456789").expect("plain"), dec!(1.23456789));
        assert_eq!(parse_decimal("1.2e-9").expect("scientific"), dec!(0.0000000012));
        assert_eq!(parse_decimal(" 3E+2 ").expect("positive exponent"), dec!(300));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("12.3.4").is_err());
        assert!(parse_decimal("NaN").is_err());
    }

    #[test]
    fn counts_fractional_digits_exactly() {
        assert_eq!(fractional_digits(dec!(1.23456789)), 8);
        assert_eq!(fractional_digits(dec!(1.234567891)), 9);
        assert_eq!(fractional_digits(dec!(1.230)), 2);
        assert_eq!(fractional_digits(dec!(42)), 0);
    }

    #[test]
    fn scientific_input_keeps_exact_precision() {
        let nine_digits = parse_decimal("1.23456789e-1").expect("must parse");
        assert_eq!(fractional_digits(nine_digits), 9);
    }

    #[test]
    fn render_truncates_and_strips() {
        assert_eq!(render_fixed(dec!(1.999999999)), "1.99999999");
        assert_eq!(render_fixed(dec!(-1.999999999)), "-1.99999999");
        assert_eq!(render_fixed(dec!(5.10000000)), "5.1");
        assert_eq!(render_fixed(dec!(7.000)), "7");
        assert_eq!(render_fixed(dec!(0)), "0");
    }
}
