use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{AmountError, AmountResult};

/// Decimals used by every coin this escrow deals in
pub const DEFAULT_DECIMALS: u8 = 9;

/// Largest scale whose power of ten still fits a u64
pub const MAX_DECIMALS: u8 = 18;

fn scale_factor(decimals: u8) -> AmountResult<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Ok(Decimal::from(10_u64.pow(decimals as u32)))
}

/// Convert ledger units to display units (e.g. 1_000_000_000 with 9 decimals = 1.0)
///
/// Exact: the raw integer becomes the mantissa and `decimals` the scale.
pub fn to_display(raw: u64, decimals: u8) -> AmountResult<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    let value = Decimal::try_from_i128_with_scale(raw as i128, decimals as u32)?;
    Ok(value.normalize())
}

/// Convert display units to ledger units, truncating below the smallest unit.
///
/// The result is the amount actually submitted to the ledger, so the whole
/// computation stays in fixed point.
pub fn to_raw(display: Decimal, decimals: u8) -> AmountResult<u64> {
    if display < Decimal::ZERO {
        return Err(AmountError::InvalidAmount(format!(
            "negative amount {}",
            display
        )));
    }

    // Truncate first so the product stays within Decimal's exact range
    let scaled = display
        .trunc_with_scale(decimals as u32)
        .checked_mul(scale_factor(decimals)?)
        .ok_or_else(|| AmountError::InvalidAmount(format!("{} overflows", display)))?;

    scaled
        .floor()
        .to_u64()
        .ok_or_else(|| AmountError::InvalidAmount(format!("{} exceeds u64 range", display)))
}

/// Significant digits a `Decimal` holds without rounding
const DECIMAL_DIGITS: usize = 28;

/// Parse a user-entered display amount such as "1.5".
///
/// Fractional digits that cannot matter (beyond `MAX_DECIMALS`) or that would
/// make `Decimal` round are dropped before parsing, so the value never rounds up.
pub fn parse_display(input: &str) -> AmountResult<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::InvalidAmount("empty amount".to_string()));
    }

    let invalid = || AmountError::InvalidAmount(format!("'{}' is not a decimal number", trimmed));
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let int_part = int_part.trim_start_matches('0');
    if int_part.len() > DECIMAL_DIGITS {
        return Err(AmountError::InvalidAmount(format!("{} is out of range", trimmed)));
    }
    let keep = frac_part
        .len()
        .min(MAX_DECIMALS as usize)
        .min(DECIMAL_DIGITS - int_part.len());

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let normalized = if keep == 0 {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, &frac_part[..keep])
    };
    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;

    if negative && !value.is_zero() {
        return Err(AmountError::InvalidAmount(format!(
            "negative amount {}",
            trimmed
        )));
    }

    Ok(value)
}

/// Convert a float coming from a host UI. Non-finite values are rejected, not clamped.
pub fn to_raw_f64(display: f64, decimals: u8) -> AmountResult<u64> {
    if !display.is_finite() {
        return Err(AmountError::InvalidAmount(format!(
            "non-finite amount {}",
            display
        )));
    }

    // Go through the shortest decimal rendering so 0.1 stays 0.1
    let value = Decimal::from_str(&display.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(display))
        .ok_or_else(|| AmountError::InvalidAmount(format!("{} is out of range", display)))?;

    to_raw(value, decimals)
}

/// Read an on-chain u64, which JSON-RPC encodes as a string
pub fn parse_raw(value: &serde_json::Value) -> AmountResult<u64> {
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| AmountError::InvalidAmount(format!("'{}' is not a u64", s))),
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AmountError::InvalidAmount(format!("{} is not a u64", n))),
        other => Err(AmountError::InvalidAmount(format!(
            "unexpected amount value {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_to_display() {
        assert_eq!(to_display(5_000_000_000, 9).unwrap(), dec!(5.0));
        assert_eq!(to_display(1, 9).unwrap(), dec!(0.000000001));
        assert_eq!(to_display(0, 9).unwrap(), Decimal::ZERO);
        assert_eq!(to_display(1_500_000_000, 9).unwrap().to_string(), "1.5");
    }

    #[test]
    fn test_round_trip_is_exact() {
        for raw in [0, 1, 7, 999_999_999, 1_000_000_000, 123_456_789_012, u64::MAX] {
            let display = to_display(raw, DEFAULT_DECIMALS).unwrap();
            assert_eq!(to_raw(display, DEFAULT_DECIMALS).unwrap(), raw);
        }
    }

    #[test]
    fn test_to_raw_truncates() {
        assert_eq!(to_raw(dec!(1.0000000019), 9).unwrap(), 1_000_000_001);
        assert_eq!(to_raw(dec!(0.1), 9).unwrap(), 100_000_000);
    }

    #[test]
    fn test_rejects_negative_and_non_finite() {
        assert!(matches!(
            to_raw(dec!(-1), 9),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_raw_f64(f64::NAN, 9),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_raw_f64(f64::INFINITY, 9),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_raw_f64(-0.5, 9),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_display("-3"),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_display("abc"),
            Err(AmountError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_float_input_has_no_drift() {
        assert_eq!(to_raw_f64(0.3, 9).unwrap(), 300_000_000);
        assert_eq!(to_raw_f64(1.1, 9).unwrap(), 1_100_000_000);
    }

    #[test]
    fn test_overflow_and_decimals_limit() {
        assert!(to_raw(dec!(100_000_000_000), 9).is_err());
        assert_eq!(
            to_display(1, 19),
            Err(AmountError::UnsupportedDecimals(19))
        );
    }

    #[test]
    fn test_parse_display_never_rounds_up() {
        let nines = parse_display("0.99999999999999999999999999999").unwrap();
        assert_eq!(nines, dec!(0.999999999999999999));
        assert_eq!(to_raw(nines, 9).unwrap(), 999_999_999);

        assert_eq!(parse_display(" 1.5 ").unwrap(), dec!(1.5));
        assert_eq!(parse_display(".25").unwrap(), dec!(0.25));
        assert_eq!(parse_display("7.").unwrap(), dec!(7));
        assert_eq!(parse_display("-0").unwrap(), Decimal::ZERO);
        assert!(parse_display(".").is_err());
        assert!(parse_display("1e5").is_err());
        assert!(parse_display("1.2.3").is_err());
        assert!(parse_display(&"9".repeat(29)).is_err());
    }

    #[test]
    fn test_to_raw_at_u64_boundary() {
        assert_eq!(to_raw(dec!(18446744073.709551615999), 9).unwrap(), u64::MAX);

        let typed = parse_display("18446744073.7095516159999999999").unwrap();
        assert_eq!(to_raw(typed, 9).unwrap(), u64::MAX);
        assert!(to_raw(dec!(18446744073.709551616), 9).is_err());
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(parse_raw(&json!("5000000000")).unwrap(), 5_000_000_000);
        assert_eq!(parse_raw(&json!(42)).unwrap(), 42);
        assert!(parse_raw(&json!("-1")).is_err());
        assert!(parse_raw(&json!(null)).is_err());
    }
}
