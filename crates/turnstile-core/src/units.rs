//! Decimal amount conversion
//!
//! Converts between human-readable decimal strings and the integer
//! base-unit representation used on-chain. All arithmetic is exact
//! integer math scaled by `10^decimals`; floating point is never used,
//! so the on-chain amount always matches what the user was shown.

use alloy_primitives::U256;

use crate::errors::UnitError;

/// `10^decimals` as a U256; `None` when it exceeds 256 bits
fn pow10(decimals: usize) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Convert a decimal string (e.g. `"0.01"`) to base units.
///
/// Fractional digits beyond `decimals` are rejected unless they are all
/// zeros: silently rounding would submit an amount different from what
/// the caller displayed.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, UnitError> {
    let invalid = || UnitError::InvalidAmount {
        amount: amount.to_string(),
    };

    let trimmed = amount.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let scale = decimals as usize;
    let (frac_kept, frac_excess) = if frac_part.len() > scale {
        frac_part.split_at(scale)
    } else {
        (frac_part, "")
    };
    if frac_excess.bytes().any(|b| b != b'0') {
        return Err(UnitError::ExcessPrecision {
            amount: amount.to_string(),
            decimals,
        });
    }

    let overflow = || UnitError::Overflow {
        amount: amount.to_string(),
        decimals,
    };

    let int_units = parse_digits(int_part)
        .and_then(|v| v.checked_mul(pow10(scale)?))
        .ok_or_else(overflow)?;

    // The kept fraction is right-padded to `decimals` digits, i.e. scaled
    // by 10^(decimals - len)
    let frac_units = parse_digits(frac_kept)
        .and_then(|v| v.checked_mul(pow10(scale - frac_kept.len())?))
        .ok_or_else(overflow)?;

    int_units.checked_add(frac_units).ok_or_else(overflow)
}

/// Render base units as a decimal string, trailing zeros trimmed
/// (`10000000000000000` at 18 decimals becomes `"0.01"`).
pub fn from_base_units(value: U256, decimals: u8) -> String {
    if decimals == 0 || value.is_zero() {
        return value.to_string();
    }

    let scale = match pow10(decimals as usize) {
        Some(scale) => scale,
        // More decimals than 256 bits can ever carry: the value is all
        // fraction
        None => {
            let frac = format!("{:0>width$}", value.to_string(), width = decimals as usize);
            return format!("0.{}", frac.trim_end_matches('0'));
        }
    };
    let int_part = value / scale;
    let frac_part = value % scale;

    if frac_part.is_zero() {
        return int_part.to_string();
    }

    let frac = format!("{:0>width$}", frac_part.to_string(), width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}

/// Parse an all-digit string (possibly empty, meaning zero) into a U256
fn parse_digits(digits: &str) -> Option<U256> {
    let mut value = U256::ZERO;
    let ten = U256::from(10u64);
    for b in digits.bytes() {
        value = value
            .checked_mul(ten)?
            .checked_add(U256::from((b - b'0') as u64))?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_price_to_wei() {
        // 0.01 ether = 10^16 wei
        assert_eq!(
            to_base_units("0.01", 18).unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
    }

    #[test]
    fn six_decimal_token_price() {
        assert_eq!(to_base_units("5.00", 6).unwrap(), U256::from(5_000_000u64));
        assert_eq!(to_base_units("5", 6).unwrap(), U256::from(5_000_000u64));
    }

    #[test]
    fn bare_fraction_and_trailing_dot() {
        assert_eq!(to_base_units(".5", 2).unwrap(), U256::from(50u64));
        assert_eq!(to_base_units("5.", 2).unwrap(), U256::from(500u64));
    }

    #[test]
    fn zero_decimal_token() {
        assert_eq!(to_base_units("42", 0).unwrap(), U256::from(42u64));
        assert_eq!(from_base_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn excess_fractional_digits_rejected() {
        let err = to_base_units("1.0000001", 6).unwrap_err();
        assert!(matches!(err, UnitError::ExcessPrecision { decimals: 6, .. }));

        // All-zero excess digits are harmless
        assert_eq!(to_base_units("1.0000000", 6).unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn malformed_amounts_rejected() {
        for bad in ["", ".", "-1", "1e18", "1,5", "0x10", "1.2.3"] {
            assert!(
                to_base_units(bad, 18).is_err(),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn overflow_rejected() {
        // 10^78 does not fit in 256 bits
        let huge = format!("1{}", "0".repeat(78));
        assert!(matches!(
            to_base_units(&huge, 0).unwrap_err(),
            UnitError::Overflow { .. }
        ));
        assert!(matches!(
            to_base_units("1", 78).unwrap_err(),
            UnitError::Overflow { .. }
        ));
    }

    #[test]
    fn formatting_trims_trailing_zeros() {
        assert_eq!(
            from_base_units(U256::from(10_000_000_000_000_000u64), 18),
            "0.01"
        );
        assert_eq!(from_base_units(U256::from(5_000_000u64), 6), "5");
        assert_eq!(from_base_units(U256::from(5_100_000u64), 6), "5.1");
        assert_eq!(from_base_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn round_trip_preserves_base_units() {
        for (amount, decimals) in [
            ("0.01", 18u8),
            ("5.00", 6),
            ("123456.789", 9),
            ("0.000000000000000001", 18),
        ] {
            let raw = to_base_units(amount, decimals).unwrap();
            let rendered = from_base_units(raw, decimals);
            assert_eq!(to_base_units(&rendered, decimals).unwrap(), raw);
        }
    }
}
