//! Exact decimal amount parsing.
//!
//! Raw reward records carry cumulative amounts as decimal strings,
//! sometimes in scientific notation (`"2.690822691e+27"`). They are
//! converted to integers without going through floating point.

use thiserror::Error;

use rewardtree_core::Amount;

/// Largest power of ten an amount may be scaled by. Anything above this
/// cannot fit a 32-byte leaf slot anyway.
const MAX_EXPONENT: i64 = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("negative amount")]
    Negative,

    #[error("malformed numeral")]
    Malformed,

    #[error("exponent out of range")]
    ExponentOutOfRange,

    #[error("amount is not a whole number")]
    Fractional,
}

/// Parse a non-negative decimal integer, decimal fraction or scientific
/// notation numeral into an exact integer.
///
/// The value must be whole once the exponent is applied: `"1.5e1"` is 15,
/// `"1.5"` is an error.
pub fn parse_amount(input: &str) -> Result<Amount, AmountParseError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountParseError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountParseError::Negative);
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], parse_exponent(&s[pos + 1..])?),
        None => (s, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountParseError::Malformed);
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AmountParseError::Malformed);
    }

    let digits = format!("{}{}", int_part, frac_part);
    let mut value =
        Amount::parse_bytes(digits.as_bytes(), 10).ok_or(AmountParseError::Malformed)?;
    if value == Amount::default() {
        return Ok(value);
    }

    // value = digits * 10^scale
    let scale = exponent
        .checked_sub(frac_part.len() as i64)
        .ok_or(AmountParseError::ExponentOutOfRange)?;

    if scale >= 0 {
        if scale > MAX_EXPONENT {
            return Err(AmountParseError::ExponentOutOfRange);
        }
        value *= Amount::from(10u32).pow(scale as u32);
    } else {
        // A non-zero value divided by more than its own digit count is < 1
        let shift = scale.unsigned_abs();
        if shift > digits.len() as u64 {
            return Err(AmountParseError::Fractional);
        }
        let divisor = Amount::from(10u32).pow(shift as u32);
        if &value % &divisor != Amount::default() {
            return Err(AmountParseError::Fractional);
        }
        value /= divisor;
    }

    Ok(value)
}

fn parse_exponent(s: &str) -> Result<i64, AmountParseError> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountParseError::Malformed);
    }
    s.parse::<i64>()
        .map_err(|_| AmountParseError::ExponentOutOfRange)
}
