//! # Amounts & Unit Conversion
//!
//! All ledger amounts are 256-bit unsigned integers in the token's smallest
//! unit. The `decimals` metadata exists for humans only: the ledger never
//! divides. This module converts between the two representations the way
//! wallet tooling does (`parseUnits` / `formatUnits`), with every step
//! checked so a typo can't silently wrap.

use primitive_types::U256;
use thiserror::Error;

/// A token amount in smallest units.
pub type Amount = U256;

/// Errors produced by unit conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    /// The input string was empty.
    #[error("empty amount")]
    Empty,

    /// The input contained something other than digits and one decimal point.
    #[error("invalid amount: {0:?}")]
    InvalidDigit(String),

    /// More fractional digits than the token has decimals.
    #[error("too many decimal places: {found} > {decimals}")]
    TooManyDecimals {
        /// Fractional digits supplied.
        found: usize,
        /// Decimals supported by the token.
        decimals: u8,
    },

    /// The value does not fit in 256 bits.
    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Multiplies `value` by `10^decimals`, checked.
pub fn scale(value: Amount, decimals: u8) -> Result<Amount, UnitsError> {
    let ten = Amount::from(10u8);
    (0..decimals).try_fold(value, |acc, _| acc.checked_mul(ten).ok_or(UnitsError::Overflow))
}

/// Parses a human-readable amount like `"1000"` or `"0.25"` into smallest
/// units for a token with `decimals` places.
///
/// Underscores are accepted as digit separators.
pub fn parse_units(input: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::InvalidDigit(input.to_string()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::InvalidDigit(input.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            found: fraction.len(),
            decimals,
        });
    }

    let whole_value = parse_decimal(whole)?;
    let fraction_value = parse_decimal(fraction)?;
    // fraction.len() <= decimals <= u8::MAX
    let fraction_scale = decimals - fraction.len() as u8;

    scale(whole_value, decimals)?
        .checked_add(scale(fraction_value, fraction_scale)?)
        .ok_or(UnitsError::Overflow)
}

/// Renders a smallest-unit amount with `decimals` places, trimming trailing
/// zeros from the fraction (`1500000000000000000` at 18 → `"1.5"`).
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Parses an amount written either in decimal or as `0x`-prefixed hex.
pub fn parse_raw(input: &str) -> Result<Amount, UnitsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    match trimmed.strip_prefix("0x") {
        Some(hex) => Amount::from_str_radix(hex, 16)
            .map_err(|_| UnitsError::InvalidDigit(input.to_string())),
        None => parse_decimal(trimmed),
    }
}

fn parse_decimal(digits: &str) -> Result<Amount, UnitsError> {
    if digits.is_empty() {
        return Ok(Amount::zero());
    }
    let ten = Amount::from(10u8);
    digits.chars().try_fold(Amount::zero(), |acc, c| {
        let digit = c
            .to_digit(10)
            .ok_or_else(|| UnitsError::InvalidDigit(digits.to_string()))?;
        acc.checked_mul(ten)
            .and_then(|v| v.checked_add(Amount::from(digit)))
            .ok_or(UnitsError::Overflow)
    })
}

/// Serde helper: amounts as decimal strings.
///
/// JSON numbers cap out at 64 bits in most consumers, so amounts travel as
/// strings. Deserialization also accepts `0x` hex strings and plain JSON
/// integers.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Payment {
///     #[serde(with = "crate::units::serde_amount")]
///     value: Amount,
/// }
/// ```
pub mod serde_amount {
    use super::{parse_raw, Amount};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(s) => parse_raw(&s).map_err(serde::de::Error::custom),
            RawAmount::Number(n) => Ok(Amount::from(n)),
        }
    }
}
