use lazy_static::lazy_static;
use num_bigint::BigUint;
use regex::Regex;

use crate::error::LiteralError;
use crate::value::Value;

lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"^[0-9][0-9_]*$").unwrap();
    static ref SIZED_RE: Regex = Regex::new(r"^([0-9]+)'([bBhHdD])([0-9a-fA-F_]*)$").unwrap();
}

/// Parses a numeral: a bare decimal (`42`) or a sized literal (`8'hFF`).
///
/// A bare decimal is as wide as it needs to be, and one bit wide for `0`.
/// A sized literal is masked to its declared width.
pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
    let text = text.trim();

    if DECIMAL_RE.is_match(text) {
        let digits = text.replace('_', "");
        let n = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| LiteralError::Invalid(text.to_string()))?;
        let width = n.bits().max(1);
        return Ok(Value::new(width, n));
    }

    let captures = SIZED_RE.captures(text).ok_or_else(|| LiteralError::Invalid(text.to_string()))?;
    let width: u64 = captures[1].parse().map_err(|_| LiteralError::Invalid(text.to_string()))?;
    if width == 0 {
        return Err(LiteralError::ZeroWidth(text.to_string()));
    }

    let base = captures[2].chars().next().unwrap_or('d').to_ascii_lowercase();
    let radix = match base {
        'b' => 2,
        'h' => 16,
        _ => 10,
    };

    let digits = captures[3].replace('_', "");
    let bad_digits = || LiteralError::BadDigits { literal: text.to_string(), base };
    if digits.is_empty() {
        return Err(bad_digits());
    }
    let n = BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(bad_digits)?;
    Ok(Value::new(width, n))
}
