//! Numeric cleanup for statement amounts.
//!
//! CAMS renders negatives in accounting style and groups thousands:
//!   "1,234.56"    -> 1234.56
//!   "(1,234.56)"  -> -1234.56

use thiserror::Error;

#[derive(Debug, Error)]
#[error("`{0}` is not numeric after cleanup")]
pub struct NumericError(pub String);

/// Strip thousands separators and rewrite accounting parentheses as a sign.
/// Must run before float coercion.
pub fn clean_numeric_text(s: &str) -> String {
    s.trim()
        .replace(',', "")
        .replace('(', "-")
        .replace(')', "")
}

/// Coerce a cleaned numeric string to a float.
///
/// Residual non-numeric content means a malformed statement line; that is
/// surfaced as an error rather than silently coerced to zero.
pub fn to_decimal(s: &str) -> Result<f64, NumericError> {
    let cleaned = clean_numeric_text(s);
    cleaned
        .parse::<f64>()
        .map_err(|_| NumericError(s.trim().to_string()))
}
