//! # Product Prices
//!
//! Prices are decimals with two places and at most ten digits in total,
//! never negative. They are kept as integer cents.
//!
//! ```text
//!   "12.50"        →  1250 cents
//!   "0.99"         →    99 cents
//!   "99999999.99"  →  9_999_999_999 cents  (largest)
//!   "-1" / "1.999" →  rejected
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::{validate_price_cents, ValidationResult};

/// A product price in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(i64);

impl Price {
    /// Wraps a cent amount, checking the price range.
    ///
    /// ```rust
    /// use almacen_core::price::Price;
    ///
    /// assert_eq!(Price::from_cents(1099).unwrap().to_string(), "10.99");
    /// assert!(Price::from_cents(-1).is_err());
    /// ```
    pub fn from_cents(cents: i64) -> ValidationResult<Self> {
        validate_price_cents(cents)?;
        Ok(Price(cents))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }
}

/// Parses decimal text such as `"45.9"` or `"45.90"`.
///
/// ```rust
/// use almacen_core::price::Price;
///
/// assert_eq!("12".parse::<Price>().unwrap().cents(), 1200);
/// assert_eq!("12.5".parse::<Price>().unwrap().cents(), 1250);
/// assert!("12.505".parse::<Price>().is_err());
/// assert!("-3".parse::<Price>().is_err());
/// ```
impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::invalid_format("price", reason);

        let (whole, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a non-negative decimal number"));
        }
        if s.contains('.') && frac.is_empty() {
            return Err(invalid("missing digits after decimal point"));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("at most 2 decimal places"));
        }

        let units: i64 = whole.parse().map_err(|_| invalid("too many digits"))?;
        let frac_cents = match frac.len() {
            0 => 0,
            1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| invalid("too many digits"))?;

        Price::from_cents(cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
