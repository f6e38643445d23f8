//! Prices in whole Colombian pesos.
//!
//! The shop only sells in COP and never shows cents, so a price is a plain
//! non-negative integer. Display follows the es-CO currency format used on the
//! product cards: `$ 15.000`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a whole number.
    #[error("price must be a whole number of pesos")]
    NotANumber,
    /// The input is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A price in whole COP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero pesos.
    pub const ZERO: Self = Self(0);

    /// Create a price from whole pesos, clamping negatives to zero.
    #[must_use]
    pub const fn from_pesos(pesos: i64) -> Self {
        if pesos < 0 { Self(0) } else { Self(pesos) }
    }

    /// Whole pesos.
    #[must_use]
    pub const fn pesos(self) -> i64 {
        self.0
    }

    /// Parse a price from a form field. Blank input is zero.
    ///
    /// Thousands separators (`.`/`,`), a leading `$` and spaces are ignored so
    /// `"$ 15.000"` and `"15000"` parse the same.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] for non-numeric or negative input.
    pub fn parse_form(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| !matches!(c, '.' | ',' | ' '))
            .collect();
        if cleaned.is_empty() {
            return Ok(Self::ZERO);
        }
        let value: i64 = cleaned.parse().map_err(|_| PriceError::NotANumber)?;
        if value < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Self(value))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "$ {grouped}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_pesos(0).to_string(), "$ 0");
        assert_eq!(Price::from_pesos(950).to_string(), "$ 950");
        assert_eq!(Price::from_pesos(15_000).to_string(), "$ 15.000");
        assert_eq!(Price::from_pesos(1_250_000).to_string(), "$ 1.250.000");
    }

    #[test]
    fn test_parse_form_accepts_formatted_input() {
        assert_eq!(Price::parse_form("$ 15.000").unwrap(), Price::from_pesos(15_000));
        assert_eq!(Price::parse_form("42000").unwrap(), Price::from_pesos(42_000));
        assert_eq!(Price::parse_form("").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_form_rejects_bad_input() {
        assert_eq!(Price::parse_form("doce"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse_form("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_from_pesos_clamps_negative() {
        assert_eq!(Price::from_pesos(-10), Price::ZERO);
    }
}
