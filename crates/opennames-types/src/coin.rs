//! Coin type for prices, bids, and escrowed amounts.
//!
//! All monetary values in the module share one shape: a denom string and a
//! positive `Decimal` amount. The balance/escrow primitives live with the
//! bank collaborator; this type only carries value and validates itself.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{NamesError, Result};

/// A denominated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denom, e.g. `"uopen"`. Lowercase, starts with a letter, 3–16 chars.
    pub denom: String,
    /// Amount. Must be strictly positive wherever a `Coin` is required.
    pub amount: Decimal,
}

impl Coin {
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Whether `denom` is a well-formed denomination string.
    #[must_use]
    pub fn is_valid_denom(denom: &str) -> bool {
        let len_ok = (3..=16).contains(&denom.len());
        let head_ok = denom.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        let body_ok = denom
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        len_ok && head_ok && body_ok
    }

    /// Validate the coin: well-formed denom, strictly positive amount.
    ///
    /// # Errors
    /// Returns [`NamesError::InvalidCoin`] on a malformed denom or a zero
    /// or negative amount.
    pub fn validate(&self) -> Result<()> {
        if !Self::is_valid_denom(&self.denom) {
            return Err(NamesError::InvalidCoin {
                reason: format!("malformed denom {:?}", self.denom),
            });
        }
        if self.amount <= Decimal::ZERO {
            return Err(NamesError::InvalidCoin {
                reason: format!("non-positive amount {}", self.amount),
            });
        }
        Ok(())
    }

    /// Validate that `other` is a valid coin in the same denom as `self`.
    ///
    /// # Errors
    /// Returns [`NamesError::DenomMismatch`] if the denoms differ, or the
    /// underlying validation error from [`Coin::validate`].
    pub fn validate_same_denom(&self, other: &Self) -> Result<()> {
        other.validate()?;
        if self.denom != other.denom {
            return Err(NamesError::DenomMismatch {
                expected: self.denom.clone(),
                got: other.denom.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
