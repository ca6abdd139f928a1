//! Identifiers used throughout OpenNames.
//!
//! Unlike randomly-assigned identifiers, everything here is deterministic:
//! names are their own identity, offer ids are a type prefix plus a
//! monotonic sequence assigned by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NamesError, Result};

// ---------------------------------------------------------------------------
// Addr
// ---------------------------------------------------------------------------

/// Bech32 data-part charset (no `1`, `b`, `i`, `o`).
const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// A bech32-style account address.
///
/// The module never derives keys or verifies signatures — it only needs
/// addresses to be syntactically well-formed and comparable, so validation
/// is purely structural: `hrp` + `1` separator + data part in the bech32
/// charset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Addr(String);

impl Addr {
    /// Validate and wrap an address string.
    ///
    /// # Errors
    /// Returns [`NamesError::InvalidAddress`] if the string is not a
    /// well-formed bech32-style address.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() < 8 || s.len() > 90 {
            return Err(NamesError::InvalidAddress(s.to_string()));
        }
        if s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(NamesError::InvalidAddress(s.to_string()));
        }
        // Last '1' is the hrp/data separator.
        let Some(sep) = s.rfind('1') else {
            return Err(NamesError::InvalidAddress(s.to_string()));
        };
        let (hrp, data) = (&s[..sep], &s[sep + 1..]);
        if hrp.is_empty() || hrp.len() > 16 || data.len() < 6 {
            return Err(NamesError::InvalidAddress(s.to_string()));
        }
        if !hrp.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(NamesError::InvalidAddress(s.to_string()));
        }
        if !data.chars().all(|c| BECH32_CHARSET.contains(c)) {
            return Err(NamesError::InvalidAddress(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Addr {
    /// Build a valid dummy address from a short tag, e.g. `Addr::dummy("alice")`.
    #[must_use]
    pub fn dummy(tag: &str) -> Self {
        // Map the tag into the bech32 charset so any tag yields a valid address.
        let data: String = tag
            .bytes()
            .map(|b| {
                let charset = BECH32_CHARSET.as_bytes();
                charset[(b as usize) % charset.len()] as char
            })
            .chain("qqqqqq".chars())
            .collect();
        Self(format!("open1{data}"))
    }
}

// ---------------------------------------------------------------------------
// AssetKind
// ---------------------------------------------------------------------------

/// The kind of goods a sell order or buy offer is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AssetKind {
    /// A registered name record.
    Name,
    /// A chain alias.
    Alias,
}

impl AssetKind {
    /// The single-character offer-id prefix for this kind.
    #[must_use]
    pub fn offer_prefix(self) -> char {
        match self {
            Self::Name => '1',
            Self::Alias => '2',
        }
    }

    /// Resolve a kind from an offer-id prefix character.
    #[must_use]
    pub fn from_offer_prefix(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Name),
            '2' => Some(Self::Alias),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "NAME"),
            Self::Alias => write!(f, "ALIAS"),
        }
    }
}

// ---------------------------------------------------------------------------
// OfferId
// ---------------------------------------------------------------------------

/// Identifier of a buy offer: a kind prefix plus a monotonic sequence.
///
/// Rendered as `<prefix><sequence>` — e.g. the 7th name offer is `17`,
/// the 3rd alias offer is `23`. The sequence counter is global across
/// kinds and assigned by the store, so ids never collide or repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OfferId {
    pub kind: AssetKind,
    pub sequence: u64,
}

impl OfferId {
    #[must_use]
    pub fn new(kind: AssetKind, sequence: u64) -> Self {
        Self { kind, sequence }
    }

    /// Parse an offer id back from its string form.
    ///
    /// # Errors
    /// Returns [`NamesError::MalformedOfferId`] on an unknown prefix or a
    /// non-numeric sequence.
    pub fn parse(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(AssetKind::from_offer_prefix)
            .ok_or_else(|| NamesError::MalformedOfferId(s.to_string()))?;
        let sequence: u64 = chars
            .as_str()
            .parse()
            .map_err(|_| NamesError::MalformedOfferId(s.to_string()))?;
        Ok(Self { kind, sequence })
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.offer_prefix(), self.sequence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
