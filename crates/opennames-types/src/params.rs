//! Governance-controlled module parameters.
//!
//! `Params` is stored as one record and mutated only through governance.
//! It is validated as a whole and per-section; an update that fails any
//! rule is rejected before it touches the store.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Coin, NamesError, Result, constants};

// ---------------------------------------------------------------------------
// EpochIdentifier
// ---------------------------------------------------------------------------

/// The closed set of epoch period names the host scheduler can deliver.
///
/// Modeled as an enum rather than a free string so an invalid hook
/// configuration cannot be represented at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochIdentifier {
    Hour,
    Day,
    Week,
}

impl fmt::Display for EpochIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
        }
    }
}

impl std::str::FromStr for EpochIdentifier {
    type Err = NamesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(NamesError::InvalidParams {
                reason: format!("unknown epoch identifier {other:?}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// PriceParams
// ---------------------------------------------------------------------------

/// Tiered registration pricing by name length, plus the yearly extension
/// price. Invariant: `1-letter > 2-letter > 3-letter > 4-letter >
/// 5+-letter ≥ extension`, all positive, one denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceParams {
    /// The single denom every price in the module is quoted in.
    pub price_denom: String,
    pub price_1_letter: Decimal,
    pub price_2_letters: Decimal,
    pub price_3_letters: Decimal,
    pub price_4_letters: Decimal,
    pub price_5_plus_letters: Decimal,
    /// Price of extending a registration by one year.
    pub price_extends: Decimal,
}

impl Default for PriceParams {
    fn default() -> Self {
        Self {
            price_denom: constants::DEFAULT_PRICE_DENOM.to_string(),
            price_1_letter: Decimal::new(100_000, 0),
            price_2_letters: Decimal::new(25_000, 0),
            price_3_letters: Decimal::new(10_000, 0),
            price_4_letters: Decimal::new(2_500, 0),
            price_5_plus_letters: Decimal::new(500, 0),
            price_extends: Decimal::new(500, 0),
        }
    }
}

impl PriceParams {
    /// First-year registration price for a name of the given length.
    #[must_use]
    pub fn first_year_price(&self, name_len: usize) -> Coin {
        let amount = match name_len {
            0 | 1 => self.price_1_letter,
            2 => self.price_2_letters,
            3 => self.price_3_letters,
            4 => self.price_4_letters,
            _ => self.price_5_plus_letters,
        };
        Coin::new(self.price_denom.clone(), amount)
    }

    /// Price of one extension year.
    #[must_use]
    pub fn extension_price(&self) -> Coin {
        Coin::new(self.price_denom.clone(), self.price_extends)
    }

    /// Validate positivity, denom, and the strict tier ordering.
    pub fn validate(&self) -> Result<()> {
        if !Coin::is_valid_denom(&self.price_denom) {
            return Err(NamesError::InvalidParams {
                reason: format!("malformed price denom {:?}", self.price_denom),
            });
        }
        let tiers = [
            ("1-letter", self.price_1_letter),
            ("2-letters", self.price_2_letters),
            ("3-letters", self.price_3_letters),
            ("4-letters", self.price_4_letters),
            ("5+-letters", self.price_5_plus_letters),
            ("extends", self.price_extends),
        ];
        for (label, amount) in tiers {
            if amount <= Decimal::ZERO {
                return Err(NamesError::PriceTierViolation {
                    reason: format!("{label} price must be positive, got {amount}"),
                });
            }
        }
        // Strictly decreasing down to 5+, which must be ≥ the extension price.
        for pair in tiers[..5].windows(2) {
            let (hi_label, hi) = pair[0];
            let (lo_label, lo) = pair[1];
            if hi <= lo {
                return Err(NamesError::PriceTierViolation {
                    reason: format!("{hi_label} price {hi} must exceed {lo_label} price {lo}"),
                });
            }
        }
        if self.price_5_plus_letters < self.price_extends {
            return Err(NamesError::PriceTierViolation {
                reason: format!(
                    "5+-letters price {} must be at least the extension price {}",
                    self.price_5_plus_letters, self.price_extends
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChainsParams
// ---------------------------------------------------------------------------

/// A chain id and the aliases that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasesOfChain {
    pub chain_id: String,
    pub aliases: Vec<String>,
}

/// Multi-chain knowledge: alias mappings and the coin-type-60 allowlist
/// (chains whose addresses are hex, not bech32).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainsParams {
    pub aliases_of_chains: Vec<AliasesOfChain>,
    pub coin_type_60_chain_ids: Vec<String>,
}

impl ChainsParams {
    /// Validate chain-id syntax and global uniqueness of chain ids and
    /// aliases (an alias may not collide with another alias or chain id).
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.aliases_of_chains {
            if !crate::name::is_valid_chain_id(&entry.chain_id) {
                return Err(NamesError::InvalidParams {
                    reason: format!("malformed chain id {:?}", entry.chain_id),
                });
            }
            if !seen.insert(entry.chain_id.clone()) {
                return Err(NamesError::InvalidParams {
                    reason: format!("duplicate chain id {:?}", entry.chain_id),
                });
            }
            for alias in &entry.aliases {
                if !crate::name::is_valid_name_component(alias) {
                    return Err(NamesError::InvalidParams {
                        reason: format!("malformed alias {alias:?}"),
                    });
                }
                if !seen.insert(alias.clone()) {
                    return Err(NamesError::InvalidParams {
                        reason: format!("alias {alias:?} collides with another alias or chain id"),
                    });
                }
            }
        }
        let mut coin60 = std::collections::HashSet::new();
        for chain_id in &self.coin_type_60_chain_ids {
            if !crate::name::is_valid_chain_id(chain_id) {
                return Err(NamesError::InvalidParams {
                    reason: format!("malformed coin-type-60 chain id {chain_id:?}"),
                });
            }
            if !coin60.insert(chain_id) {
                return Err(NamesError::InvalidParams {
                    reason: format!("duplicate coin-type-60 chain id {chain_id:?}"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MiscParams
// ---------------------------------------------------------------------------

/// Scheduling and duration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscParams {
    /// Epoch whose begin hook runs the expiry/prune cycle.
    pub begin_epoch_hook_identifier: EpochIdentifier,
    /// Epoch whose end hook runs the expiry/prune cycle.
    pub end_epoch_hook_identifier: EpochIdentifier,
    /// Days an expired name can still be renewed by its owner.
    pub grace_period_days: u32,
    /// Days a sell order stays open. Must be ≥ 1.
    pub days_sell_order_duration: u32,
    /// Days a closed sell order is preserved in history. Must be ≥ 1.
    pub days_preserved_closed_sell_order: u32,
    /// A name expiring within this many days cannot be listed. Must be ≥ 7.
    pub days_prohibit_sell: u32,
}

impl Default for MiscParams {
    fn default() -> Self {
        Self {
            begin_epoch_hook_identifier: EpochIdentifier::Hour,
            end_epoch_hook_identifier: EpochIdentifier::Hour,
            grace_period_days: constants::DEFAULT_GRACE_PERIOD_DAYS,
            days_sell_order_duration: constants::DEFAULT_SELL_ORDER_DURATION_DAYS,
            days_preserved_closed_sell_order: constants::DEFAULT_PRESERVED_CLOSED_ORDER_DAYS,
            days_prohibit_sell: constants::DEFAULT_PROHIBIT_SELL_DAYS,
        }
    }
}

impl MiscParams {
    pub fn validate(&self) -> Result<()> {
        if self.days_sell_order_duration < 1 {
            return Err(NamesError::InvalidParams {
                reason: "sell order duration must be at least 1 day".to_string(),
            });
        }
        if self.days_preserved_closed_sell_order < 1 {
            return Err(NamesError::InvalidParams {
                reason: "closed-order preservation must be at least 1 day".to_string(),
            });
        }
        if self.days_prohibit_sell < 7 {
            return Err(NamesError::InvalidParams {
                reason: "prohibit-sell window must be at least 7 days".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// The whole governance-controlled parameter record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub price: PriceParams,
    pub chains: ChainsParams,
    pub misc: MiscParams,
}

impl Params {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.price.validate()?;
        self.chains.validate()?;
        self.misc.validate()
    }
}
