//! The name record — the asset everything else in the module trades.
//!
//! A record carries an owner (may sell / transfer), a controller (may edit
//! resolution configs), an expiry, and an ordered set of multi-chain
//! resolution configs unique by `(kind, chain_id, path)`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Addr, NamesError, Result};

/// Maximum length of a name or of a single path segment.
pub const MAX_NAME_LEN: usize = 20;

/// Whether `s` is a well-formed name component: lowercase alphanumerics,
/// with single hyphens allowed between runs (`abc`, `my-name9`).
#[must_use]
pub fn is_valid_name_component(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_NAME_LEN {
        return false;
    }
    s.split('-').all(|run| {
        !run.is_empty()
            && run
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    })
}

/// What a resolution config resolves. Only address resolution exists today;
/// the enum keeps the wire format open for future kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionKind {
    /// Resolve the (sub-)name to an account address on a chain.
    Address,
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Address => write!(f, "ADDRESS"),
        }
    }
}

/// One multi-chain resolution entry of a name record.
///
/// An empty `value` is a delete marker: applying the config removes the
/// entry with the same identity instead of storing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    pub kind: ResolutionKind,
    /// Target chain id; empty means the native chain.
    #[serde(default)]
    pub chain_id: String,
    /// Optional multi-level sub-name path, dot-separated; empty for the
    /// name itself.
    #[serde(default)]
    pub path: String,
    /// Resolved value (an address for [`ResolutionKind::Address`]).
    /// Empty value = delete marker.
    #[serde(default)]
    pub value: String,
}

impl ResolutionConfig {
    /// The config's identity: lower-cased `kind|chain_id|path`.
    /// Two configs with the same identity cannot coexist on one record.
    #[must_use]
    pub fn index_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.kind.to_string().to_lowercase(),
            self.chain_id.to_lowercase(),
            self.path.to_lowercase()
        )
    }

    /// Whether this config deletes the entry with the same identity.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.value.is_empty()
    }

    /// Validate the config in isolation.
    ///
    /// # Errors
    /// Returns [`NamesError::InvalidConfig`] on a malformed chain id, path
    /// segment, or value.
    pub fn validate(&self) -> Result<()> {
        if !self.chain_id.is_empty() && !is_valid_chain_id(&self.chain_id) {
            return Err(NamesError::InvalidConfig {
                reason: format!("malformed chain id {:?}", self.chain_id),
            });
        }
        if !self.path.is_empty() {
            for segment in self.path.split('.') {
                if !is_valid_name_component(segment) {
                    return Err(NamesError::InvalidConfig {
                        reason: format!("malformed path segment {segment:?}"),
                    });
                }
            }
        }
        // Native-chain address values must themselves be valid addresses.
        if !self.value.is_empty() && self.chain_id.is_empty() {
            Addr::parse(&self.value).map_err(|_| NamesError::InvalidConfig {
                reason: format!("value {:?} is not a valid native address", self.value),
            })?;
        }
        Ok(())
    }
}

/// Whether `s` is a plausible chain id (`evmos_9001-2`, `mainnet`, ...).
#[must_use]
pub fn is_valid_chain_id(s: &str) -> bool {
    let len_ok = (1..=48).contains(&s.len());
    let chars_ok = s
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    len_ok && chars_ok && !s.starts_with('-') && !s.starts_with('_')
}

/// A registered name record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    /// The case-normalized name string. Identity of the record.
    pub name: String,
    /// May transfer, sell, and do everything the controller can.
    pub owner: Addr,
    /// May edit resolution configs. Often equal to `owner`.
    pub controller: Addr,
    /// When the registration lapses.
    pub expire_at: DateTime<Utc>,
    /// Multi-chain resolution configs, unique by [`ResolutionConfig::index_key`].
    #[serde(default)]
    pub configs: Vec<ResolutionConfig>,
}

impl NameRecord {
    /// Validate the whole record: name syntax, addresses, expiry, config
    /// uniqueness and per-config validity.
    ///
    /// # Errors
    /// Returns the first violated rule as a [`NamesError`].
    pub fn validate(&self) -> Result<()> {
        if !is_valid_name_component(&self.name) {
            return Err(NamesError::InvalidName {
                name: self.name.clone(),
                reason: "must be 1-20 lowercase alphanumerics with single hyphens".to_string(),
            });
        }
        Addr::parse(self.owner.as_str())?;
        Addr::parse(self.controller.as_str())?;
        if self.expire_at.timestamp() == 0 {
            return Err(NamesError::InvalidName {
                name: self.name.clone(),
                reason: "expiry must be set".to_string(),
            });
        }
        if self.configs.len() > crate::constants::MAX_CONFIGS_PER_NAME {
            return Err(NamesError::InvalidName {
                name: self.name.clone(),
                reason: format!(
                    "more than {} resolution configs",
                    crate::constants::MAX_CONFIGS_PER_NAME
                ),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for config in &self.configs {
            config.validate()?;
            if !seen.insert(config.index_key()) {
                return Err(NamesError::DuplicateConfig(config.index_key()));
            }
        }
        Ok(())
    }

    /// Whether the registration has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_at
    }

    /// Whether the record is past expiry but still within the renewal
    /// grace period.
    #[must_use]
    pub fn is_in_grace_period(&self, now: DateTime<Utc>, grace_days: u32) -> bool {
        self.is_expired(now) && now <= self.expire_at + Duration::days(i64::from(grace_days))
    }

    /// Apply a resolution config: upsert by identity, or remove when the
    /// config is a delete marker. Returns the replaced/removed entry.
    pub fn apply_config(&mut self, config: ResolutionConfig) -> Option<ResolutionConfig> {
        let key = config.index_key();
        let existing = self.configs.iter().position(|c| c.index_key() == key);
        match (existing, config.is_delete()) {
            (Some(i), true) => Some(self.configs.remove(i)),
            (Some(i), false) => Some(std::mem::replace(&mut self.configs[i], config)),
            (None, true) => None,
            (None, false) => {
                self.configs.push(config);
                None
            }
        }
    }

    /// All native-chain addresses this record currently resolves to,
    /// including the owner's implicit resolution when no explicit
    /// default-path config exists.
    #[must_use]
    pub fn resolved_native_addresses(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .configs
            .iter()
            .filter(|c| c.chain_id.is_empty() && !c.value.is_empty())
            .map(|c| c.value.clone())
            .collect();
        let has_default = self
            .configs
            .iter()
            .any(|c| c.chain_id.is_empty() && c.path.is_empty());
        if !has_default {
            out.push(self.owner.to_string());
        }
        out.sort();
        out.dedup();
        out
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl NameRecord {
    /// A minimal valid record owned and controlled by `owner`.
    #[must_use]
    pub fn dummy(name: &str, owner: Addr, expire_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            controller: owner.clone(),
            owner,
            expire_at,
            configs: Vec::new(),
        }
    }
}
