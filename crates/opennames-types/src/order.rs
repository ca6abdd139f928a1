//! Sell-order types for the OpenNames auction engine.
//!
//! A sell order is a time-boxed auction for one goods id (a name or an
//! alias). Its lifecycle is monotonic:
//!
//! ```text
//!   ┌──────┐  bid*   ┌─────────┐  price ≥ sell_price  ┌──────────┐
//!   │ OPEN ├────────▶│ BIDDING ├─────────────────────▶│ FINISHED │
//!   └──┬───┘         └────┬────┘                      └──────────┘
//!      │   expire_at passes    │
//!      ▼                       ▼
//!   ┌─────────────────────────────┐
//!   │ EXPIRED (settled at best bid │
//!   │  or closed without transfer) │
//!   └─────────────────────────────┘
//! ```
//!
//! Finished and expired orders move into per-goods historical storage; the
//! compact [`ActiveOrdersExpiration`] index is what the epoch scheduler
//! walks so expiry never scans the full order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Addr, AssetKind, Coin, NamesError, Result};

/// A bid on a sell order. Stateless value object — the escrowed funds are
/// tracked by the bank collaborator, keyed by bidder and order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOrderBid {
    pub bidder: Addr,
    pub price: Coin,
}

impl SellOrderBid {
    /// Validate the bid in isolation: address syntax and positive coin.
    pub fn validate(&self) -> Result<()> {
        Addr::parse(self.bidder.as_str())?;
        self.price.validate().map_err(|e| NamesError::InvalidBid {
            reason: e.to_string(),
        })
    }
}

/// A time-boxed auction listing for one goods id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOrder {
    /// The name or alias under auction.
    pub goods_id: String,
    /// What kind of goods this order sells.
    pub kind: AssetKind,
    /// When the auction closes. `(goods_id, expire_at)` is the order's
    /// identity within historical storage.
    pub expire_at: DateTime<Utc>,
    /// Lowest acceptable bid.
    pub min_price: Coin,
    /// Optional instant-buy price. A bid reaching it finishes the order
    /// immediately, before `expire_at`.
    pub sell_price: Option<Coin>,
    /// Highest accepted bid so far. Monotonically increasing price.
    pub highest_bid: Option<SellOrderBid>,
}

impl SellOrder {
    /// Validate price fields and the bid against them.
    ///
    /// Rules: `min_price` positive and valid; `sell_price` unset or
    /// (valid, same denom, ≥ `min_price`); `highest_bid` unset or (valid,
    /// ≥ `min_price`, and ≤ `sell_price` when one is set).
    pub fn validate(&self) -> Result<()> {
        if self.goods_id.is_empty() {
            return Err(NamesError::InvalidOrder {
                reason: "empty goods id".to_string(),
            });
        }
        if self.expire_at.timestamp() == 0 {
            return Err(NamesError::InvalidOrder {
                reason: "expiry must be set".to_string(),
            });
        }
        self.min_price.validate()?;
        if let Some(sell_price) = &self.sell_price {
            self.min_price.validate_same_denom(sell_price)?;
            if sell_price.amount < self.min_price.amount {
                return Err(NamesError::InvalidOrder {
                    reason: format!(
                        "sell price {sell_price} is below min price {}",
                        self.min_price
                    ),
                });
            }
        }
        if let Some(bid) = &self.highest_bid {
            bid.validate()?;
            self.min_price.validate_same_denom(&bid.price)?;
            if bid.price.amount < self.min_price.amount {
                return Err(NamesError::BidBelowMinimum {
                    bid: bid.price.amount,
                    min: self.min_price.amount,
                });
            }
            if let Some(sell_price) = &self.sell_price {
                if bid.price.amount > sell_price.amount {
                    return Err(NamesError::InvalidOrder {
                        reason: format!(
                            "highest bid {} exceeds sell price {sell_price}",
                            bid.price
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether the auction has passed its closing time.
    #[must_use]
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_at
    }

    /// Whether the order is finished: past `expire_at`, or instant-matched
    /// (a `sell_price` is set and the highest bid reaches it).
    #[must_use]
    pub fn has_finished(&self, now: DateTime<Utc>) -> bool {
        self.has_expired(now) || self.is_instant_matched()
    }

    /// Whether the highest bid reaches the instant-buy price.
    #[must_use]
    pub fn is_instant_matched(&self) -> bool {
        match (&self.sell_price, &self.highest_bid) {
            (Some(sell_price), Some(bid)) => bid.price.amount >= sell_price.amount,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoricalOrders
// ---------------------------------------------------------------------------

/// Append-only per-goods collection of finished sell orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalOrders {
    /// The single goods id every element shares.
    pub goods_id: String,
    pub orders: Vec<SellOrder>,
}

impl HistoricalOrders {
    #[must_use]
    pub fn new(goods_id: impl Into<String>) -> Self {
        Self {
            goods_id: goods_id.into(),
            orders: Vec::new(),
        }
    }

    /// Validate the collection: every element shares `goods_id`, and the
    /// `(goods_id, expire_at)` identities are unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for order in &self.orders {
            if order.goods_id != self.goods_id {
                return Err(NamesError::MixedGoodsHistory {
                    expected: self.goods_id.clone(),
                    got: order.goods_id.clone(),
                });
            }
            if !seen.insert(order.expire_at) {
                return Err(NamesError::DuplicateHistoricalOrder {
                    goods_id: order.goods_id.clone(),
                    expire_at: order.expire_at.timestamp(),
                });
            }
        }
        Ok(())
    }

    /// Append a finished order, enforcing the collection invariants.
    pub fn push(&mut self, order: SellOrder) -> Result<()> {
        if order.goods_id != self.goods_id {
            return Err(NamesError::MixedGoodsHistory {
                expected: self.goods_id.clone(),
                got: order.goods_id,
            });
        }
        if self.orders.iter().any(|o| o.expire_at == order.expire_at) {
            return Err(NamesError::DuplicateHistoricalOrder {
                goods_id: order.goods_id,
                expire_at: order.expire_at.timestamp(),
            });
        }
        self.orders.push(order);
        Ok(())
    }

    /// The earliest expiry among the retained orders, if any. The pruning
    /// pass keys its per-goods index off this value.
    #[must_use]
    pub fn min_expire_at(&self) -> Option<DateTime<Utc>> {
        self.orders.iter().map(|o| o.expire_at).min()
    }
}

// ---------------------------------------------------------------------------
// ActiveOrdersExpiration
// ---------------------------------------------------------------------------

/// One `(goods_id, expire_at)` entry of the active-orders index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationRecord {
    pub goods_id: String,
    pub expire_at: DateTime<Utc>,
}

/// Compact per-kind list of active orders' expiry dates. Exists solely so
/// the epoch scheduler never scans the full order store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOrdersExpiration {
    /// Records sorted by goods id, unique per goods.
    pub records: Vec<ExpirationRecord>,
}

impl ActiveOrdersExpiration {
    /// Upsert the expiry for a goods id, keeping the list sorted.
    pub fn add(&mut self, goods_id: impl Into<String>, expire_at: DateTime<Utc>) {
        let goods_id = goods_id.into();
        match self
            .records
            .binary_search_by(|r| r.goods_id.cmp(&goods_id))
        {
            Ok(i) => self.records[i].expire_at = expire_at,
            Err(i) => self.records.insert(i, ExpirationRecord { goods_id, expire_at }),
        }
    }

    /// Remove the entry for a goods id. Returns whether one existed.
    pub fn remove(&mut self, goods_id: &str) -> bool {
        match self
            .records
            .binary_search_by(|r| r.goods_id.as_str().cmp(goods_id))
        {
            Ok(i) => {
                self.records.remove(i);
                true
            }
            Err(_) => false,
        }
    }

    /// Goods ids whose orders have passed `now`.
    #[must_use]
    pub fn expired_at(&self, now: DateTime<Utc>) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| now > r.expire_at)
            .map(|r| r.goods_id.clone())
            .collect()
    }

    /// Validate sortedness and uniqueness.
    pub fn validate(&self) -> Result<()> {
        for pair in self.records.windows(2) {
            if pair[0].goods_id >= pair[1].goods_id {
                return Err(NamesError::InvalidOrder {
                    reason: format!(
                        "expiration index out of order: {:?} then {:?}",
                        pair[0].goods_id, pair[1].goods_id
                    ),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
