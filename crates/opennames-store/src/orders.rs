//! Typed store for sell orders: active orders, historical archives, the
//! active-orders expiration index, and the min-expiry pruning index.
//!
//! This module is also the storage-boundary compatibility adapter for the
//! previous order generation ("open purchase orders"). Both wire shapes
//! decode into the one [`SellOrder`] type; nothing above the store ever
//! sees the legacy shape, and all writes use the current shape.

use chrono::{DateTime, Utc};
use opennames_types::{
    ActiveOrdersExpiration, AssetKind, Coin, HistoricalOrders, Result, SellOrder, SellOrderBid,
};
use serde::Deserialize;

use crate::{StateStore, keys};

// ---------------------------------------------------------------------------
// Legacy wire shapes (read-only)
// ---------------------------------------------------------------------------

/// Previous-generation bid shape.
#[derive(Debug, Deserialize)]
struct LegacyPurchaseOrderBid {
    bidder: opennames_types::Addr,
    price: Coin,
}

/// Previous-generation order shape. Always a name auction — the alias
/// goods kind postdates the rename.
#[derive(Debug, Deserialize)]
struct LegacyPurchaseOrder {
    name: String,
    expire_at: DateTime<Utc>,
    min_price: Coin,
    #[serde(default)]
    sell_price: Option<Coin>,
    #[serde(default)]
    highest_bid: Option<LegacyPurchaseOrderBid>,
}

impl From<LegacyPurchaseOrder> for SellOrder {
    fn from(legacy: LegacyPurchaseOrder) -> Self {
        Self {
            goods_id: legacy.name,
            kind: AssetKind::Name,
            expire_at: legacy.expire_at,
            min_price: legacy.min_price,
            sell_price: legacy.sell_price,
            highest_bid: legacy.highest_bid.map(|bid| SellOrderBid {
                bidder: bid.bidder,
                price: bid.price,
            }),
        }
    }
}

/// Previous-generation historical collection shape.
#[derive(Debug, Deserialize)]
struct LegacyHistoricalOrders {
    name: String,
    orders: Vec<LegacyPurchaseOrder>,
}

/// Decode an order value, falling back to the legacy shape.
fn decode_order(bytes: &[u8]) -> Result<SellOrder> {
    if let Ok(order) = serde_json::from_slice::<SellOrder>(bytes) {
        return Ok(order);
    }
    let legacy: LegacyPurchaseOrder = serde_json::from_slice(bytes)?;
    Ok(legacy.into())
}

/// Decode a historical collection, falling back to the legacy shape.
fn decode_history(bytes: &[u8]) -> Result<HistoricalOrders> {
    if let Ok(history) = serde_json::from_slice::<HistoricalOrders>(bytes) {
        return Ok(history);
    }
    let legacy: LegacyHistoricalOrders = serde_json::from_slice(bytes)?;
    Ok(HistoricalOrders {
        goods_id: legacy.name,
        orders: legacy.orders.into_iter().map(Into::into).collect(),
    })
}

// ---------------------------------------------------------------------------
// Active orders
// ---------------------------------------------------------------------------

/// Read the active sell order for a goods id.
pub fn get_active<S: StateStore>(
    store: &S,
    kind: AssetKind,
    goods_id: &str,
) -> Result<Option<SellOrder>> {
    store
        .get(&keys::join(keys::active_order_prefix(kind), goods_id))
        .map(|bytes| decode_order(&bytes))
        .transpose()
}

/// Write the active sell order, keyed by its goods id.
pub fn set_active<S: StateStore>(store: &mut S, order: &SellOrder) -> Result<()> {
    let bytes = serde_json::to_vec(order)?;
    store.set(
        &keys::join(keys::active_order_prefix(order.kind), &order.goods_id),
        bytes,
    );
    Ok(())
}

/// Remove the active sell order for a goods id.
pub fn remove_active<S: StateStore>(store: &mut S, kind: AssetKind, goods_id: &str) {
    store.delete(&keys::join(keys::active_order_prefix(kind), goods_id));
}

/// Every active sell order of a kind, in goods-id order.
pub fn iter_active<S: StateStore>(store: &S, kind: AssetKind) -> Result<Vec<SellOrder>> {
    store
        .iter_prefix(&[keys::active_order_prefix(kind)])
        .into_iter()
        .map(|(_, bytes)| decode_order(&bytes))
        .collect()
}

// ---------------------------------------------------------------------------
// Historical orders + min-expiry index
// ---------------------------------------------------------------------------

/// Read the historical collection for a goods id (empty if none stored).
pub fn get_history<S: StateStore>(
    store: &S,
    kind: AssetKind,
    goods_id: &str,
) -> Result<HistoricalOrders> {
    match store.get(&keys::join(keys::historical_prefix(kind), goods_id)) {
        Some(bytes) => decode_history(&bytes),
        None => Ok(HistoricalOrders::new(goods_id)),
    }
}

/// Write a historical collection. An empty collection deletes the entry
/// and its min-expiry index cell in the same unit.
pub fn set_history<S: StateStore>(
    store: &mut S,
    kind: AssetKind,
    history: &HistoricalOrders,
) -> Result<()> {
    let key = keys::join(keys::historical_prefix(kind), &history.goods_id);
    if history.orders.is_empty() {
        store.delete(&key);
        store.delete(&keys::join_kinded(keys::MIN_EXPIRY, kind, &history.goods_id));
        return Ok(());
    }
    let bytes = serde_json::to_vec(history)?;
    store.set(&key, bytes);
    // The pruning pass keys off the earliest retained expiry.
    if let Some(min) = history.min_expire_at() {
        let min_bytes = serde_json::to_vec(&min)?;
        store.set(
            &keys::join_kinded(keys::MIN_EXPIRY, kind, &history.goods_id),
            min_bytes,
        );
    }
    Ok(())
}

/// The min-expiry pruning index for a kind: `(goods_id, min_expire_at)`
/// pairs in goods-id order.
pub fn iter_min_expiry<S: StateStore>(
    store: &S,
    kind: AssetKind,
) -> Result<Vec<(String, DateTime<Utc>)>> {
    let prefix = [keys::MIN_EXPIRY, keys::kind_byte(kind)];
    store
        .iter_prefix(&prefix)
        .into_iter()
        .map(|(key, bytes)| {
            let goods_id = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            let min: DateTime<Utc> = serde_json::from_slice(&bytes)?;
            Ok((goods_id, min))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Active-orders expiration index
// ---------------------------------------------------------------------------

/// Read the expiration index for a kind (empty if none stored).
pub fn get_expiration<S: StateStore>(store: &S, kind: AssetKind) -> Result<ActiveOrdersExpiration> {
    store
        .get(&[keys::ACTIVE_EXPIRATION, keys::kind_byte(kind)])
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Write the expiration index for a kind.
pub fn set_expiration<S: StateStore>(
    store: &mut S,
    kind: AssetKind,
    index: &ActiveOrdersExpiration,
) -> Result<()> {
    let bytes = serde_json::to_vec(index)?;
    store.set(&[keys::ACTIVE_EXPIRATION, keys::kind_byte(kind)], bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStore;
    use chrono::Duration;
    use opennames_types::Addr;
    use rust_decimal::Decimal;

    fn coin(amount: i64) -> Coin {
        Coin::new("uopen", Decimal::new(amount, 0))
    }

    fn order(goods_id: &str) -> SellOrder {
        SellOrder {
            goods_id: goods_id.to_string(),
            kind: AssetKind::Name,
            expire_at: Utc::now() + Duration::days(3),
            min_price: coin(100),
            sell_price: None,
            highest_bid: None,
        }
    }

    #[test]
    fn active_order_roundtrip() {
        let mut store = MemStore::new();
        assert!(get_active(&store, AssetKind::Name, "abc").unwrap().is_none());

        let o = order("abc");
        set_active(&mut store, &o).unwrap();
        assert_eq!(get_active(&store, AssetKind::Name, "abc").unwrap().unwrap(), o);
        // Kind prefixes are disjoint.
        assert!(get_active(&store, AssetKind::Alias, "abc").unwrap().is_none());

        remove_active(&mut store, AssetKind::Name, "abc");
        assert!(get_active(&store, AssetKind::Name, "abc").unwrap().is_none());
    }

    #[test]
    fn legacy_order_shape_decodes() {
        let legacy = serde_json::json!({
            "name": "abc",
            "expire_at": Utc::now() + Duration::days(1),
            "min_price": {"denom": "uopen", "amount": "100"},
            "highest_bid": {
                "bidder": Addr::dummy("bidder"),
                "price": {"denom": "uopen", "amount": "150"},
            },
        });
        let mut store = MemStore::new();
        store.set(
            &keys::join(keys::ACTIVE_ORDER_NAME, "abc"),
            serde_json::to_vec(&legacy).unwrap(),
        );

        let decoded = get_active(&store, AssetKind::Name, "abc").unwrap().unwrap();
        assert_eq!(decoded.goods_id, "abc");
        assert_eq!(decoded.kind, AssetKind::Name);
        assert_eq!(decoded.highest_bid.unwrap().price, coin(150));
    }

    #[test]
    fn legacy_history_shape_decodes() {
        let legacy = serde_json::json!({
            "name": "abc",
            "orders": [{
                "name": "abc",
                "expire_at": Utc::now() - Duration::days(2),
                "min_price": {"denom": "uopen", "amount": "100"},
            }],
        });
        let mut store = MemStore::new();
        store.set(
            &keys::join(keys::HISTORICAL_NAME, "abc"),
            serde_json::to_vec(&legacy).unwrap(),
        );

        let history = get_history(&store, AssetKind::Name, "abc").unwrap();
        assert_eq!(history.goods_id, "abc");
        assert_eq!(history.orders.len(), 1);
        history.validate().unwrap();
    }

    #[test]
    fn history_write_maintains_min_expiry_index() {
        let mut store = MemStore::new();
        let mut history = HistoricalOrders::new("abc");
        let mut early = order("abc");
        early.expire_at = Utc::now() - Duration::days(9);
        let mut late = order("abc");
        late.expire_at = Utc::now() - Duration::days(1);
        history.push(late).unwrap();
        history.push(early.clone()).unwrap();

        set_history(&mut store, AssetKind::Name, &history).unwrap();
        let index = iter_min_expiry(&store, AssetKind::Name).unwrap();
        assert_eq!(index, vec![("abc".to_string(), early.expire_at)]);

        // Writing an empty collection clears record and index together.
        set_history(&mut store, AssetKind::Name, &HistoricalOrders::new("abc")).unwrap();
        assert!(iter_min_expiry(&store, AssetKind::Name).unwrap().is_empty());
        assert!(get_history(&store, AssetKind::Name, "abc").unwrap().orders.is_empty());
    }

    #[test]
    fn expiration_index_roundtrip() {
        let mut store = MemStore::new();
        let mut index = get_expiration(&store, AssetKind::Name).unwrap();
        assert!(index.records.is_empty());

        index.add("abc", Utc::now());
        set_expiration(&mut store, AssetKind::Name, &index).unwrap();
        let back = get_expiration(&store, AssetKind::Name).unwrap();
        assert_eq!(back, index);
        // Per-kind isolation.
        assert!(get_expiration(&store, AssetKind::Alias).unwrap().records.is_empty());
    }
}
