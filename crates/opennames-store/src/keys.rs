//! The store-prefix arena: one fixed byte per entity family.
//!
//! Prefix bytes are a wire contract with every deployed store — changing
//! an existing value is a breaking change. The `prefix_bytes_are_pinned`
//! test pins each value; a failing pin means the change must be rejected,
//! not the test updated.

use opennames_types::AssetKind;

/// Name records: `NAME_RECORD ++ name`.
pub const NAME_RECORD: u8 = 0x01;

/// Active sell orders for names: `ACTIVE_ORDER_NAME ++ goods_id`.
pub const ACTIVE_ORDER_NAME: u8 = 0x02;

/// Active sell orders for aliases: `ACTIVE_ORDER_ALIAS ++ goods_id`.
pub const ACTIVE_ORDER_ALIAS: u8 = 0x03;

/// Historical orders for names: `HISTORICAL_NAME ++ goods_id`.
pub const HISTORICAL_NAME: u8 = 0x04;

/// Historical orders for aliases: `HISTORICAL_ALIAS ++ goods_id`.
pub const HISTORICAL_ALIAS: u8 = 0x05;

/// Active-orders expiration index, one record per kind:
/// `ACTIVE_EXPIRATION ++ kind_byte`.
pub const ACTIVE_EXPIRATION: u8 = 0x06;

/// Min-expiry-per-goods pruning index:
/// `MIN_EXPIRY ++ kind_byte ++ goods_id`.
pub const MIN_EXPIRY: u8 = 0x07;

/// Buy offers: `BUY_OFFER ++ offer_id`.
pub const BUY_OFFER: u8 = 0x08;

/// The single monotonic offer-sequence counter cell.
pub const OFFER_SEQUENCE: u8 = 0x09;

/// Reverse lookup, owner → names: `OWNER_TO_NAMES ++ owner`.
pub const OWNER_TO_NAMES: u8 = 0x0A;

/// Reverse lookup, resolved address → names: `ADDRESS_TO_NAMES ++ address`.
pub const ADDRESS_TO_NAMES: u8 = 0x0B;

/// Reverse lookup, buyer → offer ids: `BUYER_TO_OFFERS ++ buyer`.
pub const BUYER_TO_OFFERS: u8 = 0x0C;

/// Reverse lookup, goods → offer ids:
/// `GOODS_TO_OFFERS ++ kind_byte ++ goods_id`.
pub const GOODS_TO_OFFERS: u8 = 0x0D;

/// Reverse lookup, alias → chain id: `ALIAS_TO_CHAIN ++ alias`.
pub const ALIAS_TO_CHAIN: u8 = 0x0E;

/// The governance params record.
pub const PARAMS: u8 = 0x0F;

/// The kind discriminator byte used inside composite keys.
#[must_use]
pub fn kind_byte(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Name => 0x01,
        AssetKind::Alias => 0x02,
    }
}

/// `prefix ++ suffix` key for a string-identified record.
#[must_use]
pub fn join(prefix: u8, suffix: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + suffix.len());
    key.push(prefix);
    key.extend_from_slice(suffix.as_bytes());
    key
}

/// `prefix ++ kind ++ suffix` key for a kind-scoped record.
#[must_use]
pub fn join_kinded(prefix: u8, kind: AssetKind, suffix: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + suffix.len());
    key.push(prefix);
    key.push(kind_byte(kind));
    key.extend_from_slice(suffix.as_bytes());
    key
}

/// The active-order prefix for a kind.
#[must_use]
pub fn active_order_prefix(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Name => ACTIVE_ORDER_NAME,
        AssetKind::Alias => ACTIVE_ORDER_ALIAS,
    }
}

/// The historical-orders prefix for a kind.
#[must_use]
pub fn historical_prefix(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Name => HISTORICAL_NAME,
        AssetKind::Alias => HISTORICAL_ALIAS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pins every prefix byte. A failure here means a breaking store
    /// migration, not a test to update.
    #[test]
    fn prefix_bytes_are_pinned() {
        assert_eq!(NAME_RECORD, 0x01);
        assert_eq!(ACTIVE_ORDER_NAME, 0x02);
        assert_eq!(ACTIVE_ORDER_ALIAS, 0x03);
        assert_eq!(HISTORICAL_NAME, 0x04);
        assert_eq!(HISTORICAL_ALIAS, 0x05);
        assert_eq!(ACTIVE_EXPIRATION, 0x06);
        assert_eq!(MIN_EXPIRY, 0x07);
        assert_eq!(BUY_OFFER, 0x08);
        assert_eq!(OFFER_SEQUENCE, 0x09);
        assert_eq!(OWNER_TO_NAMES, 0x0A);
        assert_eq!(ADDRESS_TO_NAMES, 0x0B);
        assert_eq!(BUYER_TO_OFFERS, 0x0C);
        assert_eq!(GOODS_TO_OFFERS, 0x0D);
        assert_eq!(ALIAS_TO_CHAIN, 0x0E);
        assert_eq!(PARAMS, 0x0F);
    }

    #[test]
    fn prefixes_are_unique() {
        let all = [
            NAME_RECORD,
            ACTIVE_ORDER_NAME,
            ACTIVE_ORDER_ALIAS,
            HISTORICAL_NAME,
            HISTORICAL_ALIAS,
            ACTIVE_EXPIRATION,
            MIN_EXPIRY,
            BUY_OFFER,
            OFFER_SEQUENCE,
            OWNER_TO_NAMES,
            ADDRESS_TO_NAMES,
            BUYER_TO_OFFERS,
            GOODS_TO_OFFERS,
            ALIAS_TO_CHAIN,
            PARAMS,
        ];
        let unique: std::collections::HashSet<u8> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn join_builds_prefixed_keys() {
        assert_eq!(join(NAME_RECORD, "abc"), b"\x01abc");
        assert_eq!(
            join_kinded(MIN_EXPIRY, AssetKind::Alias, "osmo"),
            b"\x07\x02osmo"
        );
    }
}
