//! Reverse-lookup index maintainers.
//!
//! Every index here is denormalized from some primary record and must be
//! written in the same mutation unit as that record. The maintainers are
//! the only writers of their key families; engines call them, queries
//! read through them.
//!
//! Index families:
//! - owner → names (ownership transfers, registrations)
//! - resolved address → names (resolution config changes)
//! - buyer → offer ids, goods → offer ids (offer lifecycle)
//! - alias → chain id (governance chains params)

use opennames_types::{Addr, AssetKind, OfferId, Result};

use crate::{StateStore, keys};

/// Read a string-set cell. Missing cell = empty set.
fn get_set<S: StateStore>(store: &S, key: &[u8]) -> Result<Vec<String>> {
    store
        .get(key)
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Insert into a string-set cell, keeping it sorted and deduplicated.
fn add_to_set<S: StateStore>(store: &mut S, key: &[u8], value: &str) -> Result<()> {
    let mut set = get_set(store, key)?;
    if let Err(pos) = set.binary_search_by(|v| v.as_str().cmp(value)) {
        set.insert(pos, value.to_string());
        store.set(key, serde_json::to_vec(&set)?);
    }
    Ok(())
}

/// Remove from a string-set cell, deleting the cell when it empties.
fn remove_from_set<S: StateStore>(store: &mut S, key: &[u8], value: &str) -> Result<()> {
    let mut set = get_set(store, key)?;
    if let Ok(pos) = set.binary_search_by(|v| v.as_str().cmp(value)) {
        set.remove(pos);
        if set.is_empty() {
            store.delete(key);
        } else {
            store.set(key, serde_json::to_vec(&set)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// owner → names
// ---------------------------------------------------------------------------

pub fn add_owned_name<S: StateStore>(store: &mut S, owner: &Addr, name: &str) -> Result<()> {
    add_to_set(store, &keys::join(keys::OWNER_TO_NAMES, owner.as_str()), name)
}

pub fn remove_owned_name<S: StateStore>(store: &mut S, owner: &Addr, name: &str) -> Result<()> {
    remove_from_set(store, &keys::join(keys::OWNER_TO_NAMES, owner.as_str()), name)
}

/// Names owned by an account.
pub fn names_owned_by<S: StateStore>(store: &S, owner: &Addr) -> Result<Vec<String>> {
    get_set(store, &keys::join(keys::OWNER_TO_NAMES, owner.as_str()))
}

// ---------------------------------------------------------------------------
// resolved address → names
// ---------------------------------------------------------------------------

pub fn add_resolved_name<S: StateStore>(store: &mut S, address: &str, name: &str) -> Result<()> {
    add_to_set(store, &keys::join(keys::ADDRESS_TO_NAMES, address), name)
}

pub fn remove_resolved_name<S: StateStore>(store: &mut S, address: &str, name: &str) -> Result<()> {
    remove_from_set(store, &keys::join(keys::ADDRESS_TO_NAMES, address), name)
}

/// Names that resolve to an address.
pub fn names_resolving_to<S: StateStore>(store: &S, address: &str) -> Result<Vec<String>> {
    get_set(store, &keys::join(keys::ADDRESS_TO_NAMES, address))
}

// ---------------------------------------------------------------------------
// buyer → offer ids, goods → offer ids
// ---------------------------------------------------------------------------

pub fn add_offer_of_buyer<S: StateStore>(store: &mut S, buyer: &Addr, id: OfferId) -> Result<()> {
    add_to_set(
        store,
        &keys::join(keys::BUYER_TO_OFFERS, buyer.as_str()),
        &id.to_string(),
    )
}

pub fn remove_offer_of_buyer<S: StateStore>(
    store: &mut S,
    buyer: &Addr,
    id: OfferId,
) -> Result<()> {
    remove_from_set(
        store,
        &keys::join(keys::BUYER_TO_OFFERS, buyer.as_str()),
        &id.to_string(),
    )
}

/// Offer ids a buyer has open.
pub fn offers_of_buyer<S: StateStore>(store: &S, buyer: &Addr) -> Result<Vec<OfferId>> {
    get_set(store, &keys::join(keys::BUYER_TO_OFFERS, buyer.as_str()))?
        .iter()
        .map(|s| OfferId::parse(s))
        .collect()
}

pub fn add_offer_of_goods<S: StateStore>(
    store: &mut S,
    kind: AssetKind,
    goods_id: &str,
    id: OfferId,
) -> Result<()> {
    add_to_set(
        store,
        &keys::join_kinded(keys::GOODS_TO_OFFERS, kind, goods_id),
        &id.to_string(),
    )
}

pub fn remove_offer_of_goods<S: StateStore>(
    store: &mut S,
    kind: AssetKind,
    goods_id: &str,
    id: OfferId,
) -> Result<()> {
    remove_from_set(
        store,
        &keys::join_kinded(keys::GOODS_TO_OFFERS, kind, goods_id),
        &id.to_string(),
    )
}

/// Offer ids open against a goods id.
pub fn offers_of_goods<S: StateStore>(
    store: &S,
    kind: AssetKind,
    goods_id: &str,
) -> Result<Vec<OfferId>> {
    get_set(store, &keys::join_kinded(keys::GOODS_TO_OFFERS, kind, goods_id))?
        .iter()
        .map(|s| OfferId::parse(s))
        .collect()
}

// ---------------------------------------------------------------------------
// alias → chain id
// ---------------------------------------------------------------------------

pub fn set_alias_chain<S: StateStore>(store: &mut S, alias: &str, chain_id: &str) -> Result<()> {
    store.set(
        &keys::join(keys::ALIAS_TO_CHAIN, alias),
        serde_json::to_vec(chain_id)?,
    );
    Ok(())
}

pub fn remove_alias_chain<S: StateStore>(store: &mut S, alias: &str) {
    store.delete(&keys::join(keys::ALIAS_TO_CHAIN, alias));
}

/// The chain id an alias resolves to.
pub fn chain_of_alias<S: StateStore>(store: &S, alias: &str) -> Result<Option<String>> {
    store
        .get(&keys::join(keys::ALIAS_TO_CHAIN, alias))
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemStore;

    #[test]
    fn owner_index_add_remove() {
        let mut store = MemStore::new();
        let owner = Addr::dummy("owner");
        add_owned_name(&mut store, &owner, "zeta").unwrap();
        add_owned_name(&mut store, &owner, "alpha").unwrap();
        // Duplicate insert is a no-op.
        add_owned_name(&mut store, &owner, "alpha").unwrap();
        assert_eq!(names_owned_by(&store, &owner).unwrap(), vec!["alpha", "zeta"]);

        remove_owned_name(&mut store, &owner, "alpha").unwrap();
        assert_eq!(names_owned_by(&store, &owner).unwrap(), vec!["zeta"]);
        remove_owned_name(&mut store, &owner, "zeta").unwrap();
        assert!(names_owned_by(&store, &owner).unwrap().is_empty());
        // Removing from a missing cell is a no-op.
        remove_owned_name(&mut store, &owner, "zeta").unwrap();
    }

    #[test]
    fn address_index_is_independent_of_owner_index() {
        let mut store = MemStore::new();
        let owner = Addr::dummy("owner");
        add_owned_name(&mut store, &owner, "abc").unwrap();
        add_resolved_name(&mut store, owner.as_str(), "abc").unwrap();

        remove_owned_name(&mut store, &owner, "abc").unwrap();
        assert_eq!(names_resolving_to(&store, owner.as_str()).unwrap(), vec!["abc"]);
    }

    #[test]
    fn offer_indices_roundtrip() {
        let mut store = MemStore::new();
        let buyer = Addr::dummy("buyer");
        let id = OfferId::new(AssetKind::Name, 7);

        add_offer_of_buyer(&mut store, &buyer, id).unwrap();
        add_offer_of_goods(&mut store, AssetKind::Name, "foo", id).unwrap();
        assert_eq!(offers_of_buyer(&store, &buyer).unwrap(), vec![id]);
        assert_eq!(
            offers_of_goods(&store, AssetKind::Name, "foo").unwrap(),
            vec![id]
        );
        // Kind scoping keeps alias goods separate.
        assert!(offers_of_goods(&store, AssetKind::Alias, "foo").unwrap().is_empty());

        remove_offer_of_buyer(&mut store, &buyer, id).unwrap();
        remove_offer_of_goods(&mut store, AssetKind::Name, "foo", id).unwrap();
        assert!(offers_of_buyer(&store, &buyer).unwrap().is_empty());
        assert!(offers_of_goods(&store, AssetKind::Name, "foo").unwrap().is_empty());
    }

    #[test]
    fn alias_chain_mapping() {
        let mut store = MemStore::new();
        assert!(chain_of_alias(&store, "osmo").unwrap().is_none());
        set_alias_chain(&mut store, "osmo", "osmosis-1").unwrap();
        assert_eq!(
            chain_of_alias(&store, "osmo").unwrap().unwrap(),
            "osmosis-1"
        );
        remove_alias_chain(&mut store, "osmo");
        assert!(chain_of_alias(&store, "osmo").unwrap().is_none());
    }
}
