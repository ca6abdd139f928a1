//! Typed store for buy offers and the monotonic offer-sequence counter.

use opennames_types::{BuyOffer, OfferId, Result};

use crate::{StateStore, keys};

/// Read a buy offer by id.
pub fn get<S: StateStore>(store: &S, id: OfferId) -> Result<Option<BuyOffer>> {
    store
        .get(&keys::join(keys::BUY_OFFER, &id.to_string()))
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
}

/// Write a buy offer, keyed by its id.
pub fn set<S: StateStore>(store: &mut S, offer: &BuyOffer) -> Result<()> {
    let bytes = serde_json::to_vec(offer)?;
    store.set(&keys::join(keys::BUY_OFFER, &offer.id.to_string()), bytes);
    Ok(())
}

/// Remove a buy offer.
pub fn remove<S: StateStore>(store: &mut S, id: OfferId) {
    store.delete(&keys::join(keys::BUY_OFFER, &id.to_string()));
}

/// Every stored buy offer.
pub fn iter_all<S: StateStore>(store: &S) -> Result<Vec<BuyOffer>> {
    store
        .iter_prefix(&[keys::BUY_OFFER])
        .into_iter()
        .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(Into::into))
        .collect()
}

/// Take the next value of the monotonic offer sequence. The counter is
/// global across offer kinds, so no two offers ever share a sequence.
pub fn next_sequence<S: StateStore>(store: &mut S) -> Result<u64> {
    let key = [keys::OFFER_SEQUENCE];
    let current: u64 = match store.get(&key) {
        Some(bytes) => serde_json::from_slice(&bytes)?,
        None => 0,
    };
    let next = current + 1;
    store.set(&key, serde_json::to_vec(&next)?);
    Ok(next)
}
