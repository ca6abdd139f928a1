//! Typed store for name records.
//!
//! Callers never touch raw keys; every accessor goes through the pinned
//! prefix in [`crate::keys`].

use opennames_types::{NameRecord, Result};

use crate::{StateStore, keys};

/// Read a name record.
pub fn get<S: StateStore>(store: &S, name: &str) -> Result<Option<NameRecord>> {
    store
        .get(&keys::join(keys::NAME_RECORD, name))
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
}

/// Write a name record, keyed by its own name string.
pub fn set<S: StateStore>(store: &mut S, record: &NameRecord) -> Result<()> {
    let bytes = serde_json::to_vec(record)?;
    store.set(&keys::join(keys::NAME_RECORD, &record.name), bytes);
    Ok(())
}

/// Remove a name record.
pub fn remove<S: StateStore>(store: &mut S, name: &str) {
    store.delete(&keys::join(keys::NAME_RECORD, name));
}

/// Every stored name record, in name order.
pub fn iter_all<S: StateStore>(store: &S) -> Result<Vec<NameRecord>> {
    store
        .iter_prefix(&[keys::NAME_RECORD])
        .into_iter()
        .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(Into::into))
        .collect()
}
