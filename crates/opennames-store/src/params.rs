//! Typed store for the governance params record.

use opennames_types::{Params, Result};

use crate::{StateStore, keys};

/// Read the stored params, or the defaults when none were ever written.
pub fn get<S: StateStore>(store: &S) -> Result<Params> {
    store
        .get(&[keys::PARAMS])
        .map(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Validate and write the params record. Governance-gated by the caller.
pub fn set<S: StateStore>(store: &mut S, params: &Params) -> Result<()> {
    params.validate()?;
    store.set(&[keys::PARAMS], serde_json::to_vec(params)?);
    Ok(())
}
