//! The market keeper: one façade over store, bank, and event sink.
//!
//! Every mutating entry point of the module is a method on
//! [`MarketKeeper`], split across `registry`, `auction`, and `offer` by
//! concern. Methods follow one discipline: validate fully against current
//! state, then mutate — the host's transaction boundary makes the
//! mutation set atomic, so a method that errors has changed nothing.

use chrono::{DateTime, Utc};
use opennames_store::{StateStore, names, params as params_store, reverse_lookup};
use opennames_types::{
    Addr, AssetKind, Coin, Event, EventKind, EventSink, NameRecord, NamesError, Params, Result,
};

use crate::bank::BankKeeper;

/// Facade over the module's state, bank boundary, and event sink.
pub struct MarketKeeper<S: StateStore, B: BankKeeper> {
    pub(crate) store: S,
    pub(crate) bank: B,
    pub(crate) events: EventSink,
}

impl<S: StateStore, B: BankKeeper> MarketKeeper<S, B> {
    #[must_use]
    pub fn new(store: S, bank: B) -> Self {
        Self {
            store,
            bank,
            events: EventSink::new(),
        }
    }

    /// The governance params (stored, or defaults).
    pub fn params(&self) -> Result<Params> {
        params_store::get(&self.store)
    }

    /// Replace the governance params. The caller is the governance gate.
    pub fn set_params(&mut self, params: &Params) -> Result<()> {
        params_store::set(&mut self.store, params)?;
        // The alias→chain index is denormalized from the chains section.
        self.rebuild_alias_index(params)
    }

    fn rebuild_alias_index(&mut self, params: &Params) -> Result<()> {
        let stale: Vec<(Vec<u8>, Vec<u8>)> = self
            .store
            .iter_prefix(&[opennames_store::keys::ALIAS_TO_CHAIN]);
        for (key, _) in stale {
            self.store.delete(&key);
        }
        for entry in &params.chains.aliases_of_chains {
            for alias in &entry.aliases {
                reverse_lookup::set_alias_chain(&mut self.store, alias, &entry.chain_id)?;
            }
        }
        Ok(())
    }

    /// Read access to the underlying store (queries, tests).
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The bank boundary (tests, genesis funding).
    #[must_use]
    pub fn bank(&self) -> &B {
        &self.bank
    }

    #[must_use]
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    /// Drain the events collected since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -----------------------------------------------------------------
    // Shared internals
    // -----------------------------------------------------------------

    /// The name record backing a goods id. Both asset kinds resolve
    /// through the registry: an alias tradable on the marketplace is
    /// itself a registered record; the alias→chain mapping is governance
    /// metadata, not ownership.
    pub(crate) fn goods_record(&self, goods_id: &str) -> Result<NameRecord> {
        names::get(&self.store, goods_id)?
            .ok_or_else(|| NamesError::NameNotFound(goods_id.to_string()))
    }

    /// Require `actor` to be the owner of `record`.
    pub(crate) fn require_owner(record: &NameRecord, actor: &Addr) -> Result<()> {
        if &record.owner != actor {
            return Err(NamesError::NotOwner {
                name: record.name.clone(),
                actor: actor.to_string(),
            });
        }
        Ok(())
    }

    /// Rewrite a record to a new owner: configs cleared, controller reset
    /// to the new owner, both reverse indices updated in the same unit.
    pub(crate) fn transfer_record(&mut self, mut record: NameRecord, new_owner: Addr) -> Result<()> {
        let old_resolved = record.resolved_native_addresses();
        let old_owner = record.owner.clone();

        record.configs.clear();
        record.owner = new_owner.clone();
        record.controller = new_owner.clone();

        for address in &old_resolved {
            reverse_lookup::remove_resolved_name(&mut self.store, address, &record.name)?;
        }
        for address in record.resolved_native_addresses() {
            reverse_lookup::add_resolved_name(&mut self.store, &address, &record.name)?;
        }
        reverse_lookup::remove_owned_name(&mut self.store, &old_owner, &record.name)?;
        reverse_lookup::add_owned_name(&mut self.store, &new_owner, &record.name)?;
        names::set(&mut self.store, &record)
    }

    /// Emit a domain event.
    pub(crate) fn emit(
        &mut self,
        kind: EventKind,
        goods_id: &str,
        asset_kind: AssetKind,
        actor: &Addr,
        price: Option<Coin>,
        now: DateTime<Utc>,
    ) {
        self.events.emit(Event::new(
            kind,
            goods_id,
            asset_kind,
            actor.to_string(),
            price,
            now,
        ));
    }
}
