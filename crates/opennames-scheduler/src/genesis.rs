//! Genesis export and import.
//!
//! Export snapshots everything a restart must not lose: params, name
//! records, active sell orders (for their refundable bids), and open buy
//! offers (for their escrow). Import writes the durable records back and
//! **refunds every escrowed position** instead of recreating it — active
//! negotiations do not survive a restart, escrowed funds must. This is
//! what makes a non-finalized highest bid refundable on reload without
//! the original order being present afterwards.
//!
//! Import runs before the module serves transactions, directly against
//! the store and bank; the keeper is constructed afterwards. The host
//! guarantees the module's escrow account arrives funded with exactly
//! the escrow the snapshot carries.

use opennames_store::{StateStore, names, offers, orders, params as params_store, reverse_lookup};
use opennames_types::{
    AssetKind, BuyOffer, NameRecord, NamesError, Params, Result, SellOrder,
};
use serde::{Deserialize, Serialize};

use opennames_market::BankKeeper;

/// The full module snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub names: Vec<NameRecord>,
    /// Active sell orders at export time. Imported only for their bids:
    /// each non-nil highest bid is refunded, the order is dropped.
    pub sell_orders: Vec<SellOrder>,
    /// Open buy offers at export time. Imported only for their escrow:
    /// each offer price is refunded to its buyer, the offer is dropped.
    pub buy_offers: Vec<BuyOffer>,
}

impl GenesisState {
    /// Validate the snapshot before any of it is applied.
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        let mut seen = std::collections::HashSet::new();
        for record in &self.names {
            record.validate()?;
            if !seen.insert(record.name.clone()) {
                return Err(NamesError::NameAlreadyRegistered(record.name.clone()));
            }
        }
        for order in &self.sell_orders {
            order.validate()?;
        }
        let mut offer_ids = std::collections::HashSet::new();
        for offer in &self.buy_offers {
            offer.validate()?;
            if !offer_ids.insert(offer.id) {
                return Err(NamesError::InvalidOffer {
                    reason: format!("duplicate offer id {}", offer.id),
                });
            }
        }
        Ok(())
    }
}

/// Snapshot the module state out of the store.
pub fn export<S: StateStore>(store: &S) -> Result<GenesisState> {
    let mut sell_orders = orders::iter_active(store, AssetKind::Name)?;
    sell_orders.extend(orders::iter_active(store, AssetKind::Alias)?);
    Ok(GenesisState {
        params: params_store::get(store)?,
        names: names::iter_all(store)?,
        sell_orders,
        buy_offers: offers::iter_all(store)?,
    })
}

/// Apply a snapshot to an empty store, refunding every escrowed position.
pub fn import<S: StateStore, B: BankKeeper>(
    store: &mut S,
    bank: &mut B,
    genesis: &GenesisState,
) -> Result<()> {
    genesis.validate()?;

    params_store::set(store, &genesis.params)?;
    for entry in &genesis.params.chains.aliases_of_chains {
        for alias in &entry.aliases {
            reverse_lookup::set_alias_chain(store, alias, &entry.chain_id)?;
        }
    }

    for record in &genesis.names {
        names::set(store, record)?;
        reverse_lookup::add_owned_name(store, &record.owner, &record.name)?;
        for address in record.resolved_native_addresses() {
            reverse_lookup::add_resolved_name(store, &address, &record.name)?;
        }
    }

    // Escrow unwinding: bids and offers are refunded, not recreated.
    for order in &genesis.sell_orders {
        if let Some(bid) = &order.highest_bid {
            bank.release(&bid.bidder, &bid.price)?;
            tracing::info!(
                goods = order.goods_id,
                bidder = %bid.bidder,
                price = %bid.price,
                "genesis: refunded sell-order bid"
            );
        }
    }
    for offer in &genesis.buy_offers {
        bank.release(&offer.buyer, &offer.offer_price)?;
        tracing::info!(
            goods = offer.goods_id,
            buyer = %offer.buyer,
            price = %offer.offer_price,
            "genesis: refunded buy-offer escrow"
        );
    }
    Ok(())
}
