//! The buy-offer negotiation engine.
//!
//! Independent of sell orders: a buyer escrows an offer on goods the
//! owner has not listed, and the owner accepts, counters, or lets it sit.
//! Offers never expire on their own — the deliberate asymmetry versus the
//! auction engine — so the only exits are acceptance and cancellation.

use chrono::{DateTime, Utc};
use opennames_store::{StateStore, offers, reverse_lookup};
use opennames_types::{
    Addr, AssetKind, BuyOffer, Coin, EventKind, NamesError, OfferId, Result,
};

use crate::{MarketKeeper, bank::BankKeeper};

/// What an accept call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Ownership transferred and escrow released at the offer price.
    Completed,
    /// The owner asked for more than the escrowed price; recorded as a
    /// counter-ask, negotiation continues.
    Countered,
}

impl<S: StateStore, B: BankKeeper> MarketKeeper<S, B> {
    /// Escrow `offer_price` and open an offer on goods the buyer wants.
    ///
    /// The goods must be a registered record not owned by the buyer. The
    /// offer id is type-prefixed and monotonically assigned; the buyer
    /// and goods reverse indices are written in the same unit.
    pub fn create_offer(
        &mut self,
        now: DateTime<Utc>,
        kind: AssetKind,
        goods_id: &str,
        buyer: &Addr,
        offer_price: Coin,
    ) -> Result<BuyOffer> {
        Addr::parse(buyer.as_str())?;
        offer_price.validate()?;
        let record = self.goods_record(goods_id)?;
        if &record.owner == buyer {
            return Err(NamesError::SelfOffer(goods_id.to_string()));
        }

        self.bank.escrow(buyer, &offer_price)?;

        let sequence = offers::next_sequence(&mut self.store)?;
        let offer = BuyOffer {
            id: OfferId::new(kind, sequence),
            goods_id: goods_id.to_string(),
            kind,
            buyer: buyer.clone(),
            offer_price: offer_price.clone(),
            counterparty_offer_price: None,
        };
        offer.validate()?;
        offers::set(&mut self.store, &offer)?;
        reverse_lookup::add_offer_of_buyer(&mut self.store, buyer, offer.id)?;
        reverse_lookup::add_offer_of_goods(&mut self.store, kind, goods_id, offer.id)?;

        tracing::info!(goods = goods_id, %kind, buyer = %buyer, price = %offer_price, "buy offer created");
        self.emit(EventKind::OfferCreated, goods_id, kind, buyer, Some(offer_price), now);
        Ok(offer)
    }

    /// Record the owner's counter-ask on an open offer.
    ///
    /// Purely informational: the counter need not exceed the escrowed
    /// price and does not close the offer.
    pub fn counter_offer(
        &mut self,
        now: DateTime<Utc>,
        id: OfferId,
        owner: &Addr,
        counter_price: Coin,
    ) -> Result<()> {
        let mut offer = offers::get(&self.store, id)?
            .ok_or_else(|| NamesError::OfferNotFound(id.to_string()))?;
        let record = self.goods_record(&offer.goods_id)?;
        Self::require_owner(&record, owner)?;
        offer.offer_price.validate_same_denom(&counter_price)?;

        offer.counterparty_offer_price = Some(counter_price.clone());
        offers::set(&mut self.store, &offer)?;
        self.emit(
            EventKind::OfferCountered,
            &offer.goods_id,
            offer.kind,
            owner,
            Some(counter_price),
            now,
        );
        Ok(())
    }

    /// Accept an open offer.
    ///
    /// `min_accept` is the owner's intent guard: acceptance always
    /// executes at the escrowed offer price, never at an amount the owner
    /// did not agree to. A `min_accept` above the escrowed price cannot
    /// execute, so it is recorded as a counter-ask instead and the offer
    /// stays open.
    pub fn accept_offer(
        &mut self,
        now: DateTime<Utc>,
        id: OfferId,
        owner: &Addr,
        min_accept: Coin,
    ) -> Result<AcceptOutcome> {
        let offer = offers::get(&self.store, id)?
            .ok_or_else(|| NamesError::OfferNotFound(id.to_string()))?;
        let record = self.goods_record(&offer.goods_id)?;
        Self::require_owner(&record, owner)?;
        offer.offer_price.validate_same_denom(&min_accept)?;

        if min_accept.amount > offer.offer_price.amount {
            let mut countered = offer;
            countered.counterparty_offer_price = Some(min_accept.clone());
            offers::set(&mut self.store, &countered)?;
            self.emit(
                EventKind::OfferCountered,
                &countered.goods_id,
                countered.kind,
                owner,
                Some(min_accept),
                now,
            );
            return Ok(AcceptOutcome::Countered);
        }

        // Executes at the escrowed price, to the pre-transfer owner.
        self.bank.release(owner, &offer.offer_price)?;
        self.transfer_record(record, offer.buyer.clone())?;
        self.remove_offer(&offer)?;

        tracing::info!(
            goods = offer.goods_id,
            buyer = %offer.buyer,
            price = %offer.offer_price,
            "buy offer accepted"
        );
        self.emit(
            EventKind::OfferAccepted,
            &offer.goods_id,
            offer.kind,
            owner,
            Some(offer.offer_price.clone()),
            now,
        );
        Ok(AcceptOutcome::Completed)
    }

    /// Cancel an open offer and refund its escrow. Buyer-only.
    pub fn cancel_offer(&mut self, now: DateTime<Utc>, id: OfferId, actor: &Addr) -> Result<()> {
        let offer = offers::get(&self.store, id)?
            .ok_or_else(|| NamesError::OfferNotFound(id.to_string()))?;
        if &offer.buyer != actor {
            return Err(NamesError::NotOfferBuyer {
                offer_id: id.to_string(),
                actor: actor.to_string(),
            });
        }

        self.bank.release(&offer.buyer, &offer.offer_price)?;
        self.remove_offer(&offer)?;

        tracing::info!(goods = offer.goods_id, buyer = %offer.buyer, "buy offer cancelled");
        self.emit(
            EventKind::RefundIssued,
            &offer.goods_id,
            offer.kind,
            &offer.buyer,
            Some(offer.offer_price.clone()),
            now,
        );
        self.emit(
            EventKind::OfferCancelled,
            &offer.goods_id,
            offer.kind,
            actor,
            None,
            now,
        );
        Ok(())
    }

    /// Drop an offer and both of its reverse-index entries in one unit.
    fn remove_offer(&mut self, offer: &BuyOffer) -> Result<()> {
        offers::remove(&mut self.store, offer.id);
        reverse_lookup::remove_offer_of_buyer(&mut self.store, &offer.buyer, offer.id)?;
        reverse_lookup::remove_offer_of_goods(&mut self.store, offer.kind, &offer.goods_id, offer.id)
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Fetch an offer by id.
    pub fn buy_offer(&self, id: OfferId) -> Result<Option<BuyOffer>> {
        offers::get(&self.store, id)
    }

    /// Offer ids a buyer has open (reverse lookup).
    pub fn offers_of_buyer(&self, buyer: &Addr) -> Result<Vec<OfferId>> {
        reverse_lookup::offers_of_buyer(&self.store, buyer)
    }

    /// Offer ids open against a goods id (reverse lookup).
    pub fn offers_of_goods(&self, kind: AssetKind, goods_id: &str) -> Result<Vec<OfferId>> {
        reverse_lookup::offers_of_goods(&self.store, kind, goods_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::ModuleBank;
    use opennames_store::MemStore;
    use rust_decimal::Decimal;

    fn coin(amount: i64) -> Coin {
        Coin::new("uopen", Decimal::new(amount, 0))
    }

    struct Setup {
        keeper: MarketKeeper<MemStore, ModuleBank>,
        now: DateTime<Utc>,
        owner: Addr,
        buyer: Addr,
    }

    fn setup() -> Setup {
        let owner = Addr::dummy("owner");
        let buyer = Addr::dummy("buyer");
        let mut bank = ModuleBank::new();
        bank.deposit(&owner, &coin(1_000_000));
        bank.deposit(&buyer, &coin(1_000_000));
        let mut keeper = MarketKeeper::new(MemStore::new(), bank);
        let now = Utc::now();
        keeper.register_name(now, "foo", &owner, 1).unwrap();
        keeper.drain_events();
        Setup {
            keeper,
            now,
            owner,
            buyer,
        }
    }

    #[test]
    fn create_escrows_and_indexes() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();

        assert_eq!(offer.id, OfferId::new(AssetKind::Name, 1));
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::new(50, 0));
        assert_eq!(s.keeper.offers_of_buyer(&s.buyer).unwrap(), vec![offer.id]);
        assert_eq!(
            s.keeper.offers_of_goods(AssetKind::Name, "foo").unwrap(),
            vec![offer.id]
        );
    }

    #[test]
    fn offer_ids_are_monotonic() {
        let mut s = setup();
        let carol = Addr::dummy("carol");
        s.keeper.bank_mut().deposit(&carol, &coin(1000));
        let first = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let second = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &carol, coin(60))
            .unwrap();
        assert_eq!(first.id.sequence + 1, second.id.sequence);
    }

    #[test]
    fn owner_cannot_offer_on_own_goods() {
        let mut s = setup();
        let owner = s.owner.clone();
        let err = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &owner, coin(50))
            .unwrap_err();
        assert!(matches!(err, NamesError::SelfOffer(_)));
    }

    #[test]
    fn offer_on_unregistered_goods_fails() {
        let mut s = setup();
        let err = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "nosuch", &s.buyer, coin(50))
            .unwrap_err();
        assert!(matches!(err, NamesError::NameNotFound(_)));
    }

    #[test]
    fn counter_is_informational() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        s.keeper.counter_offer(s.now, offer.id, &owner, coin(80)).unwrap();

        let stored = s.keeper.buy_offer(offer.id).unwrap().unwrap();
        assert_eq!(stored.counterparty_offer_price, Some(coin(80)));
        // Still open, still escrowed at the original price.
        assert_eq!(stored.offer_price, coin(50));
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::new(50, 0));
    }

    #[test]
    fn counter_wrong_denom_fails() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        let err = s
            .keeper
            .counter_offer(s.now, offer.id, &owner, Coin::new("uatom", Decimal::new(80, 0)))
            .unwrap_err();
        assert!(matches!(err, NamesError::DenomMismatch { .. }));
    }

    #[test]
    fn accept_transfers_at_escrowed_price() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        let outcome = s
            .keeper
            .accept_offer(s.now, offer.id, &owner, coin(50))
            .unwrap();
        assert_eq!(outcome, AcceptOutcome::Completed);

        let record = s.keeper.name_record("foo").unwrap().unwrap();
        assert_eq!(record.owner, s.buyer);
        // Proceeds landed with the prior owner; offer and indices purged.
        assert_eq!(
            s.keeper.bank().balance_of(&owner, "uopen"),
            Decimal::new(1_000_000 - 10_000 + 50, 0)
        );
        assert!(s.keeper.buy_offer(offer.id).unwrap().is_none());
        assert!(s.keeper.offers_of_buyer(&s.buyer).unwrap().is_empty());
        assert!(
            s.keeper
                .offers_of_goods(AssetKind::Name, "foo")
                .unwrap()
                .is_empty()
        );
        s.keeper.bank().verify_conservation("uopen").unwrap();
    }

    #[test]
    fn accept_above_escrow_becomes_counter() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        let outcome = s
            .keeper
            .accept_offer(s.now, offer.id, &owner, coin(80))
            .unwrap();
        assert_eq!(outcome, AcceptOutcome::Countered);

        // Nothing moved; the ask was recorded.
        let stored = s.keeper.buy_offer(offer.id).unwrap().unwrap();
        assert_eq!(stored.counterparty_offer_price, Some(coin(80)));
        assert_eq!(s.keeper.name_record("foo").unwrap().unwrap().owner, owner);
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::new(50, 0));
    }

    #[test]
    fn accept_by_non_owner_fails() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let buyer = s.buyer.clone();
        let err = s
            .keeper
            .accept_offer(s.now, offer.id, &buyer, coin(50))
            .unwrap_err();
        assert!(matches!(err, NamesError::NotOwner { .. }));
    }

    #[test]
    fn cancel_refunds_and_purges() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let buyer = s.buyer.clone();
        s.keeper.cancel_offer(s.now, offer.id, &buyer).unwrap();

        assert_eq!(
            s.keeper.bank().balance_of(&buyer, "uopen"),
            Decimal::new(1_000_000, 0)
        );
        assert!(s.keeper.buy_offer(offer.id).unwrap().is_none());
        assert!(s.keeper.offers_of_buyer(&buyer).unwrap().is_empty());
    }

    #[test]
    fn cancel_by_non_buyer_fails() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        let err = s.keeper.cancel_offer(s.now, offer.id, &owner).unwrap_err();
        assert!(matches!(err, NamesError::NotOfferBuyer { .. }));
    }

    #[test]
    fn resolved_offer_cannot_be_resolved_again() {
        let mut s = setup();
        let offer = s
            .keeper
            .create_offer(s.now, AssetKind::Name, "foo", &s.buyer, coin(50))
            .unwrap();
        let owner = s.owner.clone();
        let buyer = s.buyer.clone();
        s.keeper.accept_offer(s.now, offer.id, &owner, coin(50)).unwrap();

        let err = s.keeper.cancel_offer(s.now, offer.id, &buyer).unwrap_err();
        assert!(matches!(err, NamesError::OfferNotFound(_)));
        let err = s
            .keeper
            .accept_offer(s.now, offer.id, &owner, coin(50))
            .unwrap_err();
        assert!(matches!(err, NamesError::OfferNotFound(_)));
    }
}
