//! The sell-order auction engine.
//!
//! State machine per order: `Open → (Bidding)* → {Finished-by-match |
//! Expired}`. Exactly one account is refunded per transition — the bidder
//! displaced by a strictly higher bid, or the loser of an order that
//! closed without transfer. Completed and expired orders move to the
//! per-goods historical archive and leave the active-expiration index in
//! the same unit.

use chrono::{DateTime, Duration, Utc};
use opennames_store::{StateStore, orders};
use opennames_types::{
    Addr, AssetKind, Coin, EventKind, HistoricalOrders, NamesError, Result, SellOrder,
    SellOrderBid,
};

use crate::{MarketKeeper, bank::BankKeeper};

/// What a bid did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidOutcome {
    /// Accepted as the new highest bid; the auction stays open.
    Accepted,
    /// Reached the instant-buy price; the order settled immediately.
    FinishedByMatch,
}

/// How an order left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    /// A bid reached the instant-buy price; settled before expiry.
    FinishedByMatch,
    /// Expired with a bid and no `sell_price`: settled at the best bid.
    SettledAtBestBid,
    /// Expired with a bid below a set `sell_price`: bid refunded, no
    /// transfer.
    ClosedRefunded,
    /// Expired without any bid.
    ClosedWithoutBid,
}

impl<S: StateStore, B: BankKeeper> MarketKeeper<S, B> {
    /// List goods for auction.
    ///
    /// Preconditions: the goods is a registered record owned by `owner`,
    /// not expired, not already listed, and not inside the prohibit-sell
    /// window (a name about to lapse cannot be sold). The order opens for
    /// `days_sell_order_duration` from `now` and is registered in the
    /// active-expiration index.
    pub fn place_sell_order(
        &mut self,
        now: DateTime<Utc>,
        kind: AssetKind,
        goods_id: &str,
        owner: &Addr,
        min_price: Coin,
        sell_price: Option<Coin>,
    ) -> Result<SellOrder> {
        let params = self.params()?;
        let record = self.goods_record(goods_id)?;
        Self::require_owner(&record, owner)?;
        if record.is_expired(now) {
            return Err(NamesError::NameExpired(goods_id.to_string()));
        }
        if record.expire_at < now + Duration::days(i64::from(params.misc.days_prohibit_sell)) {
            return Err(NamesError::SellProhibited {
                name: goods_id.to_string(),
            });
        }
        if orders::get_active(&self.store, kind, goods_id)?.is_some() {
            return Err(NamesError::OrderAlreadyActive(goods_id.to_string()));
        }

        let order = SellOrder {
            goods_id: goods_id.to_string(),
            kind,
            expire_at: now + Duration::days(i64::from(params.misc.days_sell_order_duration)),
            min_price,
            sell_price,
            highest_bid: None,
        };
        order.validate()?;

        orders::set_active(&mut self.store, &order)?;
        let mut expiration = orders::get_expiration(&self.store, kind)?;
        expiration.add(goods_id, order.expire_at);
        orders::set_expiration(&mut self.store, kind, &expiration)?;

        tracing::info!(goods = goods_id, %kind, min = %order.min_price, "sell order placed");
        self.emit(
            EventKind::SellOrderPlaced,
            goods_id,
            kind,
            owner,
            Some(order.min_price.clone()),
            now,
        );
        Ok(order)
    }

    /// Bid on an active order.
    ///
    /// The bid must strictly improve on the current highest bid, reach
    /// the minimum price, and stay within the instant-buy price when one
    /// is set. The new bid's funds are escrowed and the displaced bid (if
    /// any) refunded. A bid reaching the instant-buy price settles the
    /// order immediately, inside the same transaction.
    pub fn place_bid(
        &mut self,
        now: DateTime<Utc>,
        kind: AssetKind,
        goods_id: &str,
        bidder: &Addr,
        price: Coin,
    ) -> Result<BidOutcome> {
        let mut order = orders::get_active(&self.store, kind, goods_id)?
            .ok_or_else(|| NamesError::OrderNotFound(goods_id.to_string()))?;
        if order.has_finished(now) {
            return Err(NamesError::OrderAlreadyFinished(goods_id.to_string()));
        }
        Addr::parse(bidder.as_str())?;
        order.min_price.validate_same_denom(&price)?;
        if price.amount < order.min_price.amount {
            return Err(NamesError::BidBelowMinimum {
                bid: price.amount,
                min: order.min_price.amount,
            });
        }
        if let Some(current) = &order.highest_bid {
            if price.amount <= current.price.amount {
                return Err(NamesError::BidNotImproved {
                    bid: price.amount,
                    current: current.price.amount,
                });
            }
        }
        if let Some(sell_price) = &order.sell_price {
            if price.amount > sell_price.amount {
                return Err(NamesError::InvalidBid {
                    reason: format!("bid {price} exceeds the sell price {sell_price}"),
                });
            }
        }
        // The seller cannot bid their own auction up.
        let record = self.goods_record(goods_id)?;
        if &record.owner == bidder {
            return Err(NamesError::InvalidBid {
                reason: "owner cannot bid on own order".to_string(),
            });
        }

        self.bank.escrow(bidder, &price)?;
        if let Some(displaced) = order.highest_bid.take() {
            self.refund_bid(now, &order, &displaced)?;
        }
        order.highest_bid = Some(SellOrderBid {
            bidder: bidder.clone(),
            price: price.clone(),
        });

        self.emit(EventKind::BidPlaced, goods_id, kind, bidder, Some(price), now);

        if order.is_instant_matched() {
            self.complete_sell_order(now, order)?;
            return Ok(BidOutcome::FinishedByMatch);
        }
        orders::set_active(&mut self.store, &order)?;
        Ok(BidOutcome::Accepted)
    }

    /// Close every active order whose `expire_at` has passed, in one
    /// pass. Invoked by the epoch scheduler; never scans the full order
    /// store — only the active-expiration index.
    ///
    /// Disposition per order: with a bid and no `sell_price`, settle at
    /// the best bid; with a bid below a set `sell_price`, refund and
    /// close without transfer; without a bid, close silently.
    ///
    /// # Errors
    /// Returns [`NamesError::DanglingIndexEntry`] — and halts the pass —
    /// if an index entry points at a missing order. That state indicates
    /// a prior invariant violation and must surface, not be skipped.
    pub fn expire_sell_orders(
        &mut self,
        now: DateTime<Utc>,
        kind: AssetKind,
    ) -> Result<Vec<(String, CloseDisposition)>> {
        let expiration = orders::get_expiration(&self.store, kind)?;
        let mut closed = Vec::new();
        for goods_id in expiration.expired_at(now) {
            let order = orders::get_active(&self.store, kind, &goods_id)?
                .ok_or(NamesError::DanglingIndexEntry {
                    goods_id: goods_id.clone(),
                })?;
            let disposition = match (&order.highest_bid, &order.sell_price) {
                (Some(_), None) => {
                    self.complete_sell_order(now, order)?;
                    CloseDisposition::SettledAtBestBid
                }
                (Some(_), Some(_)) => {
                    // A sell price was set but never met.
                    self.close_sell_order_without_transfer(now, order)?;
                    CloseDisposition::ClosedRefunded
                }
                (None, _) => {
                    self.close_sell_order_without_transfer(now, order)?;
                    CloseDisposition::ClosedWithoutBid
                }
            };
            closed.push((goods_id, disposition));
        }
        Ok(closed)
    }

    /// Settle an order at its highest bid: goods to the bidder, proceeds
    /// to the pre-transfer owner, order archived, active state purged.
    pub(crate) fn complete_sell_order(&mut self, now: DateTime<Utc>, order: SellOrder) -> Result<()> {
        let winner = order.highest_bid.clone().ok_or_else(|| {
            NamesError::Internal(format!(
                "completing order for {} without a bid",
                order.goods_id
            ))
        })?;
        let record = self.goods_record(&order.goods_id)?;
        let seller = record.owner.clone();

        self.bank.release(&seller, &winner.price)?;
        self.transfer_record(record, winner.bidder.clone())?;
        self.archive_order(&order)?;

        tracing::info!(
            goods = order.goods_id,
            kind = %order.kind,
            winner = %winner.bidder,
            price = %winner.price,
            "sell order settled"
        );
        self.emit(
            EventKind::SellOrderCompleted,
            &order.goods_id,
            order.kind,
            &winner.bidder,
            Some(winner.price),
            now,
        );
        Ok(())
    }

    /// Close an order with no ownership transfer, refunding its bid when
    /// one exists.
    pub(crate) fn close_sell_order_without_transfer(
        &mut self,
        now: DateTime<Utc>,
        mut order: SellOrder,
    ) -> Result<()> {
        let seller = self.goods_record(&order.goods_id)?.owner;
        if let Some(losing) = order.highest_bid.take() {
            self.refund_bid(now, &order, &losing)?;
        }
        self.archive_order(&order)?;
        self.emit(
            EventKind::SellOrderExpired,
            &order.goods_id,
            order.kind,
            &seller,
            None,
            now,
        );
        Ok(())
    }

    /// Refund one displaced or losing bid. Exactly one refund per
    /// transition; the bid is removed from the order before this is
    /// called, so a transition can never refund twice.
    fn refund_bid(&mut self, now: DateTime<Utc>, order: &SellOrder, bid: &SellOrderBid) -> Result<()> {
        self.bank.release(&bid.bidder, &bid.price)?;
        tracing::warn!(
            goods = order.goods_id,
            bidder = %bid.bidder,
            price = %bid.price,
            "bid refunded"
        );
        self.emit(
            EventKind::RefundIssued,
            &order.goods_id,
            order.kind,
            &bid.bidder,
            Some(bid.price.clone()),
            now,
        );
        Ok(())
    }

    /// Move a finished order into the per-goods archive and drop it from
    /// the active store and expiration index, in one unit.
    fn archive_order(&mut self, order: &SellOrder) -> Result<()> {
        let mut history = orders::get_history(&self.store, order.kind, &order.goods_id)?;
        history.push(order.clone())?;
        orders::set_history(&mut self.store, order.kind, &history)?;

        orders::remove_active(&mut self.store, order.kind, &order.goods_id);
        let mut expiration = orders::get_expiration(&self.store, order.kind)?;
        expiration.remove(&order.goods_id);
        orders::set_expiration(&mut self.store, order.kind, &expiration)?;
        Ok(())
    }

    /// Prune historical orders past the retention window, for both asset
    /// kinds. Walks the min-expiry-per-goods index, so goods whose whole
    /// history is fresh are never loaded. Returns the number of orders
    /// dropped. Idempotent: a second pass with the same `now` drops
    /// nothing.
    pub fn prune_historical_orders(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let params = self.params()?;
        let cutoff =
            now - Duration::days(i64::from(params.misc.days_preserved_closed_sell_order));
        let mut dropped = 0;
        for kind in [AssetKind::Name, AssetKind::Alias] {
            for (goods_id, min_expire_at) in orders::iter_min_expiry(&self.store, kind)? {
                if min_expire_at >= cutoff {
                    continue;
                }
                let mut history = orders::get_history(&self.store, kind, &goods_id)?;
                let before = history.orders.len();
                history.orders.retain(|order| order.expire_at >= cutoff);
                dropped += before - history.orders.len();
                orders::set_history(&mut self.store, kind, &history)?;
            }
        }
        if dropped > 0 {
            tracing::info!(dropped, "pruned historical sell orders");
        }
        Ok(dropped)
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// The active sell order for a goods id, if any.
    pub fn active_sell_order(&self, kind: AssetKind, goods_id: &str) -> Result<Option<SellOrder>> {
        orders::get_active(&self.store, kind, goods_id)
    }

    /// The historical orders for a goods id (empty collection if none).
    pub fn historical_sell_orders(
        &self,
        kind: AssetKind,
        goods_id: &str,
    ) -> Result<HistoricalOrders> {
        orders::get_history(&self.store, kind, goods_id)
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
        alice: Addr,
        bob: Addr,
        carol: Addr,
    }

    fn setup() -> Setup {
        let alice = Addr::dummy("alice");
        let bob = Addr::dummy("bob");
        let carol = Addr::dummy("carol");
        let mut bank = ModuleBank::new();
        for addr in [&alice, &bob, &carol] {
            bank.deposit(addr, &coin(1_000_000));
        }
        let mut keeper = MarketKeeper::new(MemStore::new(), bank);
        let now = Utc::now();
        keeper.register_name(now, "abc", &alice, 1).unwrap();
        keeper.drain_events();
        Setup {
            keeper,
            now,
            alice,
            bob,
            carol,
        }
    }

    #[test]
    fn place_order_registers_expiration_index() {
        let mut s = setup();
        let order = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();

        let index = orders::get_expiration(s.keeper.store(), AssetKind::Name).unwrap();
        assert_eq!(index.records.len(), 1);
        assert_eq!(index.records[0].expire_at, order.expire_at);
        assert!(
            s.keeper
                .active_sell_order(AssetKind::Name, "abc")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn duplicate_active_order_rejected() {
        let mut s = setup();
        s.keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();
        let err = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap_err();
        assert!(matches!(err, NamesError::OrderAlreadyActive(_)));
    }

    #[test]
    fn non_owner_cannot_list() {
        let mut s = setup();
        let err = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.bob, coin(100), None)
            .unwrap_err();
        assert!(matches!(err, NamesError::NotOwner { .. }));
    }

    #[test]
    fn prohibit_sell_window_blocks_listing() {
        let mut s = setup();
        // Jump to just inside the prohibit window before the name expires.
        let record = s.keeper.name_record("abc").unwrap().unwrap();
        let late = record.expire_at - Duration::days(3);
        let err = s
            .keeper
            .place_sell_order(late, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap_err();
        assert!(matches!(err, NamesError::SellProhibited { .. }));
    }

    #[test]
    fn sell_price_below_min_rejected() {
        let mut s = setup();
        let err = s
            .keeper
            .place_sell_order(
                s.now,
                AssetKind::Name,
                "abc",
                &s.alice,
                coin(100),
                Some(coin(50)),
            )
            .unwrap_err();
        assert!(matches!(err, NamesError::InvalidOrder { .. }));
    }

    #[test]
    fn bid_floors_and_strict_improvement() {
        let mut s = setup();
        s.keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();

        let err = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(99))
            .unwrap_err();
        assert!(matches!(err, NamesError::BidBelowMinimum { .. }));

        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(150))
            .unwrap();

        // Equal re-bid is not an improvement, even from another account.
        let err = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.carol, coin(150))
            .unwrap_err();
        assert!(matches!(err, NamesError::BidNotImproved { .. }));
    }

    #[test]
    fn owner_cannot_bid_own_order() {
        let mut s = setup();
        s.keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();
        let err = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.alice, coin(150))
            .unwrap_err();
        assert!(matches!(err, NamesError::InvalidBid { .. }));
    }

    #[test]
    fn displaced_bidder_is_refunded() {
        let mut s = setup();
        s.keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();

        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(150))
            .unwrap();
        assert_eq!(
            s.keeper.bank().balance_of(&s.bob, "uopen"),
            Decimal::new(1_000_000 - 150, 0)
        );

        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.carol, coin(200))
            .unwrap();
        // Bob got his 150 back; only Carol's 200 is escrowed.
        assert_eq!(
            s.keeper.bank().balance_of(&s.bob, "uopen"),
            Decimal::new(1_000_000, 0)
        );
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::new(200, 0));
        s.keeper.bank().verify_conservation("uopen").unwrap();
    }

    #[test]
    fn bid_reaching_sell_price_finishes_immediately() {
        let mut s = setup();
        s.keeper
            .place_sell_order(
                s.now,
                AssetKind::Name,
                "abc",
                &s.alice,
                coin(100),
                Some(coin(300)),
            )
            .unwrap();

        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(200))
            .unwrap();
        let outcome = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.carol, coin(300))
            .unwrap();
        assert_eq!(outcome, BidOutcome::FinishedByMatch);

        // Ownership moved, proceeds paid, bob refunded, history written,
        // active state gone.
        let record = s.keeper.name_record("abc").unwrap().unwrap();
        assert_eq!(record.owner, s.carol);
        assert_eq!(
            s.keeper.bank().balance_of(&s.alice, "uopen"),
            Decimal::new(1_000_000 - 10_000 + 300, 0) // registration fee, then proceeds
        );
        assert_eq!(
            s.keeper.bank().balance_of(&s.bob, "uopen"),
            Decimal::new(1_000_000, 0)
        );
        assert!(
            s.keeper
                .active_sell_order(AssetKind::Name, "abc")
                .unwrap()
                .is_none()
        );
        let history = s
            .keeper
            .historical_sell_orders(AssetKind::Name, "abc")
            .unwrap();
        assert_eq!(history.orders.len(), 1);
        assert!(
            orders::get_expiration(s.keeper.store(), AssetKind::Name)
                .unwrap()
                .records
                .is_empty()
        );

        // Goods freed up: a new order can be placed by the new owner.
        s.keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.carol, coin(100), None)
            .unwrap();
    }

    #[test]
    fn bid_above_sell_price_rejected() {
        let mut s = setup();
        s.keeper
            .place_sell_order(
                s.now,
                AssetKind::Name,
                "abc",
                &s.alice,
                coin(100),
                Some(coin(300)),
            )
            .unwrap();
        let err = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(301))
            .unwrap_err();
        assert!(matches!(err, NamesError::InvalidBid { .. }));
    }

    #[test]
    fn expiry_settles_at_best_bid_when_no_sell_price() {
        let mut s = setup();
        let order = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();
        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(150))
            .unwrap();

        let later = order.expire_at + Duration::seconds(1);
        let closed = s.keeper.expire_sell_orders(later, AssetKind::Name).unwrap();
        assert_eq!(
            closed,
            vec![("abc".to_string(), CloseDisposition::SettledAtBestBid)]
        );

        let record = s.keeper.name_record("abc").unwrap().unwrap();
        assert_eq!(record.owner, s.bob);
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::ZERO);
    }

    #[test]
    fn expiry_refunds_when_sell_price_never_met() {
        let mut s = setup();
        let order = s
            .keeper
            .place_sell_order(
                s.now,
                AssetKind::Name,
                "abc",
                &s.alice,
                coin(100),
                Some(coin(300)),
            )
            .unwrap();
        s.keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(200))
            .unwrap();

        let later = order.expire_at + Duration::seconds(1);
        let closed = s.keeper.expire_sell_orders(later, AssetKind::Name).unwrap();
        assert_eq!(
            closed,
            vec![("abc".to_string(), CloseDisposition::ClosedRefunded)]
        );

        // No transfer, full refund, archived without the bid.
        let record = s.keeper.name_record("abc").unwrap().unwrap();
        assert_eq!(record.owner, s.alice);
        assert_eq!(
            s.keeper.bank().balance_of(&s.bob, "uopen"),
            Decimal::new(1_000_000, 0)
        );
        let history = s
            .keeper
            .historical_sell_orders(AssetKind::Name, "abc")
            .unwrap();
        assert!(history.orders[0].highest_bid.is_none());
    }

    #[test]
    fn expiry_without_bid_closes_silently() {
        let mut s = setup();
        let order = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();

        let later = order.expire_at + Duration::seconds(1);
        let closed = s.keeper.expire_sell_orders(later, AssetKind::Name).unwrap();
        assert_eq!(
            closed,
            vec![("abc".to_string(), CloseDisposition::ClosedWithoutBid)]
        );
        assert_eq!(s.keeper.bank().escrowed("uopen"), Decimal::ZERO);
    }

    #[test]
    fn dangling_index_entry_is_fatal() {
        let mut s = setup();
        let order = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();
        // Corrupt the store: drop the order but leave the index entry.
        orders::remove_active(&mut s.keeper.store, AssetKind::Name, "abc");

        let later = order.expire_at + Duration::seconds(1);
        let err = s
            .keeper
            .expire_sell_orders(later, AssetKind::Name)
            .unwrap_err();
        assert!(matches!(err, NamesError::DanglingIndexEntry { .. }));
    }

    #[test]
    fn bid_on_missing_or_finished_order_rejected() {
        let mut s = setup();
        let err = s
            .keeper
            .place_bid(s.now, AssetKind::Name, "abc", &s.bob, coin(150))
            .unwrap_err();
        assert!(matches!(err, NamesError::OrderNotFound(_)));

        let order = s
            .keeper
            .place_sell_order(s.now, AssetKind::Name, "abc", &s.alice, coin(100), None)
            .unwrap();
        let later = order.expire_at + Duration::seconds(1);
        let err = s
            .keeper
            .place_bid(later, AssetKind::Name, "abc", &s.bob, coin(150))
            .unwrap_err();
        assert!(matches!(err, NamesError::OrderAlreadyFinished(_)));
    }
}
